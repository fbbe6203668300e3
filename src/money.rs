//! Two-decimal rendering of monetary amounts.
//!
//! Amounts are carried as `f64` at full precision and only rounded here,
//! when they leave the service.

use serde::Serializer;

/// Formats `value` with exactly two decimals.
///
/// `{:.2}` rounds exact binary ties (e.g. `0.125`) to even; amounts here round
/// such ties away from zero instead. A tie at the third decimal is only
/// possible when `value` is a multiple of 1/8, in which case `value * 100.0`
/// is exact and `f64::round` gives the away-from-zero result.
pub fn to_fixed_2(value: f64) -> String {
    if !value.is_finite() {
        return "0.00".to_string();
    }
    if (value * 8.0).fract() == 0.0 {
        return format!("{:.2}", (value * 100.0).round() / 100.0);
    }
    format!("{:.2}", value)
}

pub fn serialize_fixed_2<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&to_fixed_2(*value))
}

#[cfg(test)]
mod tests {
    use super::to_fixed_2;

    #[test]
    fn renders_two_decimals() {
        assert_eq!(to_fixed_2(2300.0), "2300.00");
        assert_eq!(to_fixed_2(2300.0 / 60.0), "38.33");
        assert_eq!(to_fixed_2(500.0 / 12.0), "41.67");
        assert_eq!(to_fixed_2(0.0), "0.00");
    }

    #[test]
    fn exact_ties_round_away_from_zero() {
        assert_eq!(to_fixed_2(0.125), "0.13");
        assert_eq!(to_fixed_2(2.675), "2.67"); // not a tie in binary
        assert_eq!(to_fixed_2(10.375), "10.38");
        assert_eq!(to_fixed_2(-0.125), "-0.13");
    }

    #[test]
    fn non_finite_renders_as_zero() {
        assert_eq!(to_fixed_2(f64::NAN), "0.00");
        assert_eq!(to_fixed_2(f64::INFINITY), "0.00");
    }
}
