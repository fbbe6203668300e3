use chrono::NaiveDate;
use serde::Serialize;

use crate::models::Weekday;
use crate::money::serialize_fixed_2;

/// Cost of skipping a given date, under both allocation models.
///
/// Amounts stay at full `f64` precision; they are rendered with two decimals
/// only when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub date: NaiveDate,
    pub day_of_week: Weekday,
    pub term: String,
    #[serde(serialize_with = "serialize_fixed_2")]
    pub total_tuition: f64,
    pub total_sessions: u32,
    pub fair_share: FairShare,
    pub individual_value: IndividualValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FairShare {
    #[serde(serialize_with = "serialize_fixed_2")]
    pub cost_per_session: f64,
    pub missed_classes: Vec<FairShareEntry>,
    #[serde(serialize_with = "serialize_fixed_2")]
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FairShareEntry {
    pub course_id: String,
    pub course_name: String,
    pub course_code: String,
    pub time: String,
    #[serde(serialize_with = "serialize_fixed_2")]
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualValue {
    pub missed_classes: Vec<IndividualEntry>,
    #[serde(serialize_with = "serialize_fixed_2")]
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndividualEntry {
    pub course_id: String,
    pub course_name: String,
    pub course_code: String,
    /// Enrollment position that selected the pricing tier.
    pub course_number: usize,
    pub time: String,
    #[serde(rename = "courseCost", serialize_with = "serialize_fixed_2")]
    pub course_cost: f64,
    #[serde(rename = "costPerSession", serialize_with = "serialize_fixed_2")]
    pub cost_per_session: f64,
}
