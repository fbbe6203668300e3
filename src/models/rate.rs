use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Pricing tier for one (program, student type, term, term number) combination.
/// A `term_number` of `None` matches any term number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TuitionRate {
    pub program: String,
    pub student_type: String,
    pub term: String,
    pub term_number: Option<String>,
    pub course_1_4_cost: f64,
    pub course_5_plus_cost: f64,
}

impl TuitionRate {
    /// Tier cost for a course at the given 1-based enrollment position.
    pub fn cost_for_position(&self, position: usize) -> f64 {
        if position <= 4 {
            self.course_1_4_cost
        } else {
            self.course_5_plus_cost
        }
    }
}
