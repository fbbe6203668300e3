use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use tracing::{debug, info};

use crate::db::TuitionStore;
use crate::error::AppError;
use crate::models::{
    Course, CostBreakdown, FairShare, FairShareEntry, IndividualEntry, IndividualValue, TuitionRate,
    Weekday,
};
use crate::terms::TermResolver;

/// Teaching weeks assumed for every term when estimating session counts.
pub const WEEKS_PER_TERM: u32 = 12;

fn sessions_per_term(course: &Course) -> u32 {
    course.days_of_week.len() as u32 * WEEKS_PER_TERM
}

/// Prices one date against a user's enrolled courses.
///
/// `courses` must be in enrollment order: the index in this slice is the
/// position that picks each course's tier, for the term total and for the
/// individual-value entries alike.
pub fn allocate(date: NaiveDate, term: &str, rate: &TuitionRate, courses: &[Course]) -> CostBreakdown {
    let day_of_week = Weekday::from(date.weekday());

    let total_tuition: f64 = (1..=courses.len())
        .map(|position| rate.cost_for_position(position))
        .sum();
    let total_sessions: u32 = courses.iter().map(sessions_per_term).sum();

    let fair_cost_per_session = if total_sessions > 0 {
        total_tuition / f64::from(total_sessions)
    } else {
        0.0
    };

    let todays: Vec<(usize, &Course)> = courses
        .iter()
        .enumerate()
        .filter(|(_, course)| course.meets_on(day_of_week))
        .map(|(index, course)| (index + 1, course))
        .collect();

    let fair_entries: Vec<FairShareEntry> = todays
        .iter()
        .map(|(_, course)| FairShareEntry {
            course_id: course.id.clone(),
            course_name: course.course_name.clone(),
            course_code: course.course_code.clone(),
            time: course.time_range(),
            cost: fair_cost_per_session,
        })
        .collect();

    let individual_entries: Vec<IndividualEntry> = todays
        .iter()
        .map(|(position, course)| {
            let course_cost = rate.cost_for_position(*position);
            let sessions = sessions_per_term(course);
            let cost_per_session = if sessions > 0 {
                course_cost / f64::from(sessions)
            } else {
                0.0
            };
            IndividualEntry {
                course_id: course.id.clone(),
                course_name: course.course_name.clone(),
                course_code: course.course_code.clone(),
                course_number: *position,
                time: course.time_range(),
                course_cost,
                cost_per_session,
            }
        })
        .collect();
    let individual_total: f64 = individual_entries.iter().map(|e| e.cost_per_session).sum();

    CostBreakdown {
        date,
        day_of_week,
        term: term.to_string(),
        total_tuition,
        total_sessions,
        fair_share: FairShare {
            cost_per_session: fair_cost_per_session,
            total_cost: fair_cost_per_session * fair_entries.len() as f64,
            missed_classes: fair_entries,
        },
        individual_value: IndividualValue {
            missed_classes: individual_entries,
            total_cost: individual_total,
        },
    }
}

/// Loads a user's profile, rate row and enrollments and prices a date.
pub struct CostEngine {
    store: Arc<dyn TuitionStore>,
    terms: Arc<TermResolver>,
}

impl CostEngine {
    pub fn new(store: Arc<dyn TuitionStore>, terms: Arc<TermResolver>) -> Self {
        Self { store, terms }
    }

    pub async fn compute_breakdown(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<CostBreakdown, AppError> {
        self.compute_breakdown_as_of(user_id, date, Local::now().date_naive())
            .await
    }

    /// Like [`compute_breakdown`](Self::compute_breakdown), with the rate term
    /// resolved for `today` rather than the wall clock. The queried `date`
    /// only selects which courses meet; it never changes the term.
    pub async fn compute_breakdown_as_of(
        &self,
        user_id: &str,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<CostBreakdown, AppError> {
        let user = self
            .store
            .fetch_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let term = self.terms.current_term(today).await;

        let rate = self
            .store
            .find_rate(
                user.program.as_str(),
                user.student_type.as_str(),
                &term,
                user.term_number.as_deref(),
            )
            .await?
            .ok_or_else(|| AppError::RateNotFound {
                program: user.program.to_string(),
                student_type: user.student_type.to_string(),
                term: term.clone(),
            })?;

        let courses: Vec<Course> = self
            .store
            .list_enrolled_courses(user_id)
            .await?
            .into_iter()
            .map(|enrolled| enrolled.course)
            .collect();
        debug!("user {} has {} enrolled courses", user_id, courses.len());

        let breakdown = allocate(date, &term, &rate, &courses);
        info!(
            "breakdown for user {} on {} ({}): {} of {} courses meet, tuition {:.2}",
            user_id,
            date,
            breakdown.day_of_week,
            breakdown.fair_share.missed_classes.len(),
            courses.len(),
            breakdown.total_tuition
        );
        Ok(breakdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate() -> TuitionRate {
        TuitionRate {
            program: "Mathematics Co-op".to_string(),
            student_type: "domestic".to_string(),
            term: "Fall 2025".to_string(),
            term_number: None,
            course_1_4_cost: 500.0,
            course_5_plus_cost: 300.0,
        }
    }

    fn course(code: &str, days: &[Weekday]) -> Course {
        Course {
            id: code.to_string(),
            course_code: code.to_string(),
            course_name: format!("{} name", code),
            term: None,
            section: None,
            days_of_week: days.to_vec(),
            start_time: "10:00:00".to_string(),
            end_time: "11:20:00".to_string(),
        }
    }

    #[test]
    fn no_courses_gives_zero_without_nan() {
        let monday = NaiveDate::from_ymd_opt(2025, 10, 13).unwrap();
        let b = allocate(monday, "Fall 2025", &rate(), &[]);
        assert_eq!(b.total_sessions, 0);
        assert_eq!(b.fair_share.cost_per_session, 0.0);
        assert_eq!(b.fair_share.total_cost, 0.0);
        assert_eq!(b.individual_value.total_cost, 0.0);
    }

    #[test]
    fn course_without_days_counts_toward_tuition_only() {
        let monday = NaiveDate::from_ymd_opt(2025, 10, 13).unwrap();
        let b = allocate(monday, "Fall 2025", &rate(), &[course("CS 100", &[])]);
        assert_eq!(b.total_tuition, 500.0);
        assert_eq!(b.total_sessions, 0);
        assert_eq!(b.fair_share.cost_per_session, 0.0);
        assert!(b.fair_share.missed_classes.is_empty());
    }

    #[test]
    fn time_range_joins_start_and_end() {
        assert_eq!(course("CS 100", &[]).time_range(), "10:00:00 - 11:20:00");
    }
}
