use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub course_code: String,
    pub course_name: String,
    pub term: Option<String>,
    pub section: Option<String>,
    pub days_of_week: Vec<Weekday>,
    pub start_time: String,
    pub end_time: String,
}

impl Course {
    pub fn meets_on(&self, day: Weekday) -> bool {
        self.days_of_week.contains(&day)
    }

    /// Display range used in breakdown entries, e.g. `10:00:00 - 11:20:00`.
    pub fn time_range(&self) -> String {
        format!("{} - {}", self.start_time, self.end_time)
    }
}

/// A course as seen through one user's enrollment list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrolledCourse {
    /// 1-based rank in enrollment order.
    pub position: usize,
    pub enrolled_at: String,
    #[serde(flatten)]
    pub course: Course,
}

/// Joined `courses` + `enrollments` row.
#[derive(Debug, Clone, FromRow)]
pub struct CourseRow {
    pub id: String,
    pub course_code: String,
    pub course_name: String,
    pub term: String,
    pub section: String,
    pub days_of_week: String,
    pub start_time: String,
    pub end_time: String,
    pub enrolled_at: String,
}

impl CourseRow {
    pub fn into_enrolled(self, position: usize) -> Result<EnrolledCourse, AppError> {
        let days_of_week: Vec<Weekday> = serde_json::from_str(&self.days_of_week).map_err(|e| {
            tracing::error!("corrupt days_of_week for course {}: {}", self.id, e);
            AppError::InternalServerError
        })?;

        Ok(EnrolledCourse {
            position,
            enrolled_at: self.enrolled_at,
            course: Course {
                id: self.id,
                course_code: self.course_code,
                course_name: self.course_name,
                term: non_empty(self.term),
                section: non_empty(self.section),
                days_of_week,
                start_time: self.start_time,
                end_time: self.end_time,
            },
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Course record extracted from pasted schedule text, pending user confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCourse {
    pub course_code: String,
    pub course_name: String,
    pub term: String,
    pub section: String,
    pub days_of_week: Vec<Weekday>,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourseRequest {
    pub user_id: String,
    pub course_code: String,
    pub course_name: String,
    pub term: Option<String>,
    pub section: Option<String>,
    pub days_of_week: Vec<Weekday>,
    pub start_time: String,
    pub end_time: String,
}

impl NewCourseRequest {
    /// Checks the payload and rewrites both times as `HH:MM:SS`.
    pub fn normalize(mut self) -> Result<Self, AppError> {
        if self.course_code.trim().is_empty() {
            return Err(AppError::Validation("course_code is required".to_string()));
        }
        if self.days_of_week.is_empty() {
            return Err(AppError::Validation(
                "days_of_week must contain at least one day".to_string(),
            ));
        }
        let mut seen = Vec::with_capacity(self.days_of_week.len());
        self.days_of_week.retain(|day| {
            let first = !seen.contains(day);
            seen.push(*day);
            first
        });

        let start = parse_wall_clock(&self.start_time)?;
        let end = parse_wall_clock(&self.end_time)?;
        if start >= end {
            return Err(AppError::Validation(format!(
                "start_time {} must be before end_time {}",
                self.start_time, self.end_time
            )));
        }

        self.course_code = self.course_code.trim().to_string();
        self.start_time = start.format("%H:%M:%S").to_string();
        self.end_time = end.format("%H:%M:%S").to_string();
        Ok(self)
    }
}

fn parse_wall_clock(value: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| AppError::Validation(format!("Invalid time: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(start: &str, end: &str) -> NewCourseRequest {
        NewCourseRequest {
            user_id: "u1".to_string(),
            course_code: " STAT 231 ".to_string(),
            course_name: "Statistics".to_string(),
            term: None,
            section: None,
            days_of_week: vec![Weekday::Monday, Weekday::Wednesday],
            start_time: start.to_string(),
            end_time: end.to_string(),
        }
    }

    #[test]
    fn normalize_pads_short_times() {
        let req = request("8:30", "09:50:00").normalize().unwrap();
        assert_eq!(req.start_time, "08:30:00");
        assert_eq!(req.end_time, "09:50:00");
        assert_eq!(req.course_code, "STAT 231");
    }

    #[test]
    fn normalize_rejects_inverted_range() {
        assert!(matches!(
            request("11:00", "10:00").normalize(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn weekday_serializes_as_full_name() {
        let json = serde_json::to_string(&vec![Weekday::Thursday]).unwrap();
        assert_eq!(json, r#"["Thursday"]"#);
        assert_eq!(Weekday::from(chrono::Weekday::Sun), Weekday::Sunday);
    }
}
