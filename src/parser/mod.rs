//! Extraction of lecture meetings from a class schedule pasted as plain text.
//!
//! The expected layout, one field per line:
//!
//! ```text
//! Fall 2025 | Undergraduate | University of Waterloo
//! CS 246 - Object-Oriented Software Development
//! 6923
//! 003
//! LEC
//! TTh 1:00PM - 2:20PM
//! ```
//!
//! Only `LEC` components are read. Anything that does not fit the layout is
//! skipped, so bad input yields fewer courses rather than an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::models::{ParsedCourse, Weekday};
use crate::terms::term_code;

static TERM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(Winter|Spring|Fall)\s+\d{4}").expect("valid term regex"));
static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z]{2,5}\s+\d{3}[A-Z]?)\s+-\s+(.+)$").expect("valid header regex")
});
static SECTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{3}$").expect("valid section regex"));
static MEETING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([MTWThF]+)\s+(\d{1,2}:\d{2}[AP]M)\s+-\s+(\d{1,2}:\d{2}[AP]M)")
        .expect("valid meeting regex")
});

const LECTURE_TAG: &str = "LEC";

pub const NO_COURSES_MESSAGE: &str =
    "Could not parse any courses. Make sure you copied your schedule from Quest.";
pub const NO_TERM_MESSAGE: &str =
    "Could not find a term (e.g. \"Fall 2025\") in the pasted schedule.";

/// Parsed courses plus an advisory for the caller when nothing was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleImport {
    pub courses: Vec<ParsedCourse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn import_schedule(text: &str) -> ScheduleImport {
    let courses = parse_schedule(text);
    let message = if !courses.is_empty() {
        None
    } else if find_term(&lines(text)).is_none() {
        Some(NO_TERM_MESSAGE.to_string())
    } else {
        Some(NO_COURSES_MESSAGE.to_string())
    };
    ScheduleImport { courses, message }
}

/// Extracts one lecture meeting per course header.
///
/// A course is only emitted once a term, at least one meeting day and a
/// start time are known. When several `LEC` sections follow one header only
/// the first complete one is kept.
pub fn parse_schedule(text: &str) -> Vec<ParsedCourse> {
    let lines = lines(text);
    let term = find_term(&lines);

    let mut courses = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let Some(header) = HEADER_RE.captures(lines[i]) else {
            i += 1;
            continue;
        };
        let course_code = header[1].trim().to_string();
        let course_name = header[2].trim().to_string();

        let mut next = lines.len();
        let mut lecture = None;
        for j in (i + 1)..lines.len() {
            if HEADER_RE.is_match(lines[j]) {
                next = j;
                break;
            }
            if lecture.is_some() || lines[j] != LECTURE_TAG {
                continue;
            }
            lecture = lecture_at(&lines, j);
            if lecture.is_none() {
                debug!("incomplete {} section for {} at line {}", LECTURE_TAG, course_code, j + 1);
            }
        }

        if let (Some(term), Some((section, meeting))) = (&term, lecture) {
            if !meeting.days.is_empty() {
                courses.push(ParsedCourse {
                    course_code,
                    course_name,
                    term: term.clone(),
                    section,
                    days_of_week: meeting.days,
                    start_time: meeting.start_time,
                    end_time: meeting.end_time,
                });
            }
        }

        i = next;
    }

    courses
}

struct Meeting {
    days: Vec<Weekday>,
    start_time: String,
    end_time: String,
}

fn lines(text: &str) -> Vec<&str> {
    text.split('\n').map(str::trim).collect()
}

fn find_term(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .find_map(|line| TERM_RE.find(line))
        .and_then(|m| term_code(m.as_str()))
}

/// Section number sits on the line above the tag, the meeting on the line below.
fn lecture_at(lines: &[&str], tag: usize) -> Option<(String, Meeting)> {
    let section = tag
        .checked_sub(1)
        .map(|k| lines[k])
        .filter(|line| SECTION_RE.is_match(line))?;
    let caps = MEETING_RE.captures(lines.get(tag + 1)?)?;
    let meeting = Meeting {
        days: decode_days(&caps[1]),
        start_time: to_24h(&caps[2])?,
        end_time: to_24h(&caps[3])?,
    };
    Some((section.to_string(), meeting))
}

/// Decodes a run of day letters such as `MWF` or `TTh`. `Th` is read before
/// the single letters; unknown characters are dropped.
pub fn decode_days(letters: &str) -> Vec<Weekday> {
    let mut days = Vec::new();
    let mut rest = letters;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("Th") {
            days.push(Weekday::Thursday);
            rest = after;
            continue;
        }
        let mut chars = rest.chars();
        match chars.next() {
            Some('M') => days.push(Weekday::Monday),
            Some('T') => days.push(Weekday::Tuesday),
            Some('W') => days.push(Weekday::Wednesday),
            Some('F') => days.push(Weekday::Friday),
            _ => {}
        }
        rest = chars.as_str();
    }
    days
}

/// `1:00PM` -> `13:00:00`. 12 AM is hour 0 and 12 PM stays 12.
pub fn to_24h(time: &str) -> Option<String> {
    let split = time.len().checked_sub(2)?;
    let (clock, period) = (time.get(..split)?, time.get(split..)?);
    let (hours, minutes) = clock.split_once(':')?;
    let mut hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;

    match period {
        "PM" if hours != 12 => hours += 12,
        "AM" if hours == 12 => hours = 0,
        "AM" | "PM" => {}
        _ => return None,
    }
    Some(format!("{:02}:{:02}:00", hours, minutes))
}
