pub mod dto;

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::AppError;

static TERM_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(Winter|Spring|Fall)\s+(\d{4})").expect("valid term regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermDates {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TermDates {
    pub fn new(name: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self { name: name.to_string(), start, end }
    }
}

/// Converts a term declaration such as `Fall 2025` into its numeric code
/// (`1` + two-digit year + season digit), e.g. `1259`.
pub fn term_code(text: &str) -> Option<String> {
    let caps = TERM_NAME_RE.captures(text)?;
    let season = match &caps[1] {
        "Winter" => '1',
        "Spring" => '5',
        _ => '9',
    };
    let year = &caps[2];
    Some(format!("1{}{}", &year[2..], season))
}

/// Month-only guess used when no calendar is available. Ignores real start
/// and end dates, so it can disagree with the calendar near term boundaries.
pub fn fallback_term(today: NaiveDate) -> String {
    let season = match today.month0() {
        0..=3 => "Winter",
        4..=7 => "Spring",
        _ => "Fall",
    };
    format!("{} {}", season, today.year())
}

/// Name of the most recently started term, even if it has already ended.
pub fn latest_started(terms: &[TermDates], today: NaiveDate) -> Option<&TermDates> {
    terms
        .iter()
        .filter(|t| t.start <= today)
        .max_by_key(|t| t.start)
}

#[async_trait]
pub trait TermCalendar: Send + Sync {
    async fn fetch_terms(&self) -> Result<Vec<TermDates>, AppError>;
}

/// Fixed term table, configured at startup.
pub struct StaticTermCalendar {
    terms: Vec<TermDates>,
}

impl StaticTermCalendar {
    pub fn new(terms: Vec<TermDates>) -> Self {
        Self { terms }
    }
}

impl Default for StaticTermCalendar {
    fn default() -> Self {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
        Self::new(vec![
            TermDates::new("Fall 2025", date(2025, 9, 3), date(2025, 12, 2)),
            TermDates::new("Winter 2026", date(2026, 1, 5), date(2026, 4, 6)),
            TermDates::new("Spring 2026", date(2026, 5, 11), date(2026, 8, 5)),
        ])
    }
}

#[async_trait]
impl TermCalendar for StaticTermCalendar {
    async fn fetch_terms(&self) -> Result<Vec<TermDates>, AppError> {
        Ok(self.terms.clone())
    }
}

pub struct HttpTermCalendar {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpTermCalendar {
    pub fn new(url: String, api_key: Option<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                tracing::error!("failed to build term calendar http client: {}", e);
                AppError::InternalServerError
            })?;
        Ok(Self { client, url, api_key })
    }

    fn to_term_dates(record: dto::TermRecord) -> Result<TermDates, AppError> {
        let start = parse_calendar_date(&record.term_begin_date)?;
        let end = parse_calendar_date(&record.term_end_date)?;
        Ok(TermDates { name: record.name, start, end })
    }
}

fn parse_calendar_date(value: &str) -> Result<NaiveDate, AppError> {
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| AppError::ServiceUnavailable(format!("bad calendar date {}: {}", value, e)))
}

#[async_trait]
impl TermCalendar for HttpTermCalendar {
    async fn fetch_terms(&self) -> Result<Vec<TermDates>, AppError> {
        let mut request = self.client.get(&self.url);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("term calendar unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ServiceUnavailable(format!(
                "term calendar error {}: {}",
                status, body
            )));
        }

        let records: Vec<dto::TermRecord> = response.json().await.map_err(|e| {
            AppError::ServiceUnavailable(format!("failed to parse term calendar: {}", e))
        })?;

        records.into_iter().map(Self::to_term_dates).collect()
    }
}

/// Maps a date to the academic term used for rate lookup.
///
/// The last successfully fetched table is cached; when the cache is empty the
/// calendar is consulted under `timeout`. Any failure falls back to
/// [`fallback_term`] and is only logged.
pub struct TermResolver {
    calendar: Arc<dyn TermCalendar>,
    timeout: Duration,
    cache: RwLock<Option<Arc<Vec<TermDates>>>>,
}

impl TermResolver {
    pub fn new(calendar: Arc<dyn TermCalendar>, timeout: Duration) -> Self {
        Self {
            calendar,
            timeout,
            cache: RwLock::new(None),
        }
    }

    pub async fn current_term(&self, today: NaiveDate) -> String {
        let terms = match self.cached() {
            Some(terms) => Some(terms),
            None => self.refresh().await.ok(),
        };

        if let Some(term) = terms.as_deref().and_then(|t| latest_started(t, today)) {
            debug!("resolved {} to term {}", today, term.name);
            return term.name.clone();
        }

        let guess = fallback_term(today);
        warn!("no calendar term has started by {}; using month-based guess {}", today, guess);
        guess
    }

    /// Re-fetches the calendar and replaces the cached table on success.
    pub async fn refresh(&self) -> Result<Arc<Vec<TermDates>>, AppError> {
        let fetched = match tokio::time::timeout(self.timeout, self.calendar.fetch_terms()).await {
            Ok(Ok(terms)) => terms,
            Ok(Err(e)) => {
                warn!("term calendar lookup failed: {}", e);
                return Err(e);
            }
            Err(_) => {
                warn!("term calendar lookup timed out after {:?}", self.timeout);
                return Err(AppError::ServiceUnavailable("term calendar timed out".to_string()));
            }
        };

        let terms = Arc::new(fetched);
        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(terms.clone());
        }
        info!("term calendar loaded ({} terms)", terms.len());
        Ok(terms)
    }

    fn cached(&self) -> Option<Arc<Vec<TermDates>>> {
        self.cache.read().ok().and_then(|cache| cache.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn term_code_encodes_year_and_season() {
        assert_eq!(term_code("Fall 2025").as_deref(), Some("1259"));
        assert_eq!(term_code("Winter 2026 | Undergraduate").as_deref(), Some("1261"));
        assert_eq!(term_code("Spring 2024").as_deref(), Some("1245"));
        assert_eq!(term_code("Summer 2025"), None);
    }

    #[test]
    fn calendar_record_keeps_only_the_date_part() {
        let record: dto::TermRecord = serde_json::from_str(
            r#"{"termCode":"1259","name":"Fall 2025","termBeginDate":"2025-09-03T00:00:00","termEndDate":"2025-12-02T00:00:00"}"#,
        )
        .unwrap();
        let term = HttpTermCalendar::to_term_dates(record).unwrap();
        assert_eq!(term, TermDates::new("Fall 2025", date(2025, 9, 3), date(2025, 12, 2)));
    }

    #[test]
    fn fallback_uses_month_only() {
        assert_eq!(fallback_term(date(2026, 1, 2)), "Winter 2026");
        assert_eq!(fallback_term(date(2026, 4, 30)), "Winter 2026");
        assert_eq!(fallback_term(date(2026, 5, 1)), "Spring 2026");
        assert_eq!(fallback_term(date(2025, 8, 31)), "Spring 2025");
        assert_eq!(fallback_term(date(2025, 9, 1)), "Fall 2025");
        assert_eq!(fallback_term(date(2025, 12, 31)), "Fall 2025");
    }

    #[test]
    fn latest_started_ignores_end_dates() {
        let terms = vec![
            TermDates::new("Fall 2025", date(2025, 9, 3), date(2025, 12, 2)),
            TermDates::new("Winter 2026", date(2026, 1, 5), date(2026, 4, 6)),
        ];
        assert_eq!(latest_started(&terms, date(2025, 12, 15)).unwrap().name, "Fall 2025");
        assert_eq!(latest_started(&terms, date(2026, 1, 10)).unwrap().name, "Winter 2026");
        assert!(latest_started(&terms, date(2025, 9, 2)).is_none());
    }
}
