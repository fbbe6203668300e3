use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use skipcost::error::AppError;
use skipcost::terms::{HttpTermCalendar, StaticTermCalendar, TermCalendar, TermDates, TermResolver};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn calendar() -> Vec<TermDates> {
    vec![
        TermDates::new("Fall 2025", date(2025, 9, 3), date(2025, 12, 2)),
        TermDates::new("Winter 2026", date(2026, 1, 5), date(2026, 4, 6)),
    ]
}

struct FailingCalendar;

#[async_trait]
impl TermCalendar for FailingCalendar {
    async fn fetch_terms(&self) -> Result<Vec<TermDates>, AppError> {
        Err(AppError::ServiceUnavailable("calendar down".to_string()))
    }
}

struct SlowCalendar;

#[async_trait]
impl TermCalendar for SlowCalendar {
    async fn fetch_terms(&self) -> Result<Vec<TermDates>, AppError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(calendar())
    }
}

/// Succeeds on the first call only.
struct FlakyCalendar {
    calls: AtomicUsize,
}

#[async_trait]
impl TermCalendar for FlakyCalendar {
    async fn fetch_terms(&self) -> Result<Vec<TermDates>, AppError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(calendar())
        } else {
            Err(AppError::ServiceUnavailable("calendar down".to_string()))
        }
    }
}

#[tokio::test]
async fn latest_started_term_wins_even_after_it_ends() {
    let resolver = TermResolver::new(
        Arc::new(StaticTermCalendar::new(calendar())),
        Duration::from_secs(1),
    );
    assert_eq!(resolver.current_term(date(2025, 12, 15)).await, "Fall 2025");
    assert_eq!(resolver.current_term(date(2026, 1, 10)).await, "Winter 2026");
    assert_eq!(resolver.current_term(date(2026, 9, 1)).await, "Winter 2026");
}

#[tokio::test]
async fn before_any_term_falls_back_to_month() {
    let resolver = TermResolver::new(
        Arc::new(StaticTermCalendar::new(calendar())),
        Duration::from_secs(1),
    );
    assert_eq!(resolver.current_term(date(2025, 6, 1)).await, "Spring 2025");
}

#[tokio::test]
async fn calendar_failure_uses_month_fallback() {
    let resolver = TermResolver::new(Arc::new(FailingCalendar), Duration::from_secs(1));
    assert_eq!(resolver.current_term(date(2025, 12, 15)).await, "Fall 2025");
    assert_eq!(resolver.current_term(date(2026, 3, 2)).await, "Winter 2026");
    assert!(resolver.refresh().await.is_err());
}

#[tokio::test]
async fn slow_calendar_is_cut_off() {
    let resolver = TermResolver::new(Arc::new(SlowCalendar), Duration::from_millis(50));
    let started = std::time::Instant::now();
    let term = resolver.current_term(date(2026, 5, 20)).await;
    assert_eq!(term, "Spring 2026");
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn cached_table_survives_failed_refresh() {
    let resolver = TermResolver::new(
        Arc::new(FlakyCalendar { calls: AtomicUsize::new(0) }),
        Duration::from_secs(1),
    );
    assert_eq!(resolver.refresh().await.expect("first load").len(), 2);
    assert!(resolver.refresh().await.is_err());

    // Month fallback would say "Winter 2026"; the cached calendar says Fall.
    assert_eq!(resolver.current_term(date(2026, 1, 2)).await, "Fall 2025");
}

#[tokio::test]
async fn unreachable_http_calendar_falls_back() {
    let http = HttpTermCalendar::new(
        "http://127.0.0.1:9/terms".to_string(),
        None,
        Duration::from_millis(200),
    )
    .expect("client");
    let resolver = TermResolver::new(Arc::new(http), Duration::from_millis(500));
    assert_eq!(resolver.current_term(date(2025, 10, 1)).await, "Fall 2025");
}
