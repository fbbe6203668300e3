use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub db_query_timeout: Duration,
    pub term_calendar_url: Option<String>,
    pub term_calendar_api_key: Option<String>,
    pub term_api_timeout: Duration,
    /// Seconds between calendar refreshes; 0 disables the refresher.
    pub term_refresh_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://skipcost.db?mode=rwc".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            db_query_timeout: Duration::from_millis(5000),
            term_calendar_url: None,
            term_calendar_api_key: None,
            term_api_timeout: Duration::from_millis(2000),
            term_refresh_secs: 86_400,
        }
    }
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: parse_var("BIND_ADDR")?.unwrap_or(defaults.bind_addr),
            db_query_timeout: parse_var("DB_QUERY_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.db_query_timeout),
            term_calendar_url: non_empty_var("TERM_CALENDAR_URL"),
            term_calendar_api_key: non_empty_var("TERM_CALENDAR_API_KEY"),
            term_api_timeout: parse_var("TERM_API_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.term_api_timeout),
            term_refresh_secs: parse_var("TERM_REFRESH_SECS")?.unwrap_or(defaults.term_refresh_secs),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(key: &str) -> Result<Option<T>, AppError> {
    match non_empty_var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_sqlite() {
        let config = AppConfig::default();
        assert!(config.database_url.starts_with("sqlite://"));
        assert_eq!(config.bind_addr.port(), 3001);
        assert!(config.term_calendar_url.is_none());
    }
}
