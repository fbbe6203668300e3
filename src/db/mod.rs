pub mod repository;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::error::AppError;
use crate::models::{EnrolledCourse, TuitionRate, UserProfile};

/// Runs a store query under `limit`. An expired query is reported as
/// `ServiceUnavailable` and is not retried.
pub async fn with_timeout<T, E, F>(limit: Duration, query: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<AppError>,
{
    match tokio::time::timeout(limit, query).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(AppError::ServiceUnavailable(format!(
            "store query timed out after {:?}",
            limit
        ))),
    }
}

pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, AppError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory store; every connection to `sqlite::memory:`
/// is its own database, so the one connection is never recycled.
pub async fn connect_in_memory() -> Result<SqlitePool, AppError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        tracing::error!("migration failed: {}", e);
        AppError::InternalServerError
    })
}

/// Reads the cost engine needs from the rate/enrollment store.
#[async_trait]
pub trait TuitionStore: Send + Sync {
    async fn fetch_user(&self, user_id: &str) -> Result<Option<UserProfile>, AppError>;

    async fn find_rate(
        &self,
        program: &str,
        student_type: &str,
        term: &str,
        term_number: Option<&str>,
    ) -> Result<Option<TuitionRate>, AppError>;

    /// Courses in ascending enrollment order.
    async fn list_enrolled_courses(&self, user_id: &str) -> Result<Vec<EnrolledCourse>, AppError>;
}

pub struct SqliteStore {
    db: SqlitePool,
    query_timeout: Duration,
}

impl SqliteStore {
    pub fn new(db: SqlitePool, query_timeout: Duration) -> Self {
        Self { db, query_timeout }
    }
}

#[async_trait]
impl TuitionStore for SqliteStore {
    async fn fetch_user(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        with_timeout(self.query_timeout, repository::fetch_user(&self.db, user_id)).await
    }

    async fn find_rate(
        &self,
        program: &str,
        student_type: &str,
        term: &str,
        term_number: Option<&str>,
    ) -> Result<Option<TuitionRate>, AppError> {
        with_timeout(
            self.query_timeout,
            repository::find_rate(&self.db, program, student_type, term, term_number),
        )
        .await
    }

    async fn list_enrolled_courses(&self, user_id: &str) -> Result<Vec<EnrolledCourse>, AppError> {
        with_timeout(
            self.query_timeout,
            repository::list_enrolled_courses(&self.db, user_id),
        )
        .await
    }
}
