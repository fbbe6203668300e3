use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::routing::{delete, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::db::{repository, with_timeout};
use crate::error::AppError;
use crate::models::*;
use crate::parser::{ScheduleImport, import_schedule};
use crate::state::AppState;

#[derive(Deserialize)]
struct DateQueryParams {
    date: Option<String>,
}

#[derive(Deserialize)]
struct ParseScheduleRequest {
    text: String,
}

#[derive(Serialize)]
struct Success<T: Serialize> {
    success: bool,
    #[serde(flatten)]
    body: T,
}

fn success<T: Serialize>(body: T) -> Json<Success<T>> {
    Json(Success { success: true, body })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/users", post(create_user))
        .route("/api/users/{id}", get(get_user).patch(update_user))
        .route("/api/courses", post(create_course))
        .route("/api/courses/{user_id}", get(list_courses))
        .route("/api/courses/{user_id}/{course_id}", delete(delete_course))
        .route("/api/schedule/parse", post(parse_schedule))
        .route("/api/calculate/{user_id}", get(calculate))
        .route("/api/terms/current", get(current_term))
        .with_state(state)
}

/// `YYYY-MM-DD`, defaulting to today's local date when absent or empty.
fn parse_date(raw: Option<&str>) -> Result<NaiveDate, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| AppError::Validation(format!("Invalid date {}, expected YYYY-MM-DD", s))),
        None => Ok(Local::now().date_naive()),
    }
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    with_timeout(state.query_timeout, sqlx::query("select 1").execute(&state.db)).await?;
    Ok(Json(json!({ "success": true, "status": "ok" })))
}

async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<NewUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(req) = payload?;
    let user = with_timeout(state.query_timeout, repository::insert_user(&state.db, req)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "user": user }))))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let user = with_timeout(state.query_timeout, repository::fetch_user(&state.db, &id))
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;
    Ok(Json(json!({ "success": true, "user": user })))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(req) = payload?;
    let user = with_timeout(state.query_timeout, repository::update_user(&state.db, &id, req))
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;
    Ok(Json(json!({ "success": true, "user": user })))
}

async fn create_course(
    State(state): State<AppState>,
    payload: Result<Json<NewCourseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(req) = payload?;
    let course = with_timeout(state.query_timeout, repository::enroll_course(&state.db, req)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "course": course }))))
}

async fn list_courses(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let courses = with_timeout(
        state.query_timeout,
        repository::list_enrolled_courses(&state.db, &user_id),
    )
    .await?;
    Ok(Json(json!({ "success": true, "courses": courses })))
}

async fn delete_course(
    State(state): State<AppState>,
    Path((user_id, course_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let ok = with_timeout(
        state.query_timeout,
        repository::delete_enrollment(&state.db, &user_id, &course_id),
    )
    .await?;
    if ok {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Enrollment".to_string()))
    }
}

async fn parse_schedule(
    payload: Result<Json<ParseScheduleRequest>, JsonRejection>,
) -> Result<Json<Success<ScheduleImport>>, AppError> {
    let Json(req) = payload?;
    let import = import_schedule(&req.text);
    tracing::info!("parsed {} courses from pasted schedule", import.courses.len());
    Ok(success(import))
}

async fn calculate(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    params: Result<Query<DateQueryParams>, QueryRejection>,
) -> Result<Json<Success<CostBreakdown>>, AppError> {
    let Query(params) = params?;
    let date = parse_date(params.date.as_deref())?;
    let breakdown = state.engine.compute_breakdown(&user_id, date).await?;
    Ok(success(breakdown))
}

async fn current_term(
    State(state): State<AppState>,
    params: Result<Query<DateQueryParams>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(params) = params?;
    let date = parse_date(params.date.as_deref())?;
    let term = state.terms.current_term(date).await;
    Ok(Json(json!({ "success": true, "date": date, "term": term })))
}
