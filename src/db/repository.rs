use chrono::{SecondsFormat, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::course::CourseRow;
use crate::models::user::UserRow;
use crate::models::{EnrolledCourse, NewCourseRequest, NewUserRequest, TuitionRate, UpdateUserRequest, UserProfile};

/// Fixed-width timestamps so that text ordering matches time ordering.
fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub async fn insert_user(db: &SqlitePool, req: NewUserRequest) -> Result<UserProfile, AppError> {
    req.validate()?;
    let id = Uuid::new_v4().to_string();
    let now = now();

    sqlx::query(
        r#"
        INSERT INTO users
            (id, name, email, program, student_type, term_number, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
        "#,
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&req.email)
    .bind(req.program.as_str())
    .bind(req.student_type.as_str())
    .bind(&req.term_number)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(UserProfile {
        id,
        name: req.name,
        email: req.email,
        program: req.program,
        student_type: req.student_type,
        term_number: req.term_number,
        created_at: now.clone(),
        updated_at: now,
    })
}

pub async fn fetch_user(db: &SqlitePool, id: &str) -> Result<Option<UserProfile>, AppError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, name, email, program, student_type, term_number, created_at, updated_at
        FROM users
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    row.map(UserProfile::try_from).transpose()
}

pub async fn update_user(
    db: &SqlitePool,
    id: &str,
    req: UpdateUserRequest,
) -> Result<Option<UserProfile>, AppError> {
    req.validate()?;
    let Some(existing) = fetch_user(db, id).await? else {
        return Ok(None);
    };

    let program = req.program.unwrap_or(existing.program);
    let student_type = req.student_type.unwrap_or(existing.student_type);
    let term_number = req.term_number.unwrap_or(existing.term_number);
    let updated_at = now();

    sqlx::query(
        r#"
        UPDATE users
        SET program = ?1, student_type = ?2, term_number = ?3, updated_at = ?4
        WHERE id = ?5
        "#,
    )
    .bind(program.as_str())
    .bind(student_type.as_str())
    .bind(&term_number)
    .bind(&updated_at)
    .bind(id)
    .execute(db)
    .await?;

    Ok(Some(UserProfile {
        program,
        student_type,
        term_number,
        updated_at,
        ..existing
    }))
}

/// Rate row for the combination. A row with a NULL `term_number` is a
/// wildcard; an exact `term_number` match wins over it.
pub async fn find_rate(
    db: &SqlitePool,
    program: &str,
    student_type: &str,
    term: &str,
    term_number: Option<&str>,
) -> Result<Option<TuitionRate>, sqlx::Error> {
    sqlx::query_as::<_, TuitionRate>(
        r#"
        SELECT program, student_type, term, term_number, course_1_4_cost, course_5_plus_cost
        FROM tuition_rates
        WHERE program = ?1
          AND student_type = ?2
          AND term = ?3
          AND (term_number = ?4 OR term_number IS NULL)
        ORDER BY term_number IS NULL
        LIMIT 1
        "#,
    )
    .bind(program)
    .bind(student_type)
    .bind(term)
    .bind(term_number)
    .fetch_optional(db)
    .await
}

pub async fn insert_rate(db: &SqlitePool, rate: &TuitionRate) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO tuition_rates
            (program, student_type, term, term_number, course_1_4_cost, course_5_plus_cost)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&rate.program)
    .bind(&rate.student_type)
    .bind(&rate.term)
    .bind(&rate.term_number)
    .bind(rate.course_1_4_cost)
    .bind(rate.course_5_plus_cost)
    .execute(db)
    .await?;
    Ok(())
}

/// The user's courses in the order they were enrolled, with 1-based positions.
pub async fn list_enrolled_courses(
    db: &SqlitePool,
    user_id: &str,
) -> Result<Vec<EnrolledCourse>, AppError> {
    let rows = sqlx::query_as::<_, CourseRow>(
        r#"
        SELECT
            c.id, c.course_code, c.course_name, c.term, c.section,
            c.days_of_week, c.start_time, c.end_time,
            e.created_at AS enrolled_at
        FROM enrollments e
        JOIN courses c ON c.id = e.course_id
        WHERE e.user_id = ?1
        ORDER BY e.created_at ASC, e.seq ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| row.into_enrolled(index + 1))
        .collect()
}

/// Enrolls a user in a course, creating the shared course row if no course
/// with the same (code, term, section) exists yet.
pub async fn enroll_course(
    db: &SqlitePool,
    req: NewCourseRequest,
) -> Result<EnrolledCourse, AppError> {
    let req = req.normalize()?;
    let term = req.term.clone().unwrap_or_default();
    let section = req.section.clone().unwrap_or_default();
    let days_json = serde_json::to_string(&req.days_of_week).map_err(|e| {
        tracing::error!("failed to encode days_of_week: {}", e);
        AppError::InternalServerError
    })?;

    let mut tx = db.begin().await?;

    let user_exists: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?1")
        .bind(&req.user_id)
        .fetch_optional(&mut *tx)
        .await?;
    if user_exists.is_none() {
        return Err(AppError::NotFound("User".to_string()));
    }

    sqlx::query(
        r#"
        INSERT INTO courses
            (id, course_code, course_name, term, section, days_of_week, start_time, end_time, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT (course_code, term, section) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&req.course_code)
    .bind(&req.course_name)
    .bind(&term)
    .bind(&section)
    .bind(&days_json)
    .bind(&req.start_time)
    .bind(&req.end_time)
    .bind(now())
    .execute(&mut *tx)
    .await?;

    let (course_id,): (String,) = sqlx::query_as(
        "SELECT id FROM courses WHERE course_code = ?1 AND term = ?2 AND section = ?3",
    )
    .bind(&req.course_code)
    .bind(&term)
    .bind(&section)
    .fetch_one(&mut *tx)
    .await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO enrollments (user_id, course_id, created_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (user_id, course_id) DO NOTHING
        "#,
    )
    .bind(&req.user_id)
    .bind(&course_id)
    .bind(now())
    .execute(&mut *tx)
    .await?;
    if inserted.rows_affected() == 0 {
        return Err(AppError::Conflict(format!("Already enrolled in {}", req.course_code)));
    }

    tx.commit().await?;

    list_enrolled_courses(db, &req.user_id)
        .await?
        .into_iter()
        .find(|c| c.course.id == course_id)
        .ok_or(AppError::InternalServerError)
}

/// Removes the enrollment only; the shared course row stays.
pub async fn delete_enrollment(
    db: &SqlitePool,
    user_id: &str,
    course_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM enrollments WHERE user_id = ?1 AND course_id = ?2")
        .bind(user_id)
        .bind(course_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
