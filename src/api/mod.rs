use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::{post, put};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::*;
use crate::services::AttendanceService;
use crate::state::AppState;

#[derive(Deserialize)]
struct DateQuery {
    #[serde(default)]
    date: Option<NaiveDate>,
}

impl DateQuery {
    fn or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

#[derive(Deserialize)]
struct DashboardQuery {
    #[serde(default)]
    date: Option<NaiveDate>,
    /// `HH:MM`; classes ending at or before it are left out.
    #[serde(default)]
    time: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/login", post(login))
        .route("/api/student/{student_id}/dashboard", get(student_dashboard))
        .route("/api/faculty/{faculty_id}/classes", get(faculty_classes))
        .route("/api/faculty/class/{class_id}/students", get(class_students))
        .route("/api/faculty/attendance", post(submit_attendance))
        .route("/api/faculty/attendance/rectify", put(rectify_attendance))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = AttendanceService::new(state.db.clone()).login(&req.user_id).await?;
    Ok(Json(LoginResponse { user }))
}

async fn student_dashboard(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<StudentDashboard>, AppError> {
    let now = chrono::Local::now().naive_local();
    let time = match params.time.as_deref() {
        Some(time) => NaiveTime::parse_from_str(time, "%H:%M")
            .map_err(|_| AppError::BadRequest(format!("Invalid time {time}, expected HH:MM")))?,
        None => now.time(),
    };
    let date = params.date.unwrap_or(now.date());

    let service = AttendanceService::new(state.db.clone());
    let dashboard = service.student_dashboard(&student_id, date, time).await?;
    Ok(Json(dashboard))
}

async fn faculty_classes(
    State(state): State<AppState>,
    Path(faculty_id): Path<String>,
    Query(params): Query<DateQuery>,
) -> Result<Json<FacultyClasses>, AppError> {
    let service = AttendanceService::new(state.db.clone());
    let classes = service.faculty_classes(&faculty_id, params.or_today()).await?;
    Ok(Json(classes))
}

async fn class_students(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
    Query(params): Query<DateQuery>,
) -> Result<Json<ClassRoster>, AppError> {
    let service = AttendanceService::new(state.db.clone());
    let roster = service.class_roster(&class_id, params.or_today()).await?;
    Ok(Json(roster))
}

async fn submit_attendance(
    State(state): State<AppState>,
    Json(req): Json<AttendancePayload>,
) -> Result<(StatusCode, Json<Confirmation>), AppError> {
    let service = AttendanceService::new(state.db.clone());
    let confirmation = service.record(&req).await?;
    Ok((StatusCode::CREATED, Json(confirmation)))
}

async fn rectify_attendance(
    State(state): State<AppState>,
    Json(req): Json<AttendancePayload>,
) -> Result<Json<Confirmation>, AppError> {
    let service = AttendanceService::new(state.db.clone());
    let confirmation = service.rectify(&req).await?;
    Ok(Json(confirmation))
}
