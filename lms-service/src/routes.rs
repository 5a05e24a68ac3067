use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use engagement::{Event, IngestAck};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{
    config::AppState,
    courses::{Course, CourseCreate, CourseList},
    error::{AppJson, Error},
};

pub const SERVICE_NAME: &str = "minimal-lms";

pub async fn get_root() -> impl IntoResponse {
    Json(json!({
        "service": "Minimal LMS",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "health": "/health",
    }))
}

pub async fn get_health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Receives an event from the LMS frontend and forwards it to the engagement tracker
pub async fn post_event(
    State(state): State<AppState>,
    AppJson(event): AppJson<Event>,
) -> Result<(StatusCode, Json<IngestAck>), Error> {
    let ack = engagement::ingest(state.mappings.as_ref(), &state.forwarder, event).await?;
    Ok((StatusCode::CREATED, Json(ack)))
}

pub async fn post_course(
    State(state): State<AppState>,
    AppJson(course): AppJson<CourseCreate>,
) -> Result<(StatusCode, Json<Course>), Error> {
    let course = state.courses.create(course).await?;
    info!(course = course.id, "created course");
    Ok((StatusCode::CREATED, Json(course)))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default)]
    skip: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    50
}

pub async fn get_courses(
    State(state): State<AppState>,
    Query(paging): Query<Paging>,
) -> Json<CourseList> {
    Json(state.courses.list(paging.skip, paging.limit).await)
}

pub async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Result<Json<Course>, Error> {
    state.courses.get(course_id).await.map(Json).ok_or_else(|| {
        Error::Server(
            StatusCode::NOT_FOUND,
            format!("Course {course_id} not found"),
        )
    })
}
