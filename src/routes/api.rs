use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::student::StudentModel,
    pagination::PageRequest,
    payload::ScannedStudent,
    services::student::Listing,
    startup::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ScanPayload {
    pub raw_text: String,
}

#[instrument(name = "HTTP: Parse scan", skip(state, payload))]
pub async fn parse(
    State(state): State<AppState>,
    Json(payload): Json<ScanPayload>,
) -> Result<Json<ScannedStudent>, AppError> {
    Ok(Json(state.student_service.parse(&payload.raw_text)?))
}

#[instrument(name = "HTTP: Scan and save", skip(state, payload))]
pub async fn scan(
    State(state): State<AppState>,
    Json(payload): Json<ScanPayload>,
) -> Result<impl IntoResponse, AppError> {
    let student = state.student_service.scan_and_save(&payload.raw_text).await?;
    Ok((StatusCode::OK, Json(student)))
}

#[instrument(name = "HTTP: List students", skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(request): Query<PageRequest>,
) -> Result<Json<Listing>, AppError> {
    Ok(Json(state.student_service.list(request).await?))
}

#[instrument(name = "HTTP: Get student", skip(state))]
pub async fn get_by_school_id(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Json<StudentModel>, AppError> {
    Ok(Json(state.student_service.find_card(&school_id).await?))
}

#[instrument(name = "HTTP: Delete student", skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.student_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
