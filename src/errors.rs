use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::payload::PayloadError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Could not extract student data. Expected format: \"NAME SCHOOLID PROGRAM\"")]
    Parse(#[from] PayloadError),

    #[error("{0}")]
    Validation(String),

    /// Message from the storage backend, passed through verbatim.
    #[error("{0}")]
    Storage(String),

    #[error("Student not found")]
    NotFound,

    #[error("Failed to render page")]
    Render(#[from] askama::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn storage(err: anyhow::Error) -> Self {
        AppError::Storage(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Parse(_) | AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Storage(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Render(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Render(e) = &self {
            tracing::error!("Template rendering failed: {:?}", e);
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}
