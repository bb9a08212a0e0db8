use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{contest::ContestError, store::StoreError, validation::FieldErrors};

#[derive(Debug)]
pub enum AppError {
    Validation(FieldErrors),
    Input(&'static str),
    Contest(ContestError),
    NotFound,
    Store(StoreError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound,
            other => AppError::Store(other),
        }
    }
}

impl From<ContestError> for AppError {
    fn from(err: ContestError) -> Self {
        AppError::Contest(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Validation failed", "details": details }),
            ),
            AppError::Input(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            AppError::Contest(err) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": err.to_string() }),
            ),
            AppError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "MCQ not found" })),
            AppError::Store(err) => {
                tracing::error!("store operation failed: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": err.to_string() }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

pub trait ResultExt<T> {
    /// Maps any error to a 400 carrying `message`, logging the cause.
    fn reject_input(self, message: &'static str) -> Result<T, AppError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn reject_input(self, message: &'static str) -> Result<T, AppError> {
        self.map_err(|e| {
            tracing::warn!("{message}: {e}");
            AppError::Input(message)
        })
    }
}
