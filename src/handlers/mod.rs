pub mod contests;
pub mod records;

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use crate::rejections::{AppError, ResultExt};

/// Parses a JSON body, answering 400 with a JSON error when it is malformed.
fn json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).reject_input("Invalid JSON body")
}
