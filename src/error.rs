use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::store::StoreError;

/// Structured failure body used by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub fn fail(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            success: false,
            error: message.into(),
        }),
    )
}

pub fn store_error(err: StoreError) -> ApiError {
    let status = match &err {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Duplicate(_) | StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        StoreError::InvalidCredentials | StoreError::EmailNotVerified => StatusCode::UNAUTHORIZED,
        StoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    fail(status, err.to_string())
}

pub fn internal<E: std::fmt::Display>(err: E) -> ApiError {
    fail(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}
