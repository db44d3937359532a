use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::instrument;

use crate::error::{store_error, ApiError};
use crate::state::AppState;

pub mod service;

pub use service::{consume_token, issue_token, send_verification_email, VerifyOutcome};

/// Mounted at the root (not under /api): the link lands directly in inboxes.
pub fn router() -> Router<AppState> {
    Router::new().route("/verify-email/:token", get(verify_email))
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[instrument(skip(state))]
async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let outcome = consume_token(&state.store, &token)
        .await
        .map_err(store_error)?;
    let response = match outcome {
        VerifyOutcome::Success { email } => VerifyResponse {
            status: "success",
            email: Some(email),
        },
        VerifyOutcome::Expired => VerifyResponse {
            status: "expired",
            email: None,
        },
        VerifyOutcome::Invalid => VerifyResponse {
            status: "invalid",
            email: None,
        },
    };
    Ok(Json(response))
}
