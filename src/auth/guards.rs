use axum::http::StatusCode;

use crate::error::{fail, store_error, ApiError};
use crate::state::AppState;
use crate::store::{Role, UserRecord};

/// Resolves the token subject to a live user record.
pub async fn current_user(state: &AppState, user_id: u32) -> Result<UserRecord, ApiError> {
    state
        .store
        .user_by_id(user_id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Unauthorized"))
}

pub async fn require_admin(state: &AppState, user_id: u32) -> Result<UserRecord, ApiError> {
    let user = current_user(state, user_id).await?;
    if user.role != Role::Admin {
        return Err(fail(StatusCode::FORBIDDEN, "Forbidden"));
    }
    Ok(user)
}
