use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{guards, jwt::AuthUser},
    error::{fail, store_error, ApiError},
    state::AppState,
    store::{NewUser, Role, UserPatch},
    users::dto::{
        CreateUserRequest, DeleteResponse, PublicUser, UploadResponse, UserEnvelope, UsersResponse,
    },
    users::uploads,
    verification,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/create", post(create_user))
        .route("/users/:id/update", put(update_user))
        .route("/users/:id/delete", delete(delete_user))
        .route(
            "/users/:id/upload-picture",
            post(upload_picture).layer(DefaultBodyLimit::max(6 * 1024 * 1024)),
        )
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(requester_id): AuthUser,
) -> Result<Json<UsersResponse>, ApiError> {
    guards::require_admin(&state, requester_id).await?;
    let users = state
        .store
        .all_users()
        .await
        .map_err(store_error)?
        .into_iter()
        .map(PublicUser::from)
        .collect();
    Ok(Json(UsersResponse { users }))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AuthUser(requester_id): AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<UserEnvelope>, ApiError> {
    guards::require_admin(&state, requester_id).await?;

    let user = state
        .store
        .create_user(NewUser {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            full_name: payload.full_name,
            role: payload.role.unwrap_or(Role::User),
            department: payload.department,
            position: payload.position,
            phone: payload.phone,
            emergency_contact_name: payload.emergency_contact_name,
            emergency_contact_phone: payload.emergency_contact_phone,
        })
        .await
        .map_err(store_error)?;

    let email_error = verification::send_verification_email(&state, &user)
        .await
        .err()
        .map(|e| {
            warn!(user_id = user.id, error = %e, "verification email failed");
            e.to_string()
        });

    info!(user_id = user.id, by = requester_id, "user created by admin");
    Ok(Json(UserEnvelope {
        success: true,
        user: user.into(),
        email_error,
    }))
}

#[instrument(skip(state, patch))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(requester_id): AuthUser,
    Path(id): Path<u32>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<UserEnvelope>, ApiError> {
    guards::require_admin(&state, requester_id).await?;
    let user = state
        .store
        .update_user(id, patch)
        .await
        .map_err(store_error)?;
    Ok(Json(UserEnvelope {
        success: true,
        user: user.into(),
        email_error: None,
    }))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(requester_id): AuthUser,
    Path(id): Path<u32>,
) -> Result<Json<DeleteResponse>, ApiError> {
    guards::require_admin(&state, requester_id).await?;
    state.store.delete_user(id).await.map_err(store_error)?;
    info!(user_id = id, by = requester_id, "user deleted by admin");
    Ok(Json(DeleteResponse { success: true }))
}

/// Multipart field `profile_picture`; the owner or an admin may replace it.
#[instrument(skip(state, multipart))]
pub async fn upload_picture(
    State(state): State<AppState>,
    AuthUser(requester_id): AuthUser,
    Path(id): Path<u32>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let requester = guards::current_user(&state, requester_id).await?;
    if requester.id != id && requester.role != Role::Admin {
        return Err(fail(StatusCode::FORBIDDEN, "Forbidden"));
    }

    let mut file = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("profile_picture") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field
                .bytes()
                .await
                .map_err(|e| fail(StatusCode::BAD_REQUEST, e.to_string()))?;
            file = Some((data, content_type));
        }
    }
    let Some((data, content_type)) = file else {
        return Err(fail(StatusCode::BAD_REQUEST, "No file provided"));
    };

    let url = uploads::store_profile_picture(&state, id, data, &content_type).await?;
    Ok(Json(UploadResponse {
        success: true,
        profile_picture: url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn state_with_admin_and_user() -> (AppState, u32, u32) {
        let state = AppState::fake();
        let admin = state
            .store
            .create_user(NewUser {
                username: "root".into(),
                email: "root@x.com".into(),
                password: "pw".into(),
                role: Role::Admin,
                ..Default::default()
            })
            .await
            .unwrap();
        let user = state
            .store
            .create_user(NewUser {
                username: "emp".into(),
                email: "emp@x.com".into(),
                password: "pw".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        (state, admin.id, user.id)
    }

    #[tokio::test]
    async fn list_requires_admin() {
        let (state, admin_id, user_id) = state_with_admin_and_user().await;

        let err = list_users(State(state.clone()), AuthUser(user_id))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);

        let Json(ok) = list_users(State(state), AuthUser(admin_id)).await.unwrap();
        assert_eq!(ok.users.len(), 2);
    }

    #[tokio::test]
    async fn admin_create_reports_duplicate_as_bad_request() {
        let (state, admin_id, _) = state_with_admin_and_user().await;

        let payload = CreateUserRequest {
            username: "emp".into(),
            email: "new@x.com".into(),
            password: "pw".into(),
            full_name: String::new(),
            role: None,
            department: None,
            position: None,
            phone: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
        };
        let (status, Json(body)) = create_user(State(state), AuthUser(admin_id), Json(payload))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Username already exists");
    }

    #[tokio::test]
    async fn update_and_delete_flow() {
        let (state, admin_id, user_id) = state_with_admin_and_user().await;

        let Json(updated) = update_user(
            State(state.clone()),
            AuthUser(admin_id),
            Path(user_id),
            Json(UserPatch {
                position: Some("Analyst".into()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.user.position, "Analyst");

        let Json(deleted) = delete_user(State(state.clone()), AuthUser(admin_id), Path(user_id))
            .await
            .unwrap();
        assert!(deleted.success);

        let err = delete_user(State(state), AuthUser(admin_id), Path(user_id))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }
}
