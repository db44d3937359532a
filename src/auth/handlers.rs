use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, JwtKeys, LoginRequest, RefreshRequest, RegisterRequest, RegisterResponse,
        },
        guards,
        jwt::AuthUser,
    },
    error::{fail, internal, store_error, ApiError},
    state::AppState,
    store::{NewUser, Role},
    users::dto::PublicUser,
    verification,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

fn redirect_for(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin",
        Role::User => "/dashboard",
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .store
        .authenticate(&payload.username, &payload.password)
        .await
        .map_err(|e| {
            warn!(username = %payload.username, error = %e, "login rejected");
            store_error(e)
        })?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id).map_err(internal)?;
    let refresh_token = keys.sign_refresh(user.id).map_err(internal)?;
    let redirect = redirect_for(user.role);

    info!(user_id = user.id, "user logged in");
    Ok(Json(AuthResponse {
        success: true,
        access_token,
        refresh_token,
        user: user.into(),
        redirect,
    }))
}

/// Self-service registration: always a regular user, always starts
/// unverified. A failed verification email never fails the registration.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(fail(StatusCode::BAD_REQUEST, "Invalid email"));
    }

    let user = state
        .store
        .create_user(NewUser {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            full_name: payload.full_name,
            role: Role::User,
            ..Default::default()
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

    info!(user_id = user.id, "user registered");
    Ok(Json(RegisterResponse {
        success: true,
        message: "Registration successful! Please check your email to verify your account.".into(),
        email_error,
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| fail(StatusCode::UNAUTHORIZED, e.to_string()))?;

    let user = guards::current_user(&state, claims.sub).await?;

    // Issue new pair
    let access_token = keys.sign_access(user.id).map_err(internal)?;
    let refresh_token = keys.sign_refresh(user.id).map_err(internal)?;
    let redirect = redirect_for(user.role);

    Ok(Json(AuthResponse {
        success: true,
        access_token,
        refresh_token,
        user: user.into(),
        redirect,
    }))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = guards::current_user(&state, user_id).await?;
    Ok(Json(user.into()))
}
