use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{guards, jwt::AuthUser},
    error::{fail, store_error, ApiError},
    payroll::dto::{HistoryResponse, Payslip, SlipQuery, UpsertRequest, UpsertResponse},
    payroll::service,
    state::AppState,
    store::Role,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payroll/me", get(my_history))
        .route("/payroll/:id/history", get(user_history))
        .route("/payroll/:id/upsert", post(upsert))
        .route("/payroll/:id/slip", get(slip))
}

#[instrument(skip(state))]
pub async fn my_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<HistoryResponse>, ApiError> {
    let user = guards::current_user(&state, user_id).await?;
    let payroll_history = service::history(&state.store, user.id)
        .await
        .map_err(store_error)?;
    Ok(Json(HistoryResponse { payroll_history }))
}

#[instrument(skip(state))]
pub async fn user_history(
    State(state): State<AppState>,
    AuthUser(requester_id): AuthUser,
    Path(id): Path<u32>,
) -> Result<Json<HistoryResponse>, ApiError> {
    guards::require_admin(&state, requester_id).await?;
    let payroll_history = service::history(&state.store, id)
        .await
        .map_err(store_error)?;
    Ok(Json(HistoryResponse { payroll_history }))
}

#[instrument(skip(state, payload))]
pub async fn upsert(
    State(state): State<AppState>,
    AuthUser(requester_id): AuthUser,
    Path(id): Path<u32>,
    Json(payload): Json<UpsertRequest>,
) -> Result<Json<UpsertResponse>, ApiError> {
    guards::require_admin(&state, requester_id).await?;

    let Some(month) = payload.month.filter(|m| !m.is_empty()) else {
        return Err(fail(StatusCode::BAD_REQUEST, "Month is required (YYYY-MM)"));
    };
    let status = service::parse_status(payload.status.as_deref()).map_err(store_error)?;

    let input = service::UpsertInput {
        month,
        base_salary: service::parse_money(payload.base_salary.as_ref()),
        allowances: service::parse_money(payload.allowances.as_ref()),
        deductions: service::parse_money(payload.deductions.as_ref()),
        status,
        notes: payload.notes.unwrap_or_default(),
    };

    let record = service::upsert_record(&state.store, id, input)
        .await
        .map_err(store_error)?;
    Ok(Json(UpsertResponse {
        success: true,
        record,
    }))
}

/// Payslip for one month; admins may fetch anyone's, users only their own.
#[instrument(skip(state))]
pub async fn slip(
    State(state): State<AppState>,
    AuthUser(requester_id): AuthUser,
    Path(id): Path<u32>,
    Query(query): Query<SlipQuery>,
) -> Result<Json<Payslip>, ApiError> {
    let requester = guards::current_user(&state, requester_id).await?;
    if requester.role != Role::Admin && requester.id != id {
        return Err(fail(StatusCode::FORBIDDEN, "Forbidden"));
    }

    let Some(month) = query.month.filter(|m| !m.is_empty()) else {
        return Err(fail(StatusCode::BAD_REQUEST, "Month is required (YYYY-MM)"));
    };

    let user = state
        .store
        .user_by_id(id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "User not found"))?;

    let record = service::record_for_month(&state.store, id, &month)
        .await
        .map_err(store_error)?
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "Payroll record not found"))?;

    Ok(Json(service::compose_slip(&user, &record)))
}
