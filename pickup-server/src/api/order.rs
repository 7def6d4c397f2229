//! Order endpoints: place, read, redeem, mark ready, cancel

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderCreate, OrderCreated, OrderReady, PinValidation, UserRole};
use uuid::Uuid;

use crate::auth::Identity;
use crate::db;
use crate::state::AppState;

use super::{ApiResult, verify_business};

/// POST /api/v1/orders
///
/// Charges the customer; the response is the only place the PIN appears.
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<OrderCreate>,
) -> Result<(StatusCode, Json<OrderCreated>), AppError> {
    let business = db::businesses::find_by_id(&state.pool, req.business_id)
        .await
        .map_err(|e| {
            tracing::error!("Business query error: {e}");
            AppError::new(ErrorCode::InternalError)
        })?
        .ok_or_else(|| AppError::new(ErrorCode::BusinessNotFound))?;

    if !business.is_active {
        return Err(AppError::new(ErrorCode::BusinessInactive));
    }

    let created = state
        .workflow
        .create(identity.user_id, business.id, &req.items)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/orders
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<serde_json::Value> {
    let orders = state.workflow.list_mine(identity.user_id).await?;

    Ok(Json(serde_json::json!({
        "count": orders.len(),
        "data": orders,
    })))
}

/// GET /api/v1/orders/{id}
pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Order> {
    Ok(Json(state.workflow.get_order(id, identity.user_id).await?))
}

/// POST /api/v1/orders/{id}/validate-pin
///
/// Called by the business at handoff; completes the order on a PIN match.
pub async fn validate_pin(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(req): Json<PinValidation>,
) -> ApiResult<serde_json::Value> {
    identity.require_role(UserRole::BusinessOwner)?;
    verify_business(&state, req.business_id, identity.user_id).await?;

    let order = state
        .workflow
        .validate_pin(id, req.pin.trim(), req.business_id)
        .await?;

    Ok(Json(serde_json::json!({
        "message": "order completed successfully",
        "order": order,
    })))
}

/// POST /api/v1/orders/{id}/ready
pub async fn mark_ready(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(req): Json<OrderReady>,
) -> ApiResult<Order> {
    identity.require_role(UserRole::BusinessOwner)?;
    verify_business(&state, req.business_id, identity.user_id).await?;

    Ok(Json(state.workflow.mark_ready(id, req.business_id).await?))
}

/// POST /api/v1/orders/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Order> {
    Ok(Json(state.workflow.cancel(id, identity.user_id).await?))
}
