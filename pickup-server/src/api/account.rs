//! Caller's own account settings

use axum::{Extension, Json, extract::State};
use shared::error::{AppError, ErrorCode};
use shared::models::PushTokenUpdate;

use crate::auth::Identity;
use crate::db;
use crate::state::AppState;

use super::ApiResult;

/// PUT /api/v1/me/push-token
pub async fn update_push_token(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<PushTokenUpdate>,
) -> ApiResult<serde_json::Value> {
    let token = req
        .push_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    db::users::set_push_token(&state.pool, identity.user_id, token)
        .await
        .map_err(|e| {
            tracing::error!("DB error updating push token: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;

    Ok(Json(serde_json::json!({ "updated": true })))
}
