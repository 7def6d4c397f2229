//! HTTP routes

pub mod account;
pub mod auth;
pub mod business;
pub mod health;
pub mod order;
pub mod stripe_webhook;

use axum::routing::{get, post, put};
use axum::{Json, Router, middleware};
use shared::error::{AppError, ErrorCode};
use shared::models::Business;
use uuid::Uuid;

use crate::auth::jwt::auth_middleware;
use crate::auth::rate_limit::{login_rate_limit, register_rate_limit};
use crate::db;
use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, AppError>;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Public auth (rate limited per IP)
    let auth = Router::new()
        .route(
            "/auth/register",
            post(auth::register).layer(middleware::from_fn_with_state(
                state.clone(),
                register_rate_limit,
            )),
        )
        .route(
            "/auth/login",
            post(auth::login).layer(middleware::from_fn_with_state(
                state.clone(),
                login_rate_limit,
            )),
        );

    // JWT-protected API
    let api = Router::new()
        .route("/businesses", post(business::create))
        .route("/businesses/nearby", get(business::nearby))
        .route("/businesses/{id}", get(business::get))
        .route("/businesses/{id}/push-token", put(business::update_push_token))
        .route("/orders", post(order::create).get(order::list))
        .route("/orders/{id}", get(order::get))
        .route("/orders/{id}/validate-pin", post(order::validate_pin))
        .route("/orders/{id}/ready", post(order::mark_ready))
        .route("/orders/{id}/cancel", post(order::cancel))
        .route("/me/push-token", put(account::update_push_token))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Stripe webhook (signature-verified, raw body)
    let webhook = Router::new().route("/webhooks/stripe", post(stripe_webhook::handle_webhook));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(auth)
        .nest("/api/v1", api)
        .merge(webhook)
        .with_state(state)
}

/// Load a business and check the caller owns it
pub(crate) async fn verify_business(
    state: &AppState,
    business_id: Uuid,
    owner_id: Uuid,
) -> ServiceResult<Business> {
    let business = db::businesses::find_by_id(&state.pool, business_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BusinessNotFound))?;

    if business.owner_id != owner_id {
        return Err(ServiceError::App(AppError::permission_denied(
            "business does not belong to you",
        )));
    }
    Ok(business)
}
