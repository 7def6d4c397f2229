//! Stripe webhook handler
//!
//! POST /webhooks/stripe: acknowledges Stripe events (raw body for signature verification)

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use crate::state::AppState;
use crate::stripe;

/// Verify and acknowledge an incoming event.
///
/// Events are only logged; payment state is settled synchronously at order creation.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let Some(sig_header) = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    else {
        tracing::warn!("Missing Stripe-Signature header");
        return Err(StatusCode::BAD_REQUEST);
    };

    if let Err(e) =
        stripe::verify_webhook_signature(&body, sig_header, &state.stripe_webhook_secret)
    {
        tracing::warn!(error = e, "Webhook signature verification failed");
        return Err(StatusCode::BAD_REQUEST);
    }

    let event: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(%e, "Failed to parse webhook JSON");
        StatusCode::BAD_REQUEST
    })?;

    tracing::info!(
        event_id = event["id"].as_str().unwrap_or(""),
        event_type = event["type"].as_str().unwrap_or(""),
        "Received Stripe webhook"
    );

    Ok(Json(serde_json::json!({ "received": true })))
}
