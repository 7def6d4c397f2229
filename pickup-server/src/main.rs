//! pickup-server: local-pickup marketplace backend
//!
//! Long-running service that:
//! - Registers customers and business owners (JWT authenticated API)
//! - Finds active businesses near a location
//! - Charges orders through Stripe and issues a one-time pickup PIN
//! - Redeems the PIN at handoff and pushes order updates via FCM

mod api;
mod auth;
mod cache;
mod config;
mod db;
mod error;
mod geo;
mod notify;
mod orders;
mod state;
mod stripe;
mod util;

use std::net::SocketAddr;
use std::time::Duration;

use http::Method;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use config::Config;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pickup_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!(
        "Starting pickup-server (env: {}, simulate payments: {})",
        config.environment,
        config.payment_simulate
    );
    if !config.is_development() && config.fcm_access_token.is_none() {
        tracing::warn!("FCM_ACCESS_TOKEN not set outside development");
    }

    let state = AppState::new(&config).await?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    // Outermost first: x-request-id is set before tracing and echoed on the response
    let app = api::create_router(state.clone()).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(cors)
            .layer(TimeoutLayer::new(config.request_timeout)),
    );

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("pickup-server HTTP listening on {http_addr}");

    // Periodic cleanup of rate limiter windows and expired PINs (every 5 minutes)
    let rate_limiter = state.rate_limiter.clone();
    let pin_cache = state.pin_cache.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            let tracked_ips = rate_limiter.cleanup().await;
            let purged = pin_cache.purge_expired();
            tracing::debug!(
                tracked_ips,
                purged_pins = purged,
                cached_pins = pin_cache.len(),
                "Periodic cleanup"
            );
        }
    });

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("pickup-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
