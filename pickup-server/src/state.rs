//! Application state

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use crate::auth::rate_limit::RateLimiter;
use crate::cache::MemoryPinCache;
use crate::config::Config;
use crate::db::{self, PgDirectory, PgOrderStore};
use crate::geo::GeoIndex;
use crate::notify::{FcmSink, NotificationDispatcher};
use crate::orders::OrderWorkflow;
use crate::stripe::{PaymentConfig, StripeGateway};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// JWT secret for user authentication
    pub jwt_secret: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Order lifecycle orchestration
    pub workflow: OrderWorkflow,
    /// Business locations for the nearby search
    pub geo: GeoIndex,
    /// Fast PIN lookup, also purged periodically from `main`
    pub pin_cache: MemoryPinCache,
    /// Rate limiter for login/registration routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Connect, migrate and wire every collaborator of the order workflow
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let pin_cache = MemoryPinCache::new();
        let directory = Arc::new(PgDirectory::new(pool.clone()));

        let gateway = StripeGateway::new(PaymentConfig {
            secret_key: config.stripe_secret_key.clone(),
            currency: config.payment_currency.clone(),
            min_charge_minor: config.payment_min_charge_cents,
            simulate: config.payment_simulate,
            timeout: config.request_timeout,
        })?;

        let sink = FcmSink::new(
            config.fcm_project_id.clone(),
            config.fcm_access_token.clone(),
            config.notification_timeout,
        )?;
        let notifier = NotificationDispatcher::spawn(
            Arc::new(sink),
            directory.clone(),
            config.notification_queue_size,
            config.notification_timeout,
        );

        let workflow = OrderWorkflow::new(
            Arc::new(PgOrderStore::new(pool.clone())),
            Arc::new(pin_cache.clone()),
            Arc::new(gateway),
            directory,
            notifier,
        )
        .with_pin_ttl(config.pin_ttl);

        let geo = GeoIndex::new();
        for business in db::businesses::list_active(&pool).await? {
            geo.upsert(
                business.id,
                business.latitude,
                business.longitude,
                business.category,
            );
        }
        tracing::info!(businesses = geo.len(), "Geo index loaded");

        Ok(Self {
            pool,
            jwt_secret: config.jwt_secret.clone(),
            stripe_webhook_secret: config.stripe_webhook_secret.clone(),
            workflow,
            geo,
            pin_cache,
            rate_limiter: RateLimiter::new(),
        })
    }
}
