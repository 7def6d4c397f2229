//! Server configuration

use std::time::Duration;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Pickup server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT secret for user authentication
    pub jwt_secret: String,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// ISO currency code passed to Stripe
    pub payment_currency: String,
    /// Smallest chargeable amount in minor units
    pub payment_min_charge_cents: i64,
    /// Skip Stripe and return synthetic payment references
    pub payment_simulate: bool,
    /// How long a PIN stays in the fast cache
    pub pin_ttl: Duration,
    pub fcm_project_id: Option<String>,
    pub fcm_access_token: Option<String>,
    pub notification_queue_size: usize,
    pub notification_timeout: Duration,
    pub request_timeout: Duration,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn optional(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|s| !s.is_empty())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let stripe_secret_key = Self::require_secret("STRIPE_SECRET_KEY", &environment)?;

        // Without a real key there is nothing to talk to in development
        let simulate_default =
            environment == "development" && !stripe_secret_key.starts_with("sk_");
        let payment_simulate = Self::parsed("PAYMENT_SIMULATE", simulate_default);
        if payment_simulate && environment == "production" {
            return Err("PAYMENT_SIMULATE must not be enabled in production".into());
        }

        let payment_min_charge_cents = Self::parsed("PAYMENT_MIN_CHARGE_CENTS", 50i64);
        if payment_min_charge_cents <= 0 {
            return Err("PAYMENT_MIN_CHARGE_CENTS must be positive".into());
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: Self::parsed("HTTP_PORT", 8080),
            environment: environment.clone(),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            stripe_secret_key,
            stripe_webhook_secret: Self::require_secret("STRIPE_WEBHOOK_SECRET", &environment)?,
            payment_currency: std::env::var("PAYMENT_CURRENCY")
                .unwrap_or_else(|_| "usd".into())
                .to_lowercase(),
            payment_min_charge_cents,
            payment_simulate,
            pin_ttl: Duration::from_secs(Self::parsed("PIN_TTL_SECS", 86_400)),
            fcm_project_id: Self::optional("FCM_PROJECT_ID"),
            fcm_access_token: Self::optional("FCM_ACCESS_TOKEN"),
            notification_queue_size: Self::parsed("NOTIFICATION_QUEUE_SIZE", 256usize).max(1),
            notification_timeout: Duration::from_secs(Self::parsed(
                "NOTIFICATION_TIMEOUT_SECS",
                10,
            )),
            request_timeout: Duration::from_secs(Self::parsed("REQUEST_TIMEOUT_SECS", 30)),
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
