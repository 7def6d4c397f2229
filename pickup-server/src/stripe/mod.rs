//! Stripe integration via REST API (no SDK dependency)

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

use crate::orders::error::PaymentError;
use crate::orders::ports::PaymentGateway;

const PAYMENT_INTENTS_URL: &str = "https://api.stripe.com/v1/payment_intents";

/// Payment settings, passed explicitly to the gateway
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Stripe secret key
    pub secret_key: String,
    /// ISO currency code, lowercase
    pub currency: String,
    /// Smallest chargeable amount in minor units
    pub min_charge_minor: i64,
    /// Return a synthetic reference instead of calling Stripe
    pub simulate: bool,
    /// Per-request timeout for Stripe calls
    pub timeout: Duration,
}

/// Card charges through Stripe PaymentIntents
#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    config: PaymentConfig,
}

impl StripeGateway {
    pub fn new(config: PaymentConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        if config.simulate {
            tracing::warn!("Stripe simulation enabled, no real charges will be made");
        }
        Ok(Self { client, config })
    }

    async fn create_payment_intent(&self, amount_minor: i64) -> Result<String, PaymentError> {
        let amount = amount_minor.to_string();
        let resp = self
            .client
            .post(PAYMENT_INTENTS_URL)
            .basic_auth(&self.config.secret_key, None::<&str>)
            .form(&[
                ("amount", amount.as_str()),
                ("currency", self.config.currency.as_str()),
                ("automatic_payment_methods[enabled]", "true"),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body: serde_json::Value = resp.json().await?;
        parse_payment_intent(status.is_success(), &body)
    }
}

fn parse_payment_intent(ok: bool, body: &serde_json::Value) -> Result<String, PaymentError> {
    if !ok {
        let message = body["error"]["message"]
            .as_str()
            .unwrap_or("unknown Stripe error");
        return Err(PaymentError::Declined(message.to_string()));
    }
    body["id"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| PaymentError::InvalidResponse(format!("payment intent without id: {body}")))
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn minimum_charge_minor(&self) -> i64 {
        self.config.min_charge_minor
    }

    async fn charge(&self, amount_minor: i64) -> Result<String, PaymentError> {
        if self.config.simulate {
            tracing::info!(amount_minor, "Simulated charge");
            return Ok(format!("pi_simulated_{amount_minor}_cents"));
        }

        let payment_ref = self.create_payment_intent(amount_minor).await?;
        tracing::info!(amount_minor, payment_ref = %payment_ref, "Payment intent created");
        Ok(payment_ref)
    }
}

/// Verify Stripe webhook signature (HMAC-SHA256)
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    verify_webhook_signature_at(payload, sig_header, secret, chrono::Utc::now().timestamp())
}

fn verify_webhook_signature_at(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
    now: i64,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signatures = Vec::new();
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signatures.push(v);
        }
    }

    if timestamp.is_empty() || signatures.is_empty() {
        return Err("Invalid Stripe-Signature header");
    }

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    // Stripe may send several v1 signatures during secret rotation
    let matched = signatures.iter().any(|sig| {
        hex::decode(sig)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });
    if !matched {
        return Err("Webhook signature mismatch");
    }

    // Reject events older than 5 minutes to prevent replay attacks
    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    if (now - ts).abs() > 300 {
        return Err("Webhook timestamp too old");
    }

    Ok(())
}
