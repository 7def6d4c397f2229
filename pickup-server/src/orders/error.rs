//! Order workflow error taxonomy

use shared::error::{AppError, ErrorCode};
use shared::models::OrderStatus;
use thiserror::Error;
use uuid::Uuid;

/// Order store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// PIN cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// Payment gateway errors
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Payment provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected payment provider response: {0}")]
    InvalidResponse(String),
}

/// Entropy source failure while drawing a PIN
#[derive(Debug, Error)]
#[error("PIN generation failed: {0}")]
pub struct PinError(#[from] pub rand::Error);

/// Order workflow errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("{0}")]
    Validation(String),

    #[error("order must contain at least one item")]
    EmptyCart,

    #[error("order total of {amount_minor} cents is below the minimum charge of {minimum_minor} cents")]
    AmountTooLow { amount_minor: i64, minimum_minor: i64 },

    #[error("payment failed: {0}")]
    Payment(#[source] PaymentError),

    #[error(transparent)]
    Pin(#[from] PinError),

    #[error("order {order_id} was charged ({payment_ref}) but could not be saved: {source}")]
    PersistedAfterPayment {
        order_id: Uuid,
        payment_ref: String,
        #[source]
        source: StoreError,
    },

    #[error("order creation aborted: {0}")]
    Aborted(String),

    #[error("failed to cache PIN: {0}")]
    PinCache(#[source] CacheError),

    #[error("order not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("order cannot be {action} in status {status}")]
    InvalidState {
        action: &'static str,
        status: OrderStatus,
    },

    #[error("invalid PIN")]
    InvalidPin,

    #[error("cancelling a {0} order requires a refund, which is not supported yet")]
    RefundRequired(OrderStatus),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrderError {
    pub(crate) fn invalid_state(action: &'static str, status: OrderStatus) -> Self {
        Self::InvalidState { action, status }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::Validation(_) => AppError::with_message(ErrorCode::ValidationFailed, message),
            OrderError::EmptyCart => AppError::with_message(ErrorCode::OrderEmpty, message),
            OrderError::AmountTooLow {
                amount_minor,
                minimum_minor,
            } => AppError::with_message(ErrorCode::PaymentAmountTooLow, message)
                .with_detail("amount_minor", amount_minor)
                .with_detail("minimum_minor", minimum_minor),
            OrderError::Payment(_) => AppError::with_message(ErrorCode::PaymentFailed, message),
            OrderError::Pin(_) => AppError::with_message(ErrorCode::InternalError, message),
            OrderError::PersistedAfterPayment {
                order_id,
                payment_ref,
                ..
            } => AppError::new(ErrorCode::OrderPersistenceFailed)
                .with_detail("order_id", order_id.to_string())
                .with_detail("payment_ref", payment_ref),
            OrderError::Aborted(_) => AppError::with_message(ErrorCode::InternalError, message),
            OrderError::PinCache(_) => AppError::with_message(ErrorCode::CacheError, message),
            OrderError::NotFound => AppError::new(ErrorCode::OrderNotFound),
            OrderError::Forbidden(_) => AppError::with_message(ErrorCode::PermissionDenied, message),
            OrderError::InvalidState { status, .. } => {
                AppError::with_message(ErrorCode::OrderInvalidState, message)
                    .with_detail("status", status.as_str())
            }
            OrderError::InvalidPin => AppError::with_message(ErrorCode::OrderInvalidPin, message),
            OrderError::RefundRequired(status) => {
                AppError::with_message(ErrorCode::NotImplemented, message)
                    .with_detail("status", status.as_str())
            }
            OrderError::Store(e) => {
                tracing::error!(error = %e, "Order store error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}
