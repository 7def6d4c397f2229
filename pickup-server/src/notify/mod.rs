//! Push notifications
//!
//! Order events are queued on a bounded channel and delivered by a detached
//! worker. Nothing on the request path waits for delivery, and delivery
//! failures are only logged.

pub mod fcm;

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::orders::ports::Directory;

pub use fcm::FcmSink;

/// Notification delivery errors
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Push provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Push provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Rendered push message
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
}

/// Best-effort push delivery to one device token
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// An empty token is a silent no-op.
    async fn send(&self, token: &str, message: &PushMessage) -> Result<(), NotifyError>;
}

/// Events the order workflow announces
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationJob {
    /// Tell the business a paid order arrived
    NewOrder {
        business_id: Uuid,
        order_id: Uuid,
        total: Decimal,
    },
    /// Tell the customer the order can be picked up
    OrderReady { customer_id: Uuid, order_id: Uuid },
}

impl NotificationJob {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewOrder { .. } => "new_order",
            Self::OrderReady { .. } => "order_ready",
        }
    }

    pub fn order_id(&self) -> Uuid {
        match self {
            Self::NewOrder { order_id, .. } | Self::OrderReady { order_id, .. } => *order_id,
        }
    }

    pub fn render(&self) -> PushMessage {
        let short = shared::util::short_id(&self.order_id());
        let (title, body) = match self {
            Self::NewOrder { total, .. } => (
                "Nuevo Pedido Recibido".to_string(),
                format!("Pedido #{short} por ${:.2} — ¡prepáralo!", total),
            ),
            Self::OrderReady { .. } => (
                "¡Tu pedido está listo!".to_string(),
                format!("Pedido #{short} está listo. Muestra tu PIN al retirar."),
            ),
        };
        let data = HashMap::from([
            ("type".to_string(), self.kind().to_string()),
            ("order_id".to_string(), self.order_id().to_string()),
        ]);
        PushMessage { title, body, data }
    }
}

/// Handle for submitting jobs to the notification worker
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<NotificationJob>,
}

impl NotificationDispatcher {
    /// Spawn the worker on the current runtime and return its handle.
    ///
    /// The worker stops once every handle has been dropped and the queue drained.
    pub fn spawn(
        sink: Arc<dyn NotificationSink>,
        directory: Arc<dyn Directory>,
        queue_size: usize,
        send_timeout: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel(queue_size.max(1));
        tokio::spawn(run_worker(rx, sink, directory, send_timeout));
        Self { tx }
    }

    /// Queue a job without waiting. A full or closed queue drops the job.
    pub fn submit(&self, job: NotificationJob) {
        match self.tx.try_send(job) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(job)) => {
                tracing::warn!(
                    kind = job.kind(),
                    order_id = %job.order_id(),
                    "Notification queue full, dropping job"
                );
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                tracing::warn!(
                    kind = job.kind(),
                    order_id = %job.order_id(),
                    "Notification worker stopped, dropping job"
                );
            }
        }
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<NotificationJob>,
    sink: Arc<dyn NotificationSink>,
    directory: Arc<dyn Directory>,
    send_timeout: Duration,
) {
    while let Some(job) = rx.recv().await {
        deliver(&job, sink.as_ref(), directory.as_ref(), send_timeout).await;
    }
    tracing::debug!("Notification worker exiting");
}

async fn deliver(
    job: &NotificationJob,
    sink: &dyn NotificationSink,
    directory: &dyn Directory,
    send_timeout: Duration,
) {
    let token = match job {
        NotificationJob::NewOrder { business_id, .. } => {
            directory.business_push_token(*business_id).await
        }
        NotificationJob::OrderReady { customer_id, .. } => {
            directory.customer_push_token(*customer_id).await
        }
    };

    let token = match token {
        Ok(Some(t)) if !t.is_empty() => t,
        Ok(_) => {
            tracing::debug!(kind = job.kind(), order_id = %job.order_id(), "No push token, skipping");
            return;
        }
        Err(e) => {
            tracing::warn!(kind = job.kind(), order_id = %job.order_id(), error = %e, "Push token lookup failed");
            return;
        }
    };

    let message = job.render();
    match tokio::time::timeout(send_timeout, sink.send(&token, &message)).await {
        Ok(Ok(())) => {
            tracing::info!(kind = job.kind(), order_id = %job.order_id(), "Notification sent");
        }
        Ok(Err(e)) => {
            tracing::warn!(kind = job.kind(), order_id = %job.order_id(), error = %e, "Notification failed");
        }
        Err(_) => {
            tracing::warn!(
                kind = job.kind(),
                order_id = %job.order_id(),
                timeout_ms = send_timeout.as_millis() as u64,
                "Notification timed out"
            );
        }
    }
}
