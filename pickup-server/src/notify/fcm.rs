//! Firebase Cloud Messaging via the HTTP v1 REST API (no SDK dependency)

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

use super::{NotificationSink, NotifyError, PushMessage};

const FCM_BASE_URL: &str = "https://fcm.googleapis.com/v1/projects";

#[derive(Debug, Clone)]
struct FcmCredentials {
    project_id: String,
    access_token: String,
}

/// FCM sink; degrades to log-and-skip when credentials are not configured
#[derive(Clone)]
pub struct FcmSink {
    client: reqwest::Client,
    credentials: Option<FcmCredentials>,
}

impl FcmSink {
    pub fn new(
        project_id: Option<String>,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let credentials = match (project_id, access_token) {
            (Some(project_id), Some(access_token)) => Some(FcmCredentials {
                project_id,
                access_token,
            }),
            _ => {
                tracing::warn!("FCM credentials not configured, push notifications disabled");
                None
            }
        };
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            credentials,
        })
    }
}

fn message_body(token: &str, message: &PushMessage) -> serde_json::Value {
    json!({
        "message": {
            "token": token,
            "notification": {
                "title": message.title,
                "body": message.body,
            },
            "data": message.data,
        }
    })
}

#[async_trait]
impl NotificationSink for FcmSink {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<(), NotifyError> {
        if token.is_empty() {
            return Ok(());
        }
        let Some(creds) = &self.credentials else {
            tracing::info!(title = %message.title, "FCM disabled, skipping notification");
            return Ok(());
        };

        let url = format!("{FCM_BASE_URL}/{}/messages:send", creds.project_id);
        let resp = self
            .client
            .post(url)
            .bearer_auth(&creds.access_token)
            .json(&message_body(token, message))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
