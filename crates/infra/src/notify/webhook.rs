//! Webhook implementation of the FailureNotifier port.
//!
//! Posts operator-facing error reports to a configured webhook endpoint
//! (Discord-style `content` payload). Delivery is strictly fire-and-forget:
//! every failure here is logged and swallowed so the calling operation is
//! never affected.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use carelog_core::FailureNotifier;
use carelog_domain::constants::NOTIFY_TIMEOUT_SECS;
use carelog_domain::NotifyConfig;

#[derive(Serialize)]
struct WebhookPayload {
    content: String,
}

/// Webhook-backed operator notifier.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Option<String>,
}

impl WebhookNotifier {
    /// Build a notifier from configuration. A missing URL disables
    /// delivery; reports are still logged locally.
    #[must_use]
    pub fn new(config: &NotifyConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(NOTIFY_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self { client, url: config.webhook_url.clone() }
    }
}

#[async_trait]
impl FailureNotifier for WebhookNotifier {
    async fn report_failure(&self, operation: &str, message: &str) {
        let Some(url) = &self.url else {
            warn!(operation, message, "operator report dropped: no webhook configured");
            return;
        };

        let payload = WebhookPayload {
            content: format!("[{}] | {operation}\n\n{message}", Utc::now().to_rfc3339()),
        };

        match self.client.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(operation, "operator report delivered");
            }
            Ok(response) => {
                warn!(operation, status = %response.status(), "webhook rejected operator report");
            }
            Err(err) => {
                warn!(operation, error = %err, "failed to deliver operator report");
            }
        }
    }
}
