pub mod event;

use async_trait::async_trait;
use common::config::NotificationConfig;
use common::Result;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

pub use event::{EventStatus, PipelineEvent};

/// Receives stage outcomes. Delivery problems are the sink's own business:
/// a notification can never fail the pipeline.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, event: &PipelineEvent);
}

#[derive(Debug, Clone)]
pub struct WebhookTarget {
    pub name: &'static str,
    pub url: String,
}

/// Posts `{"text": ...}` to every configured webhook, or logs the message
/// when none is configured.
pub struct WebhookNotifier {
    http: reqwest::Client,
    targets: Vec<WebhookTarget>,
}

impl WebhookNotifier {
    pub fn new(targets: Vec<WebhookTarget>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, targets })
    }

    pub fn from_config(config: &NotificationConfig) -> Result<Self> {
        let mut targets = Vec::new();
        if let Some(url) = non_blank(&config.slack_webhook_url) {
            targets.push(WebhookTarget { name: "slack", url });
        }
        if let Some(url) = non_blank(&config.teams_webhook_url) {
            targets.push(WebhookTarget { name: "teams", url });
        }

        Self::new(targets, Duration::from_secs(config.timeout_secs))
    }

    pub fn targets(&self) -> &[WebhookTarget] {
        &self.targets
    }

    /// Returns whether the webhook accepted the message.
    async fn post(&self, target: &WebhookTarget, text: &str) -> bool {
        let payload = json!({ "text": text });
        match self.http.post(&target.url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!(target = target.name, status = response.status().as_u16(), "Notification posted");
                true
            }
            Ok(response) => {
                warn!(target = target.name, status = response.status().as_u16(), "Notification rejected by webhook");
                false
            }
            Err(e) => {
                warn!(target = target.name, error = %e, "Notification delivery failed");
                false
            }
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
    async fn notify(&self, event: &PipelineEvent) {
        let text = event.render_text();

        if self.targets.is_empty() {
            match event.status {
                EventStatus::Success => info!(stage = %event.stage_id, "[alerts] {}", text),
                EventStatus::Failure => warn!(stage = %event.stage_id, "[alerts] {}", text),
            }
            return;
        }

        for target in &self.targets {
            self.post(target, &text).await;
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
