use async_trait::async_trait;
use enb_core::{Error, Notifier, Result, ScoredPickup};
use reqwest::StatusCode;
use serde_json::json;
use std::time::Duration;
use tracing::{error, info};

pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts one message per article to a Microsoft Teams incoming webhook.
#[derive(Debug, Clone)]
pub struct TeamsNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl TeamsNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_WEBHOOK_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }

    /// One webhook call. Anything but a 200 is a `Notification` error.
    pub async fn send(&self, pickup: &ScoredPickup) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&Self::message(pickup))
            .send()
            .await
            .map_err(|e| Error::Notification(e.to_string()))?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(Error::Notification(format!("webhook returned {}", status))),
        }
    }

    pub fn message(pickup: &ScoredPickup) -> serde_json::Value {
        let record = &pickup.record;
        json!({
            "text": format!(
                "**[{}] {}**\n\n{}\n\n[Read more]({})",
                record.importance, record.title, record.summary, record.url
            )
        })
    }
}

#[async_trait]
impl Notifier for TeamsNotifier {
    fn name(&self) -> &str {
        "Teams"
    }

    async fn post(&self, pickup: &ScoredPickup) -> bool {
        match self.send(pickup).await {
            Ok(()) => {
                info!("📤 Posted to Teams: {}", pickup.record.title);
                true
            }
            Err(e) => {
                error!("Failed to post {} to Teams: {}", pickup.record.url, e);
                false
            }
        }
    }
}
