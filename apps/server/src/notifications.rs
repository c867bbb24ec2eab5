use std::time::Duration;

use async_trait::async_trait;
use collabhub_core::errors::{Error, Result};
use collabhub_core::tasks::{Notification, NotificationSink};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers notifications by POSTing them as JSON to a webhook.
pub struct WebhookNotificationSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotificationSink {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(|e| Error::Notification(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl NotificationSink for WebhookNotificationSink {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| Error::Notification(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Notification(format!(
                "webhook answered {} for user {}",
                status, notification.user_id
            )));
        }
        tracing::debug!("Delivered notification to user {}", notification.user_id);
        Ok(())
    }
}
