// src/notify/webhook.rs

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use super::{ChangeNotification, Notifier};

/// Webhook sink posting a `{ "text": ... }` payload. Attempted once and
/// reported pass/fail; retry budget is reserved for fetches.
pub struct WebhookNotifier {
    webhook_url: String,
    client: Client,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, note: &ChangeNotification) -> Result<()> {
        let text = format!(
            "*{}* has new content: *{}*\n{}\n{}",
            note.source_name, note.version_label, note.summary, note.display_url
        );
        let body = serde_json::json!({ "text": text });

        self.client
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("webhook post")?
            .error_for_status()
            .context("webhook non-2xx")?;
        Ok(())
    }
}
