// src/fetch.rs
//
// Content source collaborator: direct page fetch plus the archival-snapshot
// lookup for sources whose live page is unusable. Network calls get two
// attempts with a fixed delay; everything past that surfaces as an error
// the checker classifies.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// A timestamped archival snapshot whose content can be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRef {
    /// Archive timestamp (14-digit, byte-comparable).
    pub timestamp: String,
    /// URL the snapshot content is served from.
    pub url: String,
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
    async fn find_latest_snapshot(&self, url: &str) -> Result<Option<SnapshotRef>>;
}

const FETCH_ATTEMPTS: u32 = 2;

pub struct HttpSource {
    client: Client,
    timeout: Duration,
    retry_delay: Duration,
    availability_endpoint: String,
}

impl HttpSource {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            timeout: Duration::from_secs(15),
            retry_delay: Duration::from_millis(750),
            availability_endpoint: "https://archive.org/wayback/available".to_string(),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Override the snapshot lookup endpoint (tests point this at a stub).
    pub fn with_availability_endpoint(mut self, endpoint: String) -> Self {
        self.availability_endpoint = endpoint;
        self
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

// Wayback availability response shape.
#[derive(Debug, Deserialize)]
struct Availability {
    #[serde(default)]
    archived_snapshots: ArchivedSnapshots,
}

#[derive(Debug, Default, Deserialize)]
struct ArchivedSnapshots {
    closest: Option<Closest>,
}

#[derive(Debug, Deserialize)]
struct Closest {
    #[serde(default)]
    available: bool,
    url: String,
    timestamp: String,
}

#[async_trait]
impl ContentSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        let mut last_err = None;
        for attempt in 1..=FETCH_ATTEMPTS {
            let result = self
                .client
                .get(url)
                .timeout(self.timeout)
                .send()
                .await
                .context("http send")
                .and_then(|rsp| rsp.error_for_status().context("non-success status"));
            match result {
                Ok(rsp) => return rsp.text().await.context("read response body"),
                Err(e) => {
                    tracing::debug!(url, attempt, error = ?e, "fetch attempt failed");
                    last_err = Some(e);
                }
            }
            if attempt < FETCH_ATTEMPTS {
                tokio::time::sleep(self.retry_delay).await;
            }
        }
        Err(last_err
            .unwrap_or_else(|| anyhow!("fetch failed"))
            .context(format!("fetching {url}")))
    }

    async fn find_latest_snapshot(&self, url: &str) -> Result<Option<SnapshotRef>> {
        let api_url = format!("{}?url={}", self.availability_endpoint, url);
        let body = self.fetch(&api_url).await.context("archive availability lookup")?;
        let availability: Availability =
            serde_json::from_str(&body).context("parse archive availability response")?;
        Ok(availability
            .archived_snapshots
            .closest
            .filter(|c| c.available)
            .map(|c| SnapshotRef {
                timestamp: c.timestamp,
                url: c.url,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_response_parses() {
        let body = r#"{
            "url": "https://example.test/blog",
            "archived_snapshots": {
                "closest": {
                    "status": "200",
                    "available": true,
                    "url": "http://web.archive.org/web/20240101000000/https://example.test/blog",
                    "timestamp": "20240101000000"
                }
            }
        }"#;
        let availability: Availability = serde_json::from_str(body).unwrap();
        let closest = availability.archived_snapshots.closest.unwrap();
        assert!(closest.available);
        assert_eq!(closest.timestamp, "20240101000000");
    }

    #[test]
    fn empty_availability_means_no_snapshot() {
        let availability: Availability =
            serde_json::from_str(r#"{"archived_snapshots": {}}"#).unwrap();
        assert!(availability.archived_snapshots.closest.is_none());
    }
}
