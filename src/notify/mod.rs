// src/notify/mod.rs
pub mod webhook;

pub use webhook::WebhookNotifier;

use anyhow::Result;

/// What gets posted after a `Changed` outcome. Plain display strings; the
/// checker owns their formatting, the sink owns the transport.
#[derive(Debug, Clone)]
pub struct ChangeNotification {
    pub source_name: String,
    /// A single version/date, or a "from → to" range when several entries
    /// were reported at once.
    pub version_label: String,
    /// Novel entries joined oldest-first.
    pub summary: String,
    pub display_url: String,
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, note: &ChangeNotification) -> Result<()>;
}
