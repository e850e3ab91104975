// src/store.rs
//
// Watermark persistence: one JSON file per source id under a state dir. The
// store only guarantees that the identifier string round-trips exactly; what
// the string means is the checker's business.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[async_trait]
pub trait WatermarkStore: Send + Sync {
    async fn read(&self, source_id: &str) -> Result<Option<String>>;
    async fn write(&self, source_id: &str, ident: &str) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WatermarkRecord {
    watermark: String,
    updated_at: DateTime<Utc>,
}

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, source_id: &str) -> PathBuf {
        self.dir.join(format!("{source_id}.json"))
    }
}

#[async_trait]
impl WatermarkStore for FileStore {
    async fn read(&self, source_id: &str) -> Result<Option<String>> {
        let path = self.path_for(source_id);
        let content = match fs::read_to_string(&path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("reading watermark {}", path.display()))
            }
        };
        match serde_json::from_str::<WatermarkRecord>(&content) {
            Ok(rec) => Ok(Some(rec.watermark)),
            Err(e) => {
                // A corrupt record bootstraps the source rather than failing
                // the whole check; at worst the newest entry is re-reported.
                tracing::warn!(source = source_id, error = ?e, "unreadable watermark record");
                Ok(None)
            }
        }
    }

    async fn write(&self, source_id: &str, ident: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating state dir {}", self.dir.display()))?;
        let rec = WatermarkRecord {
            watermark: ident.to_string(),
            updated_at: Utc::now(),
        };
        let path = self.path_for(source_id);
        let body = serde_json::to_vec_pretty(&rec).context("serialize watermark record")?;
        fs::write(&path, body)
            .await
            .with_context(|| format!("writing watermark {}", path.display()))
    }
}

/// In-memory store for tests and tooling.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(source_id: &str, ident: &str) -> Self {
        let store = Self::default();
        store
            .inner
            .lock()
            .expect("memory store lock")
            .insert(source_id.to_string(), ident.to_string());
        store
    }
}

#[async_trait]
impl WatermarkStore for MemoryStore {
    async fn read(&self, source_id: &str) -> Result<Option<String>> {
        Ok(self
            .inner
            .lock()
            .expect("memory store lock")
            .get(source_id)
            .cloned())
    }

    async fn write(&self, source_id: &str, ident: &str) -> Result<()> {
        self.inner
            .lock()
            .expect("memory store lock")
            .insert(source_id.to_string(), ident.to_string());
        Ok(())
    }
}
