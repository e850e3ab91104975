// src/config.rs
//
// Explicit configuration passed into the checker at construction time. No
// ambient env lookups happen inside core logic; main.rs is the only place
// that reads the environment.

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ident::IdentKind;

/// Extraction strategy for a monitored source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Markdown changelog with `## [x.y.z]` version headings.
    SemverChangelog,
    /// Release-notes page structured by line-leading dates.
    DatedPage,
    /// Blog index with heading + `Month D, YYYY` post pairs.
    DatedBlog,
}

/// Date sub-format for `dated-page` sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateFormat {
    /// Zero-padded `YYYY.MM.DD`.
    Numeric,
    /// Human-readable `Month D, YYYY`.
    #[default]
    MonthName,
}

/// One monitored feed. Loaded once at process start, immutable after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Stable id, also the watermark key in the state dir.
    pub id: String,
    /// Human name used in notifications.
    pub name: String,
    /// Fetch URL (or the URL handed to the archive lookup when `archive`).
    pub url: String,
    pub kind: SourceKind,
    #[serde(default)]
    pub date_format: DateFormat,
    /// Link shown in notifications; falls back to `url` when absent.
    #[serde(default)]
    pub display_url: Option<String>,
    /// Obtain content via the archival-snapshot service instead of a direct
    /// fetch. Failures for such sources are treated as transient.
    #[serde(default)]
    pub archive: bool,
    /// Host-specific path pattern for article links in blog post spans.
    #[serde(default)]
    pub link_pattern: Option<String>,
}

impl SourceConfig {
    /// Comparator rule for this source's identifiers.
    pub fn ident_kind(&self) -> IdentKind {
        match self.kind {
            SourceKind::SemverChangelog => IdentKind::Version,
            SourceKind::DatedPage | SourceKind::DatedBlog => IdentKind::Date,
        }
    }

    /// Compiled `link_pattern`, if one is configured and valid. Validity is
    /// checked at load time, so `None` here means "not configured".
    pub fn link_regex(&self) -> Option<Regex> {
        self.link_pattern
            .as_deref()
            .and_then(|p| Regex::new(p).ok())
    }

    pub fn display_url(&self) -> &str {
        self.display_url.as_deref().unwrap_or(&self.url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Directory for per-source watermark files.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Webhook endpoint for change notifications; notifications are skipped
    /// entirely when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("state")
}

/// Load and validate configuration from a TOML file.
pub fn load_from(path: &Path) -> Result<WatchConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let cfg: WatchConfig = toml::from_str(&content)
        .with_context(|| format!("parsing config from {}", path.display()))?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &WatchConfig) -> Result<()> {
    let mut seen = BTreeSet::new();
    for src in &cfg.sources {
        if src.id.trim().is_empty() {
            return Err(anyhow!("source with empty id"));
        }
        if !seen.insert(src.id.as_str()) {
            return Err(anyhow!("duplicate source id: {}", src.id));
        }
        if src.url.trim().is_empty() {
            return Err(anyhow!("source {} has an empty url", src.id));
        }
        if let Some(pat) = src.link_pattern.as_deref() {
            Regex::new(pat)
                .with_context(|| format!("invalid link_pattern for source {}", src.id))?;
        }
    }
    Ok(())
}
