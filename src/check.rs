// src/check.rs
//
// Per-source check orchestration: read watermark → obtain content → extract
// → filter for novelty → regression guard → format → persist. Every failure
// is captured into the outcome; nothing escapes the check boundary.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

use crate::config::{SourceConfig, SourceKind};
use crate::extract::{self, Entry};
use crate::fetch::ContentSource;
use crate::ident::{self, IdentKind};
use crate::novelty::{self, MatchField, NoveltyOutcome};
use crate::store::WatermarkStore;

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("sentinel_checks_total", "Source checks started.");
        describe_counter!("sentinel_changed_total", "Checks that found new content.");
        describe_counter!("sentinel_unchanged_total", "Checks with no new content.");
        describe_counter!("sentinel_failed_total", "Checks that failed.");
        describe_gauge!("sentinel_last_check_ts", "Unix ts of the last check.");
    });
}

/// Result of one source check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Nothing new; no state was written.
    Unchanged,
    Changed {
        /// A single version/date, or `"from → to"` across a backlog.
        version_label: String,
        /// Novel entries joined oldest-first.
        summary: String,
        /// Marker persisted (unless dry-run) for the next cycle.
        new_watermark: String,
    },
    Failed {
        message: String,
        /// Transient failures (archive-backed sources) may be skipped by the
        /// caller; hard ones signal a real problem such as a restructured
        /// upstream page.
        transient: bool,
    },
}

struct Fetched {
    content: String,
    /// Snapshot timestamp when content came via the archive lookup; doubles
    /// as the fallback comparison key when nothing date-parseable exists.
    snapshot_ts: Option<String>,
}

pub struct Checker {
    content: Arc<dyn ContentSource>,
    store: Arc<dyn WatermarkStore>,
}

impl Checker {
    pub fn new(content: Arc<dyn ContentSource>, store: Arc<dyn WatermarkStore>) -> Self {
        Self { content, store }
    }

    /// Run one check cycle for a source. Never returns an error: failures
    /// are folded into `CheckOutcome::Failed` with the transient flag set
    /// for archive-backed sources.
    pub async fn check(&self, src: &SourceConfig, dry_run: bool) -> CheckOutcome {
        ensure_metrics_described();
        counter!("sentinel_checks_total").increment(1);
        gauge!("sentinel_last_check_ts").set(chrono::Utc::now().timestamp() as f64);

        let outcome = match self.run(src, dry_run).await {
            Ok(outcome) => outcome,
            Err(e) => CheckOutcome::Failed {
                message: format!("{e:#}"),
                transient: src.archive,
            },
        };
        match &outcome {
            CheckOutcome::Unchanged => counter!("sentinel_unchanged_total").increment(1),
            CheckOutcome::Changed { .. } => counter!("sentinel_changed_total").increment(1),
            CheckOutcome::Failed { .. } => counter!("sentinel_failed_total").increment(1),
        }
        outcome
    }

    async fn run(&self, src: &SourceConfig, dry_run: bool) -> Result<CheckOutcome> {
        let stored = self
            .store
            .read(&src.id)
            .await
            .context("read watermark")?;
        tracing::debug!(source = %src.id, stored = ?stored, "starting check");

        let fetched = self.obtain_content(src).await?;
        let entries = extract::extract_for(src, &fetched.content);
        if entries.is_empty() {
            // Archive snapshots legitimately may carry nothing date-parseable;
            // fall back to a generic update keyed by the snapshot timestamp.
            if let Some(ts) = fetched.snapshot_ts {
                return self.generic_update(src, stored.as_deref(), ts, dry_run).await;
            }
            return Err(anyhow!("no entries extracted from {}", src.url));
        }

        let outcome = match src.kind {
            SourceKind::SemverChangelog => novelty::since_by_version(&entries, stored.as_deref()),
            SourceKind::DatedPage => {
                novelty::since_by_position(&entries, stored.as_deref(), MatchField::Ident, false)
            }
            SourceKind::DatedBlog => {
                novelty::since_by_position(&entries, stored.as_deref(), MatchField::Title, true)
            }
        };

        let candidate = entries[0].marker(src.kind).to_string();
        if stored.as_deref() == Some(candidate.as_str()) {
            tracing::debug!(source = %src.id, watermark = %candidate, "no change");
            return Ok(CheckOutcome::Unchanged);
        }

        if let Some(prev) = stored.as_deref() {
            if !self.guard_exempt(src, &outcome) && !ident::is_newer(&candidate, prev, src.ident_kind())
            {
                // Most likely a flaky scrape (out-of-order DOM, secondary
                // cache serving an old page), not a real state change.
                tracing::warn!(
                    source = %src.id,
                    candidate = %candidate,
                    stored = %prev,
                    "extracted identifier not newer than watermark; keeping state"
                );
                return Ok(CheckOutcome::Unchanged);
            }
        }

        if outcome.novel.is_empty() {
            return Ok(CheckOutcome::Unchanged);
        }

        // The newest novel entry, not entries[0]: for blogs a stale featured
        // post can sit above the chronological list and must never become
        // the watermark.
        let new_watermark = outcome.novel[0].marker(src.kind).to_string();
        let version_label = version_label(&outcome.novel);
        let summary = format_summary(&outcome.novel);

        if dry_run {
            tracing::info!(source = %src.id, watermark = %new_watermark, "dry run, skipping watermark write");
        } else {
            self.store
                .write(&src.id, &new_watermark)
                .await
                .context("write watermark")?;
        }

        Ok(CheckOutcome::Changed {
            version_label,
            summary,
            new_watermark,
        })
    }

    /// Position-based matches subsume the monotonic guard. Blog sources are
    /// always exempt: their watermark is a title, which carries no order.
    fn guard_exempt(&self, src: &SourceConfig, outcome: &NoveltyOutcome) -> bool {
        match src.kind {
            SourceKind::DatedBlog => true,
            SourceKind::DatedPage => outcome.matched.by_position(),
            SourceKind::SemverChangelog => false,
        }
    }

    async fn obtain_content(&self, src: &SourceConfig) -> Result<Fetched> {
        if src.archive {
            let snap = self
                .content
                .find_latest_snapshot(&src.url)
                .await
                .context("archive lookup")?
                .ok_or_else(|| anyhow!("no archived snapshot for {}", src.url))?;
            let content = self
                .content
                .fetch(&snap.url)
                .await
                .context("fetch snapshot content")?;
            Ok(Fetched {
                content,
                snapshot_ts: Some(snap.timestamp),
            })
        } else {
            let content = self.content.fetch(&src.url).await.context("fetch page")?;
            Ok(Fetched {
                content,
                snapshot_ts: None,
            })
        }
    }

    /// Archive fallback when a snapshot has no date-parseable content: report
    /// a generic update keyed by the snapshot timestamp. Byte-wise comparison
    /// orders the 14-digit timestamps correctly.
    async fn generic_update(
        &self,
        src: &SourceConfig,
        stored: Option<&str>,
        snapshot_ts: String,
        dry_run: bool,
    ) -> Result<CheckOutcome> {
        if stored == Some(snapshot_ts.as_str()) {
            return Ok(CheckOutcome::Unchanged);
        }
        if let Some(prev) = stored {
            if !ident::is_newer(&snapshot_ts, prev, IdentKind::Date) {
                tracing::warn!(
                    source = %src.id,
                    candidate = %snapshot_ts,
                    stored = %prev,
                    "snapshot not newer than watermark; keeping state"
                );
                return Ok(CheckOutcome::Unchanged);
            }
        }
        if !dry_run {
            self.store
                .write(&src.id, &snapshot_ts)
                .await
                .context("write watermark")?;
        }
        Ok(CheckOutcome::Changed {
            version_label: snapshot_ts.clone(),
            summary: format!("Update detected (snapshot {snapshot_ts})"),
            new_watermark: snapshot_ts,
        })
    }
}

/// A single identifier, or an oldest → newest range across a backlog.
fn version_label(novel: &[Entry]) -> String {
    match novel {
        [single] => single.ident.clone(),
        [newest, .., oldest] => format!("{} → {}", oldest.ident, newest.ident),
        [] => String::new(),
    }
}

/// Human-readable change summary: novel entries joined in chronological
/// (oldest-first) order, each rendered as title, identifier, and body.
fn format_summary(novel: &[Entry]) -> String {
    novel
        .iter()
        .rev()
        .map(|e| {
            let mut block = if e.title == e.ident {
                e.ident.clone()
            } else {
                format!("{} ({})", e.title, e.ident)
            };
            if !e.body.is_empty() {
                block.push('\n');
                block.push_str(&e.body);
            }
            if let Some(link) = &e.link {
                block.push('\n');
                block.push_str(link);
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
