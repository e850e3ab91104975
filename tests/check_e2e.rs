// tests/check_e2e.rs
//
// End-to-end checker scenarios against mock collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use release_sentinel::{
    check::{CheckOutcome, Checker},
    config::{DateFormat, SourceConfig, SourceKind},
    fetch::{ContentSource, SnapshotRef},
    store::WatermarkStore,
};

#[derive(Default)]
struct MockSource {
    pages: HashMap<String, String>,
    snapshot: Option<SnapshotRef>,
}

impl MockSource {
    fn with_page(url: &str, content: &str) -> Self {
        let mut pages = HashMap::new();
        pages.insert(url.to_string(), content.to_string());
        Self {
            pages,
            snapshot: None,
        }
    }
}

#[async_trait]
impl ContentSource for MockSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("no page at {url}"))
    }

    async fn find_latest_snapshot(&self, _url: &str) -> Result<Option<SnapshotRef>> {
        Ok(self.snapshot.clone())
    }
}

#[derive(Default)]
struct RecordingStore {
    state: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl RecordingStore {
    fn with(source_id: &str, ident: &str) -> Self {
        let store = Self::default();
        store
            .state
            .lock()
            .unwrap()
            .insert(source_id.to_string(), ident.to_string());
        store
    }

    fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn get(&self, source_id: &str) -> Option<String> {
        self.state.lock().unwrap().get(source_id).cloned()
    }
}

#[async_trait]
impl WatermarkStore for RecordingStore {
    async fn read(&self, source_id: &str) -> Result<Option<String>> {
        Ok(self.state.lock().unwrap().get(source_id).cloned())
    }

    async fn write(&self, source_id: &str, ident: &str) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.state
            .lock()
            .unwrap()
            .insert(source_id.to_string(), ident.to_string());
        Ok(())
    }
}

fn source(id: &str, url: &str, kind: SourceKind) -> SourceConfig {
    SourceConfig {
        id: id.to_string(),
        name: id.to_string(),
        url: url.to_string(),
        kind,
        date_format: DateFormat::Numeric,
        display_url: None,
        archive: false,
        link_pattern: None,
    }
}

const CHANGELOG: &str = "## [1.2.0]\n- X\n\n## [1.1.0]\n- Y\n\n## [1.0.0]\n- Z";

#[tokio::test]
async fn changelog_backlog_is_reported_as_a_range() {
    let src = source("tool", "https://x.test/CHANGELOG.md", SourceKind::SemverChangelog);
    let store = Arc::new(RecordingStore::with("tool", "1.0.0"));
    let checker = Checker::new(
        Arc::new(MockSource::with_page(&src.url, CHANGELOG)),
        Arc::clone(&store) as Arc<dyn WatermarkStore>,
    );

    let outcome = checker.check(&src, false).await;
    match outcome {
        CheckOutcome::Changed {
            version_label,
            summary,
            new_watermark,
        } => {
            assert_eq!(version_label, "1.1.0 → 1.2.0");
            assert!(summary.contains("X"));
            assert!(summary.contains("Y"));
            assert!(!summary.contains("Z"));
            assert_eq!(new_watermark, "1.2.0");
        }
        other => panic!("expected Changed, got {other:?}"),
    }
    assert_eq!(store.get("tool").as_deref(), Some("1.2.0"));
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn dated_page_bootstrap_reports_the_newest_entry() {
    let content = "2025.01.17\n\nFixed the widget.\n\n2025.01.03\n\nOlder notes.";
    let src = source("notes", "https://x.test/notes", SourceKind::DatedPage);
    let store = Arc::new(RecordingStore::default());
    let checker = Checker::new(
        Arc::new(MockSource::with_page(&src.url, content)),
        Arc::clone(&store) as Arc<dyn WatermarkStore>,
    );

    let outcome = checker.check(&src, false).await;
    match outcome {
        CheckOutcome::Changed {
            summary,
            new_watermark,
            ..
        } => {
            assert_eq!(new_watermark, "2025.01.17");
            assert!(summary.contains("Fixed the widget."));
            assert!(!summary.contains("Older notes."));
        }
        other => panic!("expected Changed, got {other:?}"),
    }
    assert_eq!(store.get("notes").as_deref(), Some("2025.01.17"));
}

#[tokio::test]
async fn unchanged_watermark_writes_nothing() {
    let src = source("tool", "https://x.test/CHANGELOG.md", SourceKind::SemverChangelog);
    let store = Arc::new(RecordingStore::with("tool", "1.2.0"));
    let checker = Checker::new(
        Arc::new(MockSource::with_page(&src.url, CHANGELOG)),
        Arc::clone(&store) as Arc<dyn WatermarkStore>,
    );

    assert_eq!(checker.check(&src, false).await, CheckOutcome::Unchanged);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn regression_is_treated_as_unchanged_not_an_error() {
    // Stored watermark is ahead of everything on the page, as happens when a
    // stale cached copy gets served.
    let src = source("tool", "https://x.test/CHANGELOG.md", SourceKind::SemverChangelog);
    let store = Arc::new(RecordingStore::with("tool", "2.0.0"));
    let checker = Checker::new(
        Arc::new(MockSource::with_page(&src.url, CHANGELOG)),
        Arc::clone(&store) as Arc<dyn WatermarkStore>,
    );

    assert_eq!(checker.check(&src, false).await, CheckOutcome::Unchanged);
    assert_eq!(store.get("tool").as_deref(), Some("2.0.0"));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn dry_run_reports_changes_but_persists_nothing() {
    let src = source("tool", "https://x.test/CHANGELOG.md", SourceKind::SemverChangelog);
    let store = Arc::new(RecordingStore::with("tool", "1.0.0"));
    let checker = Checker::new(
        Arc::new(MockSource::with_page(&src.url, CHANGELOG)),
        Arc::clone(&store) as Arc<dyn WatermarkStore>,
    );

    match checker.check(&src, true).await {
        CheckOutcome::Changed { new_watermark, .. } => assert_eq!(new_watermark, "1.2.0"),
        other => panic!("expected Changed, got {other:?}"),
    }
    assert_eq!(store.get("tool").as_deref(), Some("1.0.0"));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn empty_extraction_is_a_hard_failure_for_direct_sources() {
    let src = source("tool", "https://x.test/CHANGELOG.md", SourceKind::SemverChangelog);
    let store = Arc::new(RecordingStore::default());
    let checker = Checker::new(
        Arc::new(MockSource::with_page(&src.url, "nothing versioned here")),
        Arc::clone(&store) as Arc<dyn WatermarkStore>,
    );

    match checker.check(&src, false).await {
        CheckOutcome::Failed { transient, .. } => assert!(!transient),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn archive_lookup_failure_is_transient() {
    let mut src = source("blog", "https://x.test/blog", SourceKind::DatedBlog);
    src.archive = true;
    let store = Arc::new(RecordingStore::default());
    // No snapshot available and no pages at all.
    let checker = Checker::new(
        Arc::new(MockSource::default()),
        Arc::clone(&store) as Arc<dyn WatermarkStore>,
    );

    match checker.check(&src, false).await {
        CheckOutcome::Failed { transient, .. } => assert!(transient),
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn archive_snapshot_without_entries_falls_back_to_generic_update() {
    let mut src = source("blog", "https://x.test/blog", SourceKind::DatedBlog);
    src.archive = true;
    let snapshot_url = "https://archive.test/web/20250404120000/https://x.test/blog";
    let mut content_source = MockSource::with_page(snapshot_url, "<h1>Welcome</h1><p>No dates.</p>");
    content_source.snapshot = Some(SnapshotRef {
        timestamp: "20250404120000".to_string(),
        url: snapshot_url.to_string(),
    });
    let store = Arc::new(RecordingStore::with("blog", "20250101000000"));
    let checker = Checker::new(
        Arc::new(content_source),
        Arc::clone(&store) as Arc<dyn WatermarkStore>,
    );

    match checker.check(&src, false).await {
        CheckOutcome::Changed {
            version_label,
            new_watermark,
            ..
        } => {
            assert_eq!(version_label, "20250404120000");
            assert_eq!(new_watermark, "20250404120000");
        }
        other => panic!("expected Changed, got {other:?}"),
    }
    assert_eq!(store.get("blog").as_deref(), Some("20250404120000"));
}

#[tokio::test]
async fn blog_with_featured_block_reports_only_genuinely_new_posts() {
    let html = "\
        <h2>Evergreen Guide</h2><p>February 1, 2025</p>\
        <h2>Fresh News</h2><p>April 3, 2025</p>\
        <h2>Last Reported</h2><p>April 1, 2025</p>\
        <h2>Older Post</h2><p>March 1, 2025</p>";
    let src = source("blog", "https://x.test/blog", SourceKind::DatedBlog);
    let store = Arc::new(RecordingStore::with("blog", "Last Reported"));
    let checker = Checker::new(
        Arc::new(MockSource::with_page(&src.url, html)),
        Arc::clone(&store) as Arc<dyn WatermarkStore>,
    );

    match checker.check(&src, false).await {
        CheckOutcome::Changed {
            summary,
            new_watermark,
            ..
        } => {
            assert!(summary.contains("Fresh News"));
            assert!(!summary.contains("Evergreen Guide"));
            assert!(!summary.contains("Older Post"));
            // The stale featured post above the marker must never become
            // the watermark.
            assert_eq!(new_watermark, "Fresh News");
        }
        other => panic!("expected Changed, got {other:?}"),
    }
}
