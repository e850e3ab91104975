// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod check;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod ident;
pub mod normalize;
pub mod notify;
pub mod novelty;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::check::{CheckOutcome, Checker};
pub use crate::config::{DateFormat, SourceConfig, SourceKind, WatchConfig};
pub use crate::extract::Entry;
pub use crate::fetch::{ContentSource, HttpSource, SnapshotRef};
pub use crate::ident::IdentKind;
pub use crate::notify::{ChangeNotification, Notifier, WebhookNotifier};
pub use crate::novelty::{MarkerMatch, MatchField, NoveltyOutcome};
pub use crate::store::{FileStore, MemoryStore, WatermarkStore};
