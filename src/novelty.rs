// src/novelty.rs
//
// Decides which entries are new relative to the stored watermark. Two
// shapes: order-based for version identifiers, position-based (with an
// optional calendar-date guard) for dated pages and blogs.

use crate::extract::Entry;
use crate::ident::{self, IdentKind};

/// Where the stored marker was found in the freshly extracted list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerMatch {
    /// No stored marker yet (first run).
    Bootstrap,
    /// Marker is the newest entry; nothing new.
    Newest,
    /// Marker found below the top; entries above it are candidates.
    Interior(usize),
    /// Marker text no longer present (feed restructured or entry removed).
    Missing,
}

impl MarkerMatch {
    /// True when newness was established by locating the marker in the list.
    /// For those outcomes the caller's monotonic guard is subsumed.
    pub fn by_position(self) -> bool {
        matches!(self, MarkerMatch::Newest | MarkerMatch::Interior(_))
    }
}

/// Which entry field the stored marker is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    /// Blog sources persist and match the post title.
    Title,
    /// Dated pages persist and match the date identifier.
    Ident,
}

#[derive(Debug, Clone)]
pub struct NoveltyOutcome {
    /// New entries, preserving newest-first page order.
    pub novel: Vec<Entry>,
    pub matched: MarkerMatch,
}

/// Version-ordered novelty: everything strictly newer than the stored
/// identifier. Without a stored identifier, only the newest entry is
/// reported; history is never replayed on first run.
pub fn since_by_version(entries: &[Entry], stored: Option<&str>) -> NoveltyOutcome {
    let Some(stored) = stored else {
        return bootstrap(entries);
    };
    let novel = entries
        .iter()
        .filter(|e| ident::is_newer(&e.ident, stored, IdentKind::Version))
        .cloned()
        .collect();
    let matched = match entries.iter().position(|e| e.ident == stored) {
        Some(0) => MarkerMatch::Newest,
        Some(k) => MarkerMatch::Interior(k),
        None => MarkerMatch::Missing,
    };
    NoveltyOutcome { novel, matched }
}

/// Position-based novelty: locate the stored marker by exact identity and
/// take everything above it. With `date_guard`, candidates must also carry a
/// calendar date strictly later than the matched entry's date, which drops
/// stale "featured" posts sitting above the marker in scan order. A marker
/// that is missing from the list yields only the newest entry, bounding
/// false-positive volume when a feed is restructured.
pub fn since_by_position(
    entries: &[Entry],
    stored: Option<&str>,
    field: MatchField,
    date_guard: bool,
) -> NoveltyOutcome {
    let Some(stored) = stored else {
        return bootstrap(entries);
    };
    fn key(e: &Entry, field: MatchField) -> &str {
        match field {
            MatchField::Title => e.title.as_str(),
            MatchField::Ident => e.ident.as_str(),
        }
    }
    match entries.iter().position(|e| key(e, field) == stored) {
        Some(0) => NoveltyOutcome {
            novel: Vec::new(),
            matched: MarkerMatch::Newest,
        },
        Some(k) => {
            let mut novel: Vec<Entry> = entries[..k].to_vec();
            if date_guard {
                // An unparseable matched date skips the filter entirely.
                if let Some(baseline) = ident::parse_month_date(&entries[k].ident) {
                    novel.retain(|e| {
                        ident::parse_month_date(&e.ident).is_some_and(|d| d > baseline)
                    });
                }
            }
            NoveltyOutcome {
                novel,
                matched: MarkerMatch::Interior(k),
            }
        }
        None => NoveltyOutcome {
            novel: entries.first().cloned().into_iter().collect(),
            matched: MarkerMatch::Missing,
        },
    }
}

fn bootstrap(entries: &[Entry]) -> NoveltyOutcome {
    NoveltyOutcome {
        novel: entries.first().cloned().into_iter().collect(),
        matched: MarkerMatch::Bootstrap,
    }
}
