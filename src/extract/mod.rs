// src/extract/mod.rs
pub mod blog;
pub mod changelog;
pub mod dated_page;

use crate::config::{SourceConfig, SourceKind};

/// One discovered unit of content, in page order (newest first by the
/// conventions of the monitored sources).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Comparison key and watermark candidate: a version string or a date.
    pub ident: String,
    /// Heading or first-paragraph title.
    pub title: String,
    /// Accumulated section text.
    pub body: String,
    /// Canonical article link, when the extractor found one.
    pub link: Option<String>,
}

impl Entry {
    /// The string persisted as the watermark and used for identity matching.
    /// Blog sources match and persist by title; everything else by identifier.
    pub fn marker(&self, kind: SourceKind) -> &str {
        match kind {
            SourceKind::DatedBlog => &self.title,
            _ => &self.ident,
        }
    }
}

/// Run the extractor matching the source's kind. An empty result means the
/// content had no parseable entries; the checker decides whether that is a
/// hard failure or the archive fallback applies.
pub fn extract_for(src: &SourceConfig, raw: &str) -> Vec<Entry> {
    match src.kind {
        SourceKind::SemverChangelog => changelog::extract(raw),
        SourceKind::DatedPage => dated_page::extract(raw, src.date_format),
        SourceKind::DatedBlog => blog::extract(raw, src.link_regex().as_ref()),
    }
}
