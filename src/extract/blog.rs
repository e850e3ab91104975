// src/extract/blog.rs
//
// Blog index extractor. Every heading is a candidate post; it qualifies only
// if the markup between it and the next heading contains a `Month D, YYYY`
// date, which filters out navigation and menu headings. Feeds that repeat
// titles in a "featured" block above the chronological list are deduplicated
// by title, keeping the last-seen (chronologically placed) occurrence.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::Entry;
use crate::ident::MONTH_NAMES;
use crate::normalize;

static RE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h[1-6]\b[^>]*>(.*?)</h[1-6]\s*>").unwrap());

static RE_MONTH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?:{MONTH_NAMES}) \d{{1,2}}, \d{{4}}")).unwrap());

static RE_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<a\b[^>]*href\s*=\s*["']([^"']+)["']"#).unwrap());

// Archival-snapshot prefix: optional scheme+host, then /web/<timestamp>[flags]/.
static RE_ARCHIVE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:https?://[^/]+)?/web/\d{4,17}[a-z_]*/(.+)$").unwrap());

pub fn extract(raw: &str, link_pattern: Option<&Regex>) -> Vec<Entry> {
    let headings: Vec<_> = RE_HEADING.captures_iter(raw).collect();

    let mut posts = Vec::new();
    for (i, cap) in headings.iter().enumerate() {
        let whole = cap.get(0).map(|m| m.range()).unwrap_or(0..0);
        let span_end = headings
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(raw.len());
        let span = &raw[whole.end..span_end];

        let span_text = normalize::strip_tags(span);
        let Some(date) = RE_MONTH_DATE.find(&span_text) else {
            continue;
        };
        let title = cap
            .get(1)
            .map(|m| normalize::strip_tags(m.as_str()))
            .unwrap_or_default();
        if title.is_empty() {
            continue;
        }

        posts.push(Entry {
            ident: date.as_str().to_string(),
            title,
            body: normalize::html_to_text(span),
            link: link_pattern.and_then(|pat| first_matching_link(span, pat)),
        });
    }

    dedup_by_title(posts)
}

/// First link in the span whose canonical URL matches the configured
/// pattern, with any archival-snapshot prefix stripped.
fn first_matching_link(span: &str, pattern: &Regex) -> Option<String> {
    RE_HREF
        .captures_iter(span)
        .filter_map(|c| c.get(1).map(|m| canonical_url(m.as_str())))
        .find(|url| pattern.is_match(url))
}

fn canonical_url(href: &str) -> String {
    match RE_ARCHIVE_PREFIX.captures(href) {
        Some(cap) => cap[1].to_string(),
        None => href.to_string(),
    }
}

/// Keep the last-seen occurrence of each title: scan from the end, keep the
/// first hit per title, then restore original order.
fn dedup_by_title(posts: Vec<Entry>) -> Vec<Entry> {
    let mut seen = HashSet::new();
    let mut kept: Vec<Entry> = Vec::new();
    for post in posts.into_iter().rev() {
        if seen.insert(post.title.clone()) {
            kept.push(post);
        }
    }
    kept.reverse();
    kept
}
