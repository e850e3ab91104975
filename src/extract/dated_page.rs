// src/extract/dated_page.rs
//
// Extractor for release-notes pages structured by dates. Anchors are dates
// at the start of a line in the normalized text; matching mid-line would pick
// up incidental date mentions inside bodies. The text between consecutive
// anchors is one section, and its first non-empty paragraph is the title.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Entry;
use crate::config::DateFormat;
use crate::ident::MONTH_NAMES;
use crate::normalize;

static RE_NUMERIC_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\d{4}\.\d{2}\.\d{2}").unwrap());

static RE_MONTH_DATE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?m)^(?:{MONTH_NAMES}) \d{{1,2}}, \d{{4}}")).unwrap()
});

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub fn extract(raw: &str, format: DateFormat) -> Vec<Entry> {
    let text = normalize::html_to_text(raw);
    let re = match format {
        DateFormat::Numeric => &*RE_NUMERIC_DATE,
        DateFormat::MonthName => &*RE_MONTH_DATE_LINE,
    };

    let anchors: Vec<_> = re.find_iter(&text).collect();
    let mut entries = Vec::with_capacity(anchors.len());
    for (i, anchor) in anchors.iter().enumerate() {
        let section_end = anchors
            .get(i + 1)
            .map(|next| next.start())
            .unwrap_or(text.len());
        let section = &text[anchor.end()..section_end];
        entries.push(Entry {
            ident: anchor.as_str().to_string(),
            title: section_title(section),
            body: section.trim().to_string(),
            link: None,
        });
    }
    entries
}

/// First non-empty paragraph of a section, with any leading colon prefix
/// ("Feb 3: We fixed...") stripped and line breaks collapsed to spaces.
fn section_title(section: &str) -> String {
    for para in section.split("\n\n") {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }
        let trimmed = trimmed
            .strip_prefix(':')
            .map(str::trim_start)
            .unwrap_or(trimmed);
        return RE_WS.replace_all(trimmed, " ").into_owned();
    }
    String::new()
}
