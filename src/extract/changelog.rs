// src/extract/changelog.rs
//
// Markdown changelog extractor. A heading line with a numeric triple opens
// an entry; everything until the next such heading is its body. Changelogs
// keep the newest version at the top, so encounter order is newest-first.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Entry;

// One-or-more heading markers, optional '[', a numeric triple, optional
// free-form suffix running to ']' or end of line.
static RE_VERSION_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#+\s*\[?(\d+\.\d+\.\d+[^\]\n]*)\]?").unwrap());

pub fn extract(raw: &str) -> Vec<Entry> {
    let mut entries: Vec<Entry> = Vec::new();
    for line in raw.lines() {
        if let Some(cap) = RE_VERSION_HEADING.captures(line) {
            let ident = cap[1].trim().to_string();
            entries.push(Entry {
                title: ident.clone(),
                ident,
                body: String::new(),
                link: None,
            });
        } else if let Some(current) = entries.last_mut() {
            if !current.body.is_empty() {
                current.body.push('\n');
            }
            current.body.push_str(line);
        }
    }
    for e in &mut entries {
        e.body = e.body.trim().to_string();
    }
    entries
}
