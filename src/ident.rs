// src/ident.rs
//
// Identifier kinds and the total order used both to rank extracted entries
// and to guard the watermark against regressions.

use std::cmp::Ordering;

use chrono::NaiveDate;
use semver::Version;

/// Which comparison rule applies to a source's identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentKind {
    /// Dotted numeric version with optional pre-release suffix (`1.2.0`,
    /// `1.0.0-beta`), ordered by semantic-version precedence.
    Version,
    /// Calendar date, either `YYYY.MM.DD` or `Month D, YYYY`, ordered by
    /// actual chronological time.
    Date,
}

/// Month-name alternation shared by the date regexes in the extractors.
pub(crate) const MONTH_NAMES: &str =
    "January|February|March|April|May|June|July|August|September|October|November|December";

/// Parse the literal `Month D, YYYY` form. Returns `None` for anything else;
/// callers fall back to byte-wise comparison in that case.
pub fn parse_month_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%B %d, %Y").ok()
}

/// Total order over two identifiers of the same kind. Never fails: if either
/// side does not parse under its kind's rule, comparison degrades to plain
/// string order (which is valid for the zero-padded `YYYY.MM.DD` form).
pub fn compare(a: &str, b: &str, kind: IdentKind) -> Ordering {
    match kind {
        IdentKind::Version => match (Version::parse(a.trim()), Version::parse(b.trim())) {
            (Ok(va), Ok(vb)) => va.cmp(&vb),
            _ => a.cmp(b),
        },
        IdentKind::Date => match (parse_month_date(a), parse_month_date(b)) {
            (Some(da), Some(db)) => da.cmp(&db),
            _ => a.cmp(b),
        },
    }
}

/// True iff `candidate` sorts strictly after `baseline` under `kind`.
pub fn is_newer(candidate: &str, baseline: &str, kind: IdentKind) -> bool {
    compare(candidate, baseline, kind) == Ordering::Greater
}
