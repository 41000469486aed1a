//! List detection inside free-text regions.
//!
//! OCR engines report a bulleted or numbered block as one text region. This
//! stage splits such text into items at three kinds of markers:
//!
//! | Marker | Example |
//! |--------|---------|
//! | decimal number + `.` | `1. `, `12. ` |
//! | parenthesised lower-case letter | `(a) ` |
//! | dash or bullet | `- `, `• ` |
//!
//! Every marker must be followed by whitespace. An item runs from just after
//! its marker up to the next marker of any kind, or the end of the text.
//! Text before the first marker belongs to no item.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.\s|\([a-z]\)\s|[-•]\s").expect("valid list marker regex"));

/// Split `text` into list items; empty when it contains no marker.
///
/// Items are trimmed. Two adjacent markers produce an empty item.
pub fn detect(text: &str) -> Vec<String> {
    let markers: Vec<_> = RE_LIST_MARKER.find_iter(text).collect();

    markers
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let end = markers.get(i + 1).map_or(text.len(), |next| next.start());
            text[m.end()..end].trim().to_string()
        })
        .collect()
}
