//! Region classification: one engine region → one normalised content value.
//!
//! The label set is closed, so this is a single `match` from
//! [`RegionLabel`] onto a [`Content`] variant. Image regions need a disk write
//! before they can produce a record and are handled by [`super::image`];
//! labels outside the handled set are dropped.

use super::{list, table};
use crate::engine::{Region, RegionLabel};
use crate::output::Content;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Collapse every whitespace run to a single space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    RE_WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Classify a region.
///
/// Returns `None` for image regions (see [`super::image::persist`]) and for
/// labels the pipeline does not handle.
pub fn classify(region: &Region) -> Option<Content> {
    let raw = region.content.trim();

    match &region.label {
        RegionLabel::Text
        | RegionLabel::ParagraphTitle
        | RegionLabel::DocTitle
        | RegionLabel::Header
        | RegionLabel::FigureTitle
        | RegionLabel::Caption => Some(classify_text(&region.label, raw)),
        RegionLabel::Table => Some(table::normalize(raw)),
        RegionLabel::Formula => Some(Content::Formula {
            formula_latex: normalize_whitespace(raw),
        }),
        RegionLabel::Image => None,
        RegionLabel::Other(label) => {
            debug!("Skipping region with unhandled label '{}'", label);
            None
        }
    }
}

/// Free text: a `list` record when list markers are present, otherwise a
/// record carrying the region's own label.
fn classify_text(label: &RegionLabel, raw: &str) -> Content {
    let text = normalize_whitespace(raw);

    let items = list::detect(&text);
    if !items.is_empty() {
        return Content::List { text: items };
    }

    match label {
        RegionLabel::ParagraphTitle => Content::ParagraphTitle { text },
        RegionLabel::DocTitle => Content::DocTitle { text },
        RegionLabel::Header => Content::Header { text },
        RegionLabel::FigureTitle => Content::FigureTitle { text },
        RegionLabel::Caption => Content::Caption { text },
        _ => Content::Text { text },
    }
}
