//! The layout-engine boundary.
//!
//! Page layout and OCR are done by an external document-understanding engine
//! (PP-StructureV3). The pipeline never talks to it directly: it consumes a
//! [`LayoutEngine`], which turns a document path into a lazy, forward-only
//! [`PageStream`] of [`EnginePage`]s. Each page is an ordered list of
//! [`Region`]s exactly as the engine reported them.
//!
//! [`http::ServingEngine`] is the production implementation; tests substitute
//! an in-memory engine.

pub mod http;

use crate::error::EngineError;
use image::DynamicImage;
use std::fmt;
use std::path::Path;
use std::pin::Pin;
use tokio_stream::Stream;

/// Classification label of a recognised region.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegionLabel {
    Text,
    ParagraphTitle,
    DocTitle,
    Header,
    FigureTitle,
    Caption,
    Table,
    Image,
    Formula,
    /// Any label the pipeline does not handle; the raw label is kept for logs.
    Other(String),
}

impl RegionLabel {
    /// Map an engine label string. Matching is exact.
    pub fn parse(label: &str) -> Self {
        match label {
            "text" => RegionLabel::Text,
            "paragraph_title" => RegionLabel::ParagraphTitle,
            "doc_title" => RegionLabel::DocTitle,
            "header" => RegionLabel::Header,
            "figure_title" => RegionLabel::FigureTitle,
            "caption" => RegionLabel::Caption,
            "table" => RegionLabel::Table,
            "image" => RegionLabel::Image,
            "formula" => RegionLabel::Formula,
            other => RegionLabel::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RegionLabel::Text => "text",
            RegionLabel::ParagraphTitle => "paragraph_title",
            RegionLabel::DocTitle => "doc_title",
            RegionLabel::Header => "header",
            RegionLabel::FigureTitle => "figure_title",
            RegionLabel::Caption => "caption",
            RegionLabel::Table => "table",
            RegionLabel::Image => "image",
            RegionLabel::Formula => "formula",
            RegionLabel::Other(raw) => raw,
        }
    }
}

impl From<&str> for RegionLabel {
    fn from(label: &str) -> Self {
        RegionLabel::parse(label)
    }
}

impl fmt::Display for RegionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raster attached to an image region.
#[derive(Debug, Clone)]
pub struct RegionImage {
    /// Suggested storage path, relative to the document's output directory.
    pub path: Option<String>,
    pub raster: DynamicImage,
}

/// One recognised structural element on a page.
#[derive(Debug, Clone)]
pub struct Region {
    pub label: RegionLabel,
    /// Plain text, LaTeX or table HTML depending on `label`.
    pub content: String,
    /// Present only for image regions.
    pub image: Option<RegionImage>,
}

impl Region {
    pub fn new(label: impl Into<RegionLabel>, content: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: content.into(),
            image: None,
        }
    }

    /// An image region carrying a raster and an optional suggested path.
    pub fn image(path: Option<String>, raster: DynamicImage) -> Self {
        Self {
            label: RegionLabel::Image,
            content: String::new(),
            image: Some(RegionImage { path, raster }),
        }
    }
}

/// One page of engine output.
#[derive(Debug, Clone)]
pub struct EnginePage {
    /// 0-based page index, if the engine reported one.
    pub page_index: Option<usize>,
    pub regions: Vec<Region>,
}

/// A lazy, finite, non-restartable stream of engine pages.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<EnginePage, EngineError>> + Send>>;

/// A document-understanding engine.
///
/// `predict` must not do any work up front: the returned stream performs the
/// analysis as it is polled, and an `Err` item ends the document.
pub trait LayoutEngine: Send + Sync {
    fn predict(&self, document: &Path) -> PageStream;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_labels_round_trip() {
        for label in [
            "text",
            "paragraph_title",
            "doc_title",
            "header",
            "figure_title",
            "caption",
            "table",
            "image",
            "formula",
        ] {
            let parsed = RegionLabel::parse(label);
            assert!(!matches!(parsed, RegionLabel::Other(_)), "{label}");
            assert_eq!(parsed.as_str(), label);
        }
    }

    #[test]
    fn unknown_label_keeps_raw_value() {
        let label = RegionLabel::parse("footer");
        assert_eq!(label, RegionLabel::Other("footer".into()));
        assert_eq!(label.to_string(), "footer");
    }

    #[test]
    fn labels_are_case_sensitive() {
        assert!(matches!(RegionLabel::parse("Text"), RegionLabel::Other(_)));
    }
}
