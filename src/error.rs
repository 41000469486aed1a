//! Error types for the docshape library.
//!
//! Errors are split by the scope they are allowed to abort:
//!
//! * [`ExtractError`] — **Fatal for one document** (or, for
//!   [`ExtractError::SourceDirNotFound`], for the whole batch). Returned as
//!   `Err(ExtractError)` from [`crate::document::process_document`] and
//!   [`crate::batch::run_batch`].
//!
//! * [`EngineError`] — the layout engine failed while producing pages. It is
//!   wrapped into [`ExtractError::Engine`] and discards the document's output.
//!
//! * [`RegionError`] — **Non-fatal**: a single region could not be turned into
//!   a content record (broken table markup, image write failure). It is logged
//!   and the page carries on with its other regions.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort processing of a document or a batch.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The batch source directory does not exist.
    #[error("Source directory not found: '{path}'")]
    SourceDirNotFound { path: PathBuf },

    /// The document was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the document.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    // ── Engine / PDF errors ──────────────────────────────────────────────
    /// The layout engine failed while producing the page stream.
    #[error("Layout engine failed on '{path}': {source}")]
    Engine {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    /// The PDF could not be opened to read its page count.
    #[error("Failed to read PDF metadata of '{path}': {detail}")]
    PdfMetadata { path: PathBuf, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the output directory or write the JSON file.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document record could not be serialised.
    #[error("Failed to serialise document record: {0}")]
    Serialize(#[from] serde_json::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures reported by a [`crate::engine::LayoutEngine`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request never produced a response (connect error, timeout …).
    #[error("request to layout service failed: {0}")]
    Request(String),

    /// The service answered with a non-success HTTP status.
    #[error("layout service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered 200 but reported an error in its envelope.
    #[error("layout service error {code}: {message}")]
    Service { code: i64, message: String },

    /// The response body did not have the expected shape.
    #[error("could not decode layout result: {0}")]
    Decode(String),

    /// The input document could not be read before sending it to the engine.
    #[error("could not read input document: {0}")]
    Input(String),
}

/// The table markup of a region could not be turned into rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableParseError {
    /// Nothing to parse.
    #[error("table markup is empty")]
    Empty,

    /// The markup has no `<table>` element.
    #[error("no <table> element found")]
    NoTable,
}

/// A single region could not be converted. Never aborts the page.
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("table parse failed: {0}")]
    Table(#[from] TableParseError),

    #[error("failed to save image '{path}': {detail}")]
    ImageWrite { path: PathBuf, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_dir_display() {
        let e = ExtractError::SourceDirNotFound {
            path: PathBuf::from("source"),
        };
        assert!(e.to_string().contains("'source'"), "got: {e}");
    }

    #[test]
    fn engine_error_wraps_source() {
        let e = ExtractError::Engine {
            path: PathBuf::from("a.pdf"),
            source: EngineError::Status {
                status: 503,
                body: "busy".into(),
            },
        };
        let msg = e.to_string();
        assert!(msg.contains("a.pdf"));
        assert!(msg.contains("503"));
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn region_error_from_table_error() {
        let e: RegionError = TableParseError::NoTable.into();
        assert!(e.to_string().contains("<table>"));
    }

    #[test]
    fn image_write_display() {
        let e = RegionError::ImageWrite {
            path: PathBuf::from("out/imgs/a.jpg"),
            detail: "disk full".into(),
        };
        assert!(e.to_string().contains("disk full"));
    }
}
