//! Progress-callback trait for batch extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the batch walks documents and the engine yields pages.
//!
//! # Example
//!
//! ```rust
//! use docshape::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for PageCounter {
//!     fn on_page_complete(&self, _document: &str, page_idx: usize, records: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {} → {} records", page_idx, records);
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(PageCounter { pages: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch runner and document pipeline as work progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive sequentially from a single task, but
/// the trait is `Send + Sync` so observers can be shared with other threads.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once after the source directory has been listed.
    ///
    /// # Arguments
    /// * `total_documents` — number of supported files that will be processed
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called after a document's file metadata has been read.
    ///
    /// # Arguments
    /// * `document`    — document name (file stem)
    /// * `total_pages` — page count reported by the PDF
    fn on_document_start(&self, document: &str, total_pages: usize) {
        let _ = (document, total_pages);
    }

    /// Called after each page from the engine has been aggregated.
    ///
    /// # Arguments
    /// * `document` — document name
    /// * `page_idx` — 0-based page index
    /// * `records`  — content records kept for the page (0 = page omitted)
    fn on_page_complete(&self, document: &str, page_idx: usize, records: usize) {
        let _ = (document, page_idx, records);
    }

    /// Called when a document's JSON has been written.
    fn on_document_complete(&self, document: &str, pages_emitted: usize) {
        let _ = (document, pages_emitted);
    }

    /// Called when a document was abandoned.
    fn on_document_error(&self, document: &str, error: &str) {
        let _ = (document, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, succeeded: usize, failed: usize) {
        let _ = (succeeded, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
