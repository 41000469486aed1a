//! # docshape
//!
//! Turn a folder of PDFs into structured JSON using a document-layout engine.
//!
//! The engine (PP-StructureV3 behind its HTTP serving endpoint) does the hard
//! part: it finds the regions on every page and OCRs them. This crate
//! normalises what comes back into a small, stable JSON schema: titles and
//! paragraphs as text, enumerations as lists, HTML tables as header-keyed
//! rows, figures as image files next to the JSON, formulas as LaTeX.
//!
//! ## Pipeline Overview
//!
//! ```text
//! source/*.pdf
//!  │
//!  ├─ 1. Batch     list supported files, sorted, one at a time
//!  ├─ 2. Metadata  page count (pdfium, spawn_blocking) + filesystem stat
//!  ├─ 3. Engine    lazy stream of pages, each an ordered list of regions
//!  ├─ 4. Page      classify regions / normalise tables / save images
//!  └─ 5. Output    output/<name>/<name>.json (+ images), written atomically
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docshape::{run_batch, DocumentContext, ExtractionConfig, PdfiumPageCounter, ServingEngine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .source_dir("source")
//!         .output_dir("output")
//!         .build()?;
//!     let engine = ServingEngine::from_config(&config)?;
//!     let counter = PdfiumPageCounter::new(config.pdfium_lib_path.clone());
//!     let ctx = DocumentContext::from_config(&config, Arc::new(engine), Arc::new(counter));
//!
//!     let report = run_batch(&config, &ctx).await?;
//!     eprintln!("{} ok / {} failed", report.succeeded.len(), report.failed.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docshape` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::run_batch;
pub use config::{EngineOptions, ExtractionConfig, ExtractionConfigBuilder};
pub use document::{process_document, DocumentContext};
pub use engine::http::ServingEngine;
pub use engine::{EnginePage, LayoutEngine, PageStream, Region, RegionImage, RegionLabel};
pub use error::{EngineError, ExtractError, RegionError, TableParseError};
pub use output::{
    BatchReport, Content, ContentRecord, DocumentRecord, DocumentSummary, FailedDocument,
    FileMetadata, PageMetadata, PageRecord,
};
pub use pipeline::metadata::{PageCounter, PdfiumPageCounter};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
