//! Output record types: the JSON document contract.
//!
//! A document serialises to a JSON array whose first element is the
//! [`FileMetadataRecord`] and whose remaining elements are [`PageRecord`]s in
//! page order. Field names are part of the durable output format and must not
//! change.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One table row: header value → cell value, in header column order.
///
/// `None` marks a cell missing from a short row (serialised as `null`).
pub type TableRow = IndexMap<String, Option<String>>;

/// Normalised content of one region, tagged by `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "label", rename_all = "snake_case")]
pub enum Content {
    Text { text: String },
    ParagraphTitle { text: String },
    DocTitle { text: String },
    Header { text: String },
    FigureTitle { text: String },
    Caption { text: String },
    List { text: Vec<String> },
    Table { data: Vec<TableRow> },
    TableError { text: String },
    Image { img_path: String },
    Formula { formula_latex: String },
}

impl Content {
    /// The `label` value this record serialises with.
    pub fn label(&self) -> &'static str {
        match self {
            Content::Text { .. } => "text",
            Content::ParagraphTitle { .. } => "paragraph_title",
            Content::DocTitle { .. } => "doc_title",
            Content::Header { .. } => "header",
            Content::FigureTitle { .. } => "figure_title",
            Content::Caption { .. } => "caption",
            Content::List { .. } => "list",
            Content::Table { .. } => "table",
            Content::TableError { .. } => "table_error",
            Content::Image { .. } => "image",
            Content::Formula { .. } => "formula",
        }
    }
}

/// Page-level metadata attached to every content record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// 1-based page number.
    pub page_number: usize,
}

impl PageMetadata {
    pub fn for_index(page_idx: usize) -> Self {
        Self {
            page_number: page_idx + 1,
        }
    }
}

/// A content record as written to JSON: `{label, …payload, metadata}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    #[serde(flatten)]
    pub content: Content,
    pub metadata: PageMetadata,
}

/// All content kept for one page. Never empty once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page_idx: usize,
    pub content: Vec<ContentRecord>,
}

/// File-level metadata. Field names are the established output schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Document name (file stem).
    pub nama_file: String,
    /// Page count.
    pub total_halaman: usize,
    /// Size in KiB, two decimals.
    pub ukuran_kb: f64,
    /// Size in MiB, two decimals.
    pub ukuran_mb: f64,
    /// Creation time, epoch seconds.
    pub created_at: f64,
    /// Modification time, epoch seconds.
    pub modified_at: f64,
}

/// Tag type that always serialises as `"metadata_file"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MetadataFileLabel {
    #[default]
    #[serde(rename = "metadata_file")]
    MetadataFile,
}

/// `{label: "metadata_file", data: {…}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadataRecord {
    pub label: MetadataFileLabel,
    pub data: FileMetadata,
}

impl From<FileMetadata> for FileMetadataRecord {
    fn from(data: FileMetadata) -> Self {
        Self {
            label: MetadataFileLabel::MetadataFile,
            data,
        }
    }
}

/// One element of the document array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentEntry {
    Metadata(FileMetadataRecord),
    Page(PageRecord),
}

/// The full output for one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub metadata: FileMetadataRecord,
    pub pages: Vec<PageRecord>,
}

impl DocumentRecord {
    pub fn new(metadata: FileMetadata) -> Self {
        Self {
            metadata: metadata.into(),
            pages: Vec::new(),
        }
    }

    /// Number of content records across all pages.
    pub fn record_count(&self) -> usize {
        self.pages.iter().map(|p| p.content.len()).sum()
    }

    /// The ordered array that is persisted.
    pub fn entries(&self) -> Vec<DocumentEntry> {
        let mut entries = Vec::with_capacity(self.pages.len() + 1);
        entries.push(DocumentEntry::Metadata(self.metadata.clone()));
        entries.extend(self.pages.iter().cloned().map(DocumentEntry::Page));
        entries
    }

    /// Pretty-printed (two-space) UTF-8 JSON; non-ASCII is written as-is.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries())
    }
}

/// Outcome of a successfully processed document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    /// Document name (file stem).
    pub name: String,
    /// Path of the written JSON file.
    pub json_path: PathBuf,
    /// Pages yielded by the engine.
    pub pages_seen: usize,
    /// Pages that made it into the JSON (non-empty).
    pub pages_emitted: usize,
    /// Content records across all emitted pages.
    pub records: usize,
}

/// A document the batch could not process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedDocument {
    pub path: PathBuf,
    pub error: String,
}

/// Result of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<DocumentSummary>,
    pub failed: Vec<FailedDocument>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}
