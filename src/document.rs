//! One document end-to-end: check the file, read its metadata, drive the
//! engine's page stream through [`crate::pipeline::page`], and write
//! `<output_root>/<name>/<name>.json`.

use crate::config::ExtractionConfig;
use crate::engine::LayoutEngine;
use crate::error::ExtractError;
use crate::output::{DocumentRecord, DocumentSummary};
use crate::pipeline::{metadata, page};
use crate::pipeline::metadata::PageCounter;
use crate::progress::ProgressCallback;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// The collaborators a document run needs.
///
/// Cloning is cheap; everything is behind an `Arc`.
#[derive(Clone)]
pub struct DocumentContext {
    pub engine: Arc<dyn LayoutEngine>,
    pub page_counter: Arc<dyn PageCounter>,
    pub progress: Option<ProgressCallback>,
}

impl DocumentContext {
    pub fn new(engine: Arc<dyn LayoutEngine>, page_counter: Arc<dyn PageCounter>) -> Self {
        Self {
            engine,
            page_counter,
            progress: None,
        }
    }

    /// Take the progress callback configured on `config`, if any.
    pub fn from_config(
        config: &ExtractionConfig,
        engine: Arc<dyn LayoutEngine>,
        page_counter: Arc<dyn PageCounter>,
    ) -> Self {
        Self {
            engine,
            page_counter,
            progress: config.progress_callback.clone(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl std::fmt::Debug for DocumentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentContext")
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish_non_exhaustive()
    }
}

/// Process one document.
///
/// Any failure is logged at `error` level before it is returned; nothing is
/// written for a failed document except images already persisted.
pub async fn process_document(
    path: &Path,
    output_root: &Path,
    ctx: &DocumentContext,
) -> Result<DocumentSummary, ExtractError> {
    let name = document_name(path);

    match run(path, &name, output_root, ctx).await {
        Ok(summary) => {
            info!(
                "Saved {} ({} of {} pages, {} records)",
                summary.json_path.display(),
                summary.pages_emitted,
                summary.pages_seen,
                summary.records
            );
            if let Some(ref cb) = ctx.progress {
                cb.on_document_complete(&name, summary.pages_emitted);
            }
            Ok(summary)
        }
        Err(e) => {
            error!("Failed to process {}: {}", path.display(), e);
            if let Some(ref cb) = ctx.progress {
                cb.on_document_error(&name, &e.to_string());
            }
            Err(e)
        }
    }
}

async fn run(
    path: &Path,
    name: &str,
    output_root: &Path,
    ctx: &DocumentContext,
) -> Result<DocumentSummary, ExtractError> {
    check_readable(path)?;

    let output_dir = output_root.join(name);
    tokio::fs::create_dir_all(&output_dir)
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: output_dir.clone(),
            source: e,
        })?;

    let file_metadata = metadata::extract(path, name, Arc::clone(&ctx.page_counter)).await?;
    info!("Processing {} ({} pages)", path.display(), file_metadata.total_halaman);
    if let Some(ref cb) = ctx.progress {
        cb.on_document_start(name, file_metadata.total_halaman);
    }

    let mut document = DocumentRecord::new(file_metadata);
    let mut pages_seen = 0usize;
    let mut stream = ctx.engine.predict(path);

    while let Some(item) = stream.next().await {
        let engine_page = item.map_err(|source| ExtractError::Engine {
            path: path.to_path_buf(),
            source,
        })?;

        let page_idx = engine_page.page_index.unwrap_or(pages_seen);
        pages_seen += 1;

        let record = page::aggregate(page_idx, &engine_page.regions, &output_dir).await;
        let records = record.as_ref().map_or(0, |p| p.content.len());
        debug!("{}: page {} → {} records", name, page_idx, records);

        if let Some(ref cb) = ctx.progress {
            cb.on_page_complete(name, page_idx, records);
        }
        if let Some(record) = record {
            document.pages.push(record);
        }
    }

    let json_path = output_dir.join(format!("{}.json", name));
    let json = document.to_json_pretty()?;
    write_atomic(&json_path, json.as_bytes()).await?;

    Ok(DocumentSummary {
        name: name.to_string(),
        json_path,
        pages_seen,
        pages_emitted: document.pages.len(),
        records: document.record_count(),
    })
}

/// File stem, or the whole file name when there is no stem.
fn document_name(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn check_readable(path: &Path) -> Result<(), ExtractError> {
    if !path.is_file() {
        return Err(ExtractError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(ExtractError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(ExtractError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}

/// Write to a sibling temp file, then rename over `path`.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ExtractError> {
    let fail = |source: std::io::Error| ExtractError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let tmp_path: PathBuf = path.with_extension("json.tmp");
    if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(fail(e));
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(fail(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EnginePage, PageStream, Region};
    use crate::error::EngineError;
    use futures::stream;

    struct Scripted(Vec<Result<Vec<Region>, String>>);

    impl LayoutEngine for Scripted {
        fn predict(&self, _document: &Path) -> PageStream {
            let items: Vec<Result<EnginePage, EngineError>> = self
                .0
                .iter()
                .enumerate()
                .map(|(i, page)| match page {
                    Ok(regions) => Ok(EnginePage {
                        page_index: Some(i),
                        regions: regions.clone(),
                    }),
                    Err(msg) => Err(EngineError::Request(msg.clone())),
                })
                .collect();
            Box::pin(stream::iter(items))
        }
    }

    fn ctx(engine: Scripted) -> DocumentContext {
        let counter = |_: &Path| -> Result<usize, ExtractError> { Ok(2) };
        DocumentContext::new(Arc::new(engine), Arc::new(counter))
    }

    #[test]
    fn name_is_file_stem() {
        assert_eq!(document_name(Path::new("/src/Laporan 2023.pdf")), "Laporan 2023");
        assert_eq!(document_name(Path::new("archive.tar.PDF")), "archive.tar");
    }

    #[tokio::test]
    async fn writes_metadata_then_non_empty_pages() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let pdf = src.path().join("laporan.pdf");
        std::fs::write(&pdf, b"%PDF-1.7").unwrap();

        let engine = Scripted(vec![
            Ok(vec![Region::new("doc_title", "Laporan")]),
            Ok(vec![Region::new("footer", "2")]),
        ]);
        let summary = process_document(&pdf, out.path(), &ctx(engine)).await.unwrap();

        assert_eq!(summary.pages_seen, 2);
        assert_eq!(summary.pages_emitted, 1);
        assert_eq!(summary.json_path, out.path().join("laporan/laporan.json"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&summary.json_path).unwrap()).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["label"], "metadata_file");
        assert_eq!(entries[0]["data"]["total_halaman"], 2);
        assert_eq!(entries[1]["page_idx"], 0);
        assert_eq!(entries[1]["content"][0]["label"], "doc_title");
        assert!(!out.path().join("laporan/laporan.json.tmp").exists());
    }

    #[tokio::test]
    async fn engine_failure_writes_no_json() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let pdf = src.path().join("rusak.pdf");
        std::fs::write(&pdf, b"%PDF-1.7").unwrap();

        let engine = Scripted(vec![Ok(vec![Region::new("text", "a")]), Err("boom".into())]);
        let err = process_document(&pdf, out.path(), &ctx(engine)).await.unwrap_err();

        assert!(matches!(err, ExtractError::Engine { .. }));
        assert!(!out.path().join("rusak/rusak.json").exists());
    }

    #[tokio::test]
    async fn failed_rename_leaves_no_temp_file() {
        let out = tempfile::tempdir().unwrap();
        // A non-empty directory where the JSON should go.
        let target = out.path().join("laporan.json");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();

        let err = write_atomic(&target, b"[]").await.unwrap_err();
        assert!(matches!(err, ExtractError::OutputWriteFailed { .. }));
        assert!(!out.path().join("laporan.json.tmp").exists());
        assert!(target.join("keep").is_file());
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let out = tempfile::tempdir().unwrap();
        let err = process_document(Path::new("/nonexistent/x.pdf"), out.path(), &ctx(Scripted(vec![])))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound { .. }));
        assert!(!out.path().join("x").exists());
    }
}
