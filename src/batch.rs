//! Batch runner: every supported file in the source directory, one after
//! another.
//!
//! A failing document is recorded in the [`BatchReport`] and the batch moves
//! on. Only a missing source directory fails the batch as a whole.

use crate::config::ExtractionConfig;
use crate::document::{process_document, DocumentContext};
use crate::error::ExtractError;
use crate::output::{BatchReport, FailedDocument};
use std::path::PathBuf;
use tokio_stream::wrappers::ReadDirStream;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};

/// Process every supported document under `config.source_dir`.
pub async fn run_batch(
    config: &ExtractionConfig,
    ctx: &DocumentContext,
) -> Result<BatchReport, ExtractError> {
    let documents = list_documents(config).await.inspect_err(|e| error!("{}", e))?;

    info!(
        "Found {} document(s) in {}",
        documents.len(),
        config.source_dir.display()
    );
    if let Some(ref cb) = ctx.progress {
        cb.on_batch_start(documents.len());
    }

    let mut report = BatchReport::default();
    for path in documents {
        match process_document(&path, &config.output_dir, ctx).await {
            Ok(summary) => report.succeeded.push(summary),
            Err(e) => report.failed.push(FailedDocument {
                path,
                error: e.to_string(),
            }),
        }
    }

    info!(
        "Batch finished: {} succeeded, {} failed",
        report.succeeded.len(),
        report.failed.len()
    );
    if let Some(ref cb) = ctx.progress {
        cb.on_batch_complete(report.succeeded.len(), report.failed.len());
    }

    Ok(report)
}

/// Regular files with a supported extension, sorted by file name.
pub async fn list_documents(config: &ExtractionConfig) -> Result<Vec<PathBuf>, ExtractError> {
    let source = &config.source_dir;
    let not_found = || ExtractError::SourceDirNotFound {
        path: source.to_path_buf(),
    };

    if !source.is_dir() {
        return Err(not_found());
    }
    let read_dir = tokio::fs::read_dir(source).await.map_err(|_| not_found())?;
    let mut entries = ReadDirStream::new(read_dir);

    let mut documents = Vec::new();
    while let Some(entry) = entries.next().await {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", source.display(), e);
                continue;
            }
        };

        let path = entry.path();
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false)
            || path.is_file();
        if is_file && config.is_supported(&path) {
            documents.push(path);
        }
    }

    documents.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(source: &std::path::Path) -> ExtractionConfig {
        ExtractionConfig::builder()
            .source_dir(source)
            .output_dir(source.join("out"))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn lists_supported_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.txt", "b.PDF", "a.pdf", "noext"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("folder.pdf")).unwrap();

        let docs = list_documents(&config(dir.path())).await.unwrap();
        let names: Vec<_> = docs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.pdf", "b.PDF"]);
    }

    #[tokio::test]
    async fn missing_source_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_documents(&config(&dir.path().join("absent")))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::SourceDirNotFound { .. }));
    }
}
