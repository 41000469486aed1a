//! File-level metadata: page count from the PDF plus filesystem stat.
//!
//! Counting pages needs a PDF library; that sits behind [`PageCounter`] so the
//! pipeline can run against a stub in tests. The production counter binds
//! pdfium, which is not async-safe, so counting runs in `spawn_blocking`.

use crate::error::ExtractError;
use crate::output::FileMetadata;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Opens a document and reports how many pages it has.
pub trait PageCounter: Send + Sync {
    fn page_count(&self, path: &Path) -> Result<usize, ExtractError>;
}

impl<F> PageCounter for F
where
    F: Fn(&Path) -> Result<usize, ExtractError> + Send + Sync,
{
    fn page_count(&self, path: &Path) -> Result<usize, ExtractError> {
        self(path)
    }
}

/// Page counter backed by the pdfium library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumPageCounter {
    /// Directory holding the pdfium shared library; system search path if None.
    lib_dir: Option<PathBuf>,
}

impl PdfiumPageCounter {
    pub fn new(lib_dir: Option<PathBuf>) -> Self {
        Self { lib_dir }
    }

    fn bind(&self) -> Result<Pdfium, ExtractError> {
        let bindings = match &self.lib_dir {
            Some(dir) => Pdfium::bind_to_library(&Pdfium::pdfium_platform_library_name_at_path(dir)),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ExtractError::Internal(format!("Failed to bind to pdfium library: {e:?}")))?;

        Ok(Pdfium::new(bindings))
    }
}

impl PageCounter for PdfiumPageCounter {
    fn page_count(&self, path: &Path) -> Result<usize, ExtractError> {
        let pdfium = self.bind()?;
        let document =
            pdfium
                .load_pdf_from_file(path, None)
                .map_err(|e| ExtractError::PdfMetadata {
                    path: path.to_path_buf(),
                    detail: format!("{:?}", e),
                })?;

        let count = document.pages().len() as usize;
        debug!("{}: {} pages", path.display(), count);
        Ok(count)
    }
}

/// Read page count and stat for `path`.
pub async fn extract(
    path: &Path,
    name: &str,
    counter: Arc<dyn PageCounter>,
) -> Result<FileMetadata, ExtractError> {
    let owned = path.to_path_buf();
    let total_pages = tokio::task::spawn_blocking(move || counter.page_count(&owned))
        .await
        .map_err(|e| ExtractError::Internal(format!("Metadata task panicked: {}", e)))??;

    let stat = tokio::fs::metadata(path)
        .await
        .map_err(|e| ExtractError::PdfMetadata {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let modified = stat.modified().ok().map(epoch_secs).unwrap_or(0.0);
    // Birth time is not available on every filesystem.
    let created = stat.created().ok().map(epoch_secs).unwrap_or(modified);

    Ok(build(name, total_pages, stat.len(), created, modified))
}

/// Assemble the metadata record from raw values.
pub fn build(name: &str, total_pages: usize, size_bytes: u64, created: f64, modified: f64) -> FileMetadata {
    let size = size_bytes as f64;
    FileMetadata {
        nama_file: name.to_string(),
        total_halaman: total_pages,
        ukuran_kb: round2(size / 1024.0),
        ukuran_mb: round2(size / (1024.0 * 1024.0)),
        created_at: created,
        modified_at: modified,
    }
}

fn epoch_secs(t: SystemTime) -> f64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn sizes_are_rounded_to_two_decimals() {
        let m = build("doc", 3, 1536, 10.0, 20.0);
        assert_eq!(m.ukuran_kb, 1.5);
        assert_eq!(m.ukuran_mb, 0.0);

        let m = build("doc", 3, 5 * 1024 * 1024 + 123_456, 10.0, 20.0);
        assert_eq!(m.ukuran_mb, 5.12);
        assert_eq!(m.ukuran_kb, 5240.56);
        assert_eq!(m.total_halaman, 3);
        assert_eq!(m.nama_file, "doc");
    }

    #[test]
    fn halfway_sizes_round_to_even() {
        assert_eq!(build("d", 1, 128, 0.0, 0.0).ukuran_kb, 0.12);
        assert_eq!(build("d", 1, 640, 0.0, 0.0).ukuran_kb, 0.62);
        assert_eq!(build("d", 1, 1152, 0.0, 0.0).ukuran_kb, 1.12);
        assert_eq!(build("d", 1, 384, 0.0, 0.0).ukuran_kb, 0.38);
    }

    #[test]
    fn epoch_seconds_keep_fraction() {
        let t = UNIX_EPOCH + Duration::from_millis(1_500);
        assert_eq!(epoch_secs(t), 1.5);
    }

    #[tokio::test]
    async fn extract_uses_counter_and_stat() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("laporan.pdf");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let counter: Arc<dyn PageCounter> = Arc::new(|_: &Path| -> Result<usize, ExtractError> { Ok(7) });
        let meta = extract(&path, "laporan", counter).await.unwrap();

        assert_eq!(meta.total_halaman, 7);
        assert_eq!(meta.ukuran_kb, 2.0);
        assert!(meta.modified_at > 0.0);
        assert!(meta.created_at > 0.0);
    }

    #[tokio::test]
    async fn counter_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        let counter: Arc<dyn PageCounter> = Arc::new(|p: &Path| -> Result<usize, ExtractError> {
            Err(ExtractError::PdfMetadata {
                path: p.to_path_buf(),
                detail: "bad xref".into(),
            })
        });
        let err = extract(&path, "broken", counter).await.unwrap_err();
        assert!(matches!(err, ExtractError::PdfMetadata { .. }));
    }
}
