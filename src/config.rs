//! Configuration types for batch extraction.
//!
//! Everything a run needs is carried in [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. The layout-engine switches live in their own
//! [`EngineOptions`] struct because they are handed to the engine verbatim
//! and are not interpreted by the normalisation pipeline.

use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default base URL of the PP-StructureV3 serving endpoint.
pub const DEFAULT_ENGINE_URL: &str = "http://127.0.0.1:8080";

/// Extensions processed when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["pdf"];

/// Configuration for a batch run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use docshape::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .source_dir("scans")
///     .output_dir("json")
///     .extensions(["pdf", ".PDF"])
///     .build()
///     .unwrap();
/// assert_eq!(config.extensions, vec!["pdf".to_string()]);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Directory scanned for input documents. Default: `source`.
    pub source_dir: PathBuf,

    /// Root under which one directory per document is created. Default: `output`.
    pub output_dir: PathBuf,

    /// Lower-case file extensions (without the dot) that are processed.
    /// Matching is case-insensitive. Default: `["pdf"]`.
    pub extensions: Vec<String>,

    /// Base URL of the layout-parsing service. Default: [`DEFAULT_ENGINE_URL`].
    pub engine_url: String,

    /// Per-document request timeout for the layout service, in seconds. Default: 600.
    ///
    /// A whole document is analysed in one request, so this must cover the
    /// slowest expected document rather than a single page.
    pub request_timeout_secs: u64,

    /// Directory containing the pdfium shared library. If None, the system
    /// library search path is used.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Switches forwarded to the layout engine.
    pub engine: EngineOptions,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("source"),
            output_dir: PathBuf::from("output"),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            engine_url: DEFAULT_ENGINE_URL.to_string(),
            request_timeout_secs: 600,
            pdfium_lib_path: None,
            engine: EngineOptions::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("source_dir", &self.source_dir)
            .field("output_dir", &self.output_dir)
            .field("extensions", &self.extensions)
            .field("engine_url", &self.engine_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("engine", &self.engine)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether `path` has one of the configured extensions (case-insensitive).
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }
}

/// Normalise a user-supplied extension: trim, drop a leading dot, lower-case.
fn normalise_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.source_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Replace the supported extension set. Entries may carry a leading dot
    /// and any case; duplicates are removed.
    pub fn extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalised: Vec<String> = Vec::new();
        for ext in exts {
            let ext = normalise_extension(ext.as_ref());
            if !normalised.contains(&ext) {
                normalised.push(ext);
            }
        }
        self.config.extensions = normalised;
        self
    }

    pub fn engine_url(mut self, url: impl Into<String>) -> Self {
        self.config.engine_url = url.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn engine(mut self, options: EngineOptions) -> Self {
        self.config.engine = options;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.extensions.is_empty() || c.extensions.iter().any(|e| e.is_empty()) {
            return Err(ExtractError::InvalidConfig(
                "At least one non-empty file extension is required".into(),
            ));
        }
        if !c.engine_url.starts_with("http://") && !c.engine_url.starts_with("https://") {
            return Err(ExtractError::InvalidConfig(format!(
                "Engine URL must be http(s), got '{}'",
                c.engine_url
            )));
        }
        let ratio = c.engine.text_det_unclip_ratio;
        if ratio.is_nan() || ratio <= 0.0 {
            return Err(ExtractError::InvalidConfig(format!(
                "Text-detection unclip ratio must be > 0, got {}",
                c.engine.text_det_unclip_ratio
            )));
        }
        if c.engine.lang.trim().is_empty() {
            return Err(ExtractError::InvalidConfig("Language must not be empty".into()));
        }
        Ok(self.config)
    }
}

// ── Engine options ───────────────────────────────────────────────────────

/// Feature switches of the PP-StructureV3 pipeline.
///
/// Serialised in camelCase and sent with every layout-parsing request.
/// Defaults match a text-heavy Indonesian corpus: page geometry correction is
/// off, every recogniser is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOptions {
    pub use_doc_orientation_classify: bool,
    pub use_doc_unwarping: bool,
    pub use_textline_orientation: bool,
    pub use_chart_recognition: bool,
    pub use_formula_recognition: bool,
    pub use_table_recognition: bool,
    pub use_region_detection: bool,
    pub lang: String,
    pub text_det_unclip_ratio: f32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            use_doc_orientation_classify: false,
            use_doc_unwarping: false,
            use_textline_orientation: false,
            use_chart_recognition: true,
            use_formula_recognition: true,
            use_table_recognition: true,
            use_region_detection: true,
            lang: "id".to_string(),
            text_det_unclip_ratio: 1.6,
        }
    }
}
