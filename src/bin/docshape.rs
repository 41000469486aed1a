//! CLI binary for docshape.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, wires up logging, and runs one batch.

use anyhow::{Context, Result};
use clap::Parser;
use docshape::{
    run_batch, DocumentContext, EngineOptions, ExtractionConfig, ExtractionProgressCallback,
    PdfiumPageCounter, ProgressCallback, ServingEngine,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One bar over documents; the message shows the page being worked on.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} docs  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
        self.bar.reset_eta();
    }

    fn on_document_start(&self, document: &str, total_pages: usize) {
        self.bar
            .set_message(format!("{document} (0/{total_pages} pages)"));
    }

    fn on_page_complete(&self, document: &str, page_idx: usize, _records: usize) {
        self.bar
            .set_message(format!("{document} (page {})", page_idx + 1));
    }

    fn on_document_complete(&self, document: &str, pages_emitted: usize) {
        self.bar.println(format!(
            "  {} {:<40}  {}",
            green("✓"),
            document,
            dim(&format!("{pages_emitted} pages")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, document: &str, error: &str) {
        // Keep one line per document.
        let msg = match error.char_indices().nth(80) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };
        self.bar
            .println(format!("  {} {:<40}  {}", red("✗"), document, red(&msg)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize) {
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!(
                "{} {} documents extracted",
                green("✔"),
                bold(&succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {} extracted, {} failed",
                red("✘"),
                bold(&succeeded.to_string()),
                red(&failed.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Process ./source into ./output against a local serving endpoint
  docshape

  # Other folders, English OCR, no chart recognition
  docshape --source scans --output json --lang en --no-chart

  # Remote engine, long documents
  docshape --engine-url http://ocr-box:8080 --request-timeout 1800

OUTPUT LAYOUT:
  <output>/<name>/<name>.json     metadata record followed by one record per page
  <output>/<name>/imgs/...        figures cropped by the engine

ENVIRONMENT VARIABLES:
  Every flag can be set with DOCSHAPE_<FLAG>, e.g. DOCSHAPE_ENGINE_URL.
  RUST_LOG overrides the log filter.
"#;

/// Extract structured JSON from PDFs with a PP-StructureV3 layout engine.
#[derive(Parser, Debug)]
#[command(
    name = "docshape",
    version,
    about = "Extract structured per-page JSON from PDFs with a PP-StructureV3 layout engine",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing input documents.
    #[arg(long, env = "DOCSHAPE_SOURCE", default_value = "source")]
    source: PathBuf,

    /// Root directory for per-document output.
    #[arg(long, env = "DOCSHAPE_OUTPUT", default_value = "output")]
    output: PathBuf,

    /// Supported file extensions, comma separated.
    #[arg(long, env = "DOCSHAPE_EXTENSIONS", value_delimiter = ',', default_value = "pdf")]
    extensions: Vec<String>,

    /// Base URL of the PP-StructureV3 serving endpoint.
    #[arg(long, env = "DOCSHAPE_ENGINE_URL", default_value = docshape::config::DEFAULT_ENGINE_URL)]
    engine_url: String,

    /// OCR language.
    #[arg(long, env = "DOCSHAPE_LANG", default_value = "id")]
    lang: String,

    /// Enable document orientation classification.
    #[arg(long, env = "DOCSHAPE_DOC_ORIENTATION")]
    doc_orientation: bool,

    /// Enable document unwarping.
    #[arg(long, env = "DOCSHAPE_DOC_UNWARPING")]
    doc_unwarping: bool,

    /// Enable text-line orientation classification.
    #[arg(long, env = "DOCSHAPE_TEXTLINE_ORIENTATION")]
    textline_orientation: bool,

    /// Disable chart recognition.
    #[arg(long, env = "DOCSHAPE_NO_CHART")]
    no_chart: bool,

    /// Disable formula recognition.
    #[arg(long, env = "DOCSHAPE_NO_FORMULA")]
    no_formula: bool,

    /// Disable table recognition.
    #[arg(long, env = "DOCSHAPE_NO_TABLE")]
    no_table: bool,

    /// Disable region detection.
    #[arg(long, env = "DOCSHAPE_NO_REGION_DETECTION")]
    no_region_detection: bool,

    /// Text-detection unclip ratio.
    #[arg(long, env = "DOCSHAPE_UNCLIP_RATIO", default_value_t = 1.6)]
    unclip_ratio: f32,

    /// Per-document engine request timeout in seconds.
    #[arg(long, env = "DOCSHAPE_REQUEST_TIMEOUT", default_value_t = 600)]
    request_timeout: u64,

    /// Append logs to this file; `-` disables file logging.
    #[arg(long, env = "DOCSHAPE_LOG_FILE", default_value = "extract_text.log")]
    log_file: String,

    /// Directory containing the pdfium shared library.
    #[arg(long, env = "DOCSHAPE_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Disable progress bar.
    #[arg(long, env = "DOCSHAPE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCSHAPE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCSHAPE_QUIET")]
    quiet: bool,
}

/// Dependencies that log too much below `error`.
const QUIET_DEPS: &str = "reqwest=error,hyper=error,hyper_util=error,pdfium_render=error";

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},{QUIET_DEPS}")))
}

/// stderr plus an optional append-only log file.
fn init_logging(cli: &Cli, show_progress: bool) -> Result<()> {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    // The bar provides the feedback; only errors go to stderr under it.
    let stderr_level = if show_progress && !cli.verbose { "error" } else { level };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(filter(stderr_level));

    let file_layer = if cli.log_file == "-" {
        None
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&cli.log_file)
            .with_context(|| format!("Failed to open log file {}", cli.log_file))?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_filter(filter(if cli.verbose { "debug" } else { "info" })),
        )
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let engine = EngineOptions {
        use_doc_orientation_classify: cli.doc_orientation,
        use_doc_unwarping: cli.doc_unwarping,
        use_textline_orientation: cli.textline_orientation,
        use_chart_recognition: !cli.no_chart,
        use_formula_recognition: !cli.no_formula,
        use_table_recognition: !cli.no_table,
        use_region_detection: !cli.no_region_detection,
        lang: cli.lang.clone(),
        text_det_unclip_ratio: cli.unclip_ratio,
    };

    let mut builder = ExtractionConfig::builder()
        .source_dir(&cli.source)
        .output_dir(&cli.output)
        .extensions(cli.extensions.iter())
        .engine_url(&cli.engine_url)
        .request_timeout_secs(cli.request_timeout)
        .engine(engine);

    if let Some(ref dir) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let show_progress = !cli.quiet && !cli.no_progress;
    init_logging(&cli, show_progress)?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    tracing::debug!("{:?}", config);

    let engine = ServingEngine::from_config(&config).context("Failed to set up layout engine")?;
    let counter = PdfiumPageCounter::new(config.pdfium_lib_path.clone());
    let ctx = DocumentContext::from_config(&config, Arc::new(engine), Arc::new(counter));

    let report = run_batch(&config, &ctx).await.context("Batch failed")?;

    if !cli.quiet && !show_progress {
        eprintln!(
            "Extracted {}/{} documents into {}",
            report.succeeded.len(),
            report.total(),
            config.output_dir.display()
        );
        for failed in &report.failed {
            eprintln!("  {} {}: {}", red("✗"), failed.path.display(), failed.error);
        }
    }

    Ok(())
}
