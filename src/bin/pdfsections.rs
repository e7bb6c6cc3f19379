//! CLI binary for edgequake-pdfsections.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints the JSON result.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdfsections::extract::write_json_atomic;
use edgequake_pdfsections::{
    discover_tessdata_dir, ExtractionConfig, ExtractionProgressCallback, Extractor, OcrEngineMode,
    PageKind, PageSelection, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the page in flight (pages run one at a time).
    page_started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_extraction_start` tells us the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }

    fn page_elapsed_secs(&self) -> f64 {
        self.page_started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting sections from {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut started) = self.page_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, kind: PageKind, sections: usize) {
        let kind = match kind {
            PageKind::Native => "native",
            PageKind::Scanned => "ocr",
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<6}  {:<12}  {}",
            green("✓"),
            page_num,
            total,
            kind,
            dim(&format!("{sections:>3} sections")),
            dim(&format!("{:.1}s", self.page_elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(['…']).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            yellow("∅"),
            page_num,
            total,
            yellow(&msg),
            dim(&format!("{:.1}s", self.page_elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, total_pages: usize, with_content: usize) {
        self.bar.finish_and_clear();
        let skipped = self.errors.load(Ordering::SeqCst);

        if skipped == 0 {
            eprintln!(
                "{} {} of {} pages contributed sections",
                green("✔"),
                bold(&with_content.to_string()),
                total_pages
            );
        } else {
            eprintln!(
                "{} {}/{} pages contributed sections  ({} skipped)",
                if with_content == 0 { red("✘") } else { cyan("⚠") },
                bold(&with_content.to_string()),
                total_pages,
                red(&skipped.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Sections as JSON on stdout
  pdfsections document.pdf

  # Pretty JSON to a file
  pdfsections document.pdf --pretty -o sections.json

  # Specific pages
  pdfsections --pages 1-5 paper.pdf

  # Scanned French document
  pdfsections --lang fra scan.pdf

  # Full report (per-page kind, errors, timings)
  pdfsections --report document.pdf

  # From a URL
  pdfsections https://arxiv.org/pdf/1706.03762

OUTPUT:
  { "title": "document.pdf", "meta": { "pages": 3 },
    "sections": [ { "heading": "Introduction", "text": "..." } ] }

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  TESSDATA_PREFIX         Tesseract language-data directory
  PDFSECTIONS_*           Fallback for every flag (see --help)
  RUST_LOG                Overrides the log filter

REQUIREMENTS:
  libpdfium must be installed. Scanned pages need tesseract with the
  language data for --lang; without it they are skipped, not fatal.
"#;

/// Extract ordered heading/body sections from PDF files and URLs.
#[derive(Parser, Debug)]
#[command(
    name = "pdfsections",
    version,
    about = "Extract ordered heading/body sections from PDF files and URLs",
    long_about = "Extract the logical structure of a PDF as an ordered list of \
(heading, body) sections. Pages with selectable text use layout analysis and font \
sizes; scanned pages fall back to tesseract OCR and line-shape heuristics.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long, env = "PDFSECTIONS_OUTPUT")]
    output: Option<PathBuf>,

    /// Pretty-print the JSON.
    #[arg(long, env = "PDFSECTIONS_PRETTY")]
    pretty: bool,

    /// Emit the full report (result + per-page reports + stats).
    #[arg(long, env = "PDFSECTIONS_REPORT")]
    report: bool,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDFSECTIONS_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFSECTIONS_PASSWORD")]
    password: Option<String>,

    /// Tesseract language code(s), e.g. eng or eng+fra.
    #[arg(long, env = "PDFSECTIONS_LANG", default_value = "eng")]
    lang: String,

    /// Tesseract engine mode.
    #[arg(long, env = "PDFSECTIONS_OEM", value_enum, default_value = "default")]
    oem: OemArg,

    /// Tesseract language-data directory (auto-detected if omitted).
    #[arg(long, env = "PDFSECTIONS_TESSDATA")]
    tessdata_dir: Option<PathBuf>,

    /// tesseract executable.
    #[arg(long, env = "PDFSECTIONS_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,

    /// Skip OCR: pages without native text contribute nothing.
    #[arg(long, env = "PDFSECTIONS_NO_OCR")]
    no_ocr: bool,

    /// Path to libpdfium (file or directory). Default: system library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Rasterisation scale for OCR (0.5–6.0).
    #[arg(long, env = "PDFSECTIONS_SCALE", default_value_t = 1.5)]
    scale: f32,

    /// Heading threshold as a multiple of the page's mean font size.
    #[arg(long, env = "PDFSECTIONS_HEADING_RATIO", default_value_t = 1.2)]
    heading_ratio: f32,

    /// Disable progress bar.
    #[arg(long, env = "PDFSECTIONS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFSECTIONS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFSECTIONS_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFSECTIONS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OemArg {
    Legacy,
    Lstm,
    LegacyLstm,
    Default,
}

impl From<OemArg> for OcrEngineMode {
    fn from(v: OemArg) -> Self {
        match v {
            OemArg::Legacy => OcrEngineMode::LegacyOnly,
            OemArg::Lstm => OcrEngineMode::LstmOnly,
            OemArg::LegacyLstm => OcrEngineMode::LegacyAndLstm,
            OemArg::Default => OcrEngineMode::Default,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless --verbose is given.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let extractor = Extractor::new(config);

    // ── Run extraction ───────────────────────────────────────────────────
    let output = extractor
        .extract_file(&cli.input)
        .await
        .context("Extraction failed")?;

    if let Some(ref output_path) = cli.output {
        let written = if cli.report {
            write_json_atomic(output_path, &output, cli.pretty).await
        } else {
            write_json_atomic(output_path, &output.result, cli.pretty).await
        };
        written.context("Failed to write output")?;
    } else {
        let json = if cli.report {
            to_json(&output, cli.pretty)?
        } else {
            output
                .result
                .to_json(cli.pretty)
                .context("Failed to serialise output")?
        };
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
    }

    // ── Summary ──────────────────────────────────────────────────────────
    if !cli.quiet {
        let stats = &output.stats;
        let target = cli
            .output
            .as_ref()
            .map(|p| format!("  →  {}", bold(&p.display().to_string())))
            .unwrap_or_default();
        eprintln!(
            "{}  {} sections  {}/{} pages ({} native, {} ocr)  {}ms{}",
            if stats.failed_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            output.result.sections.len(),
            stats.processed_pages,
            stats.total_pages,
            stats.native_pages,
            stats.scanned_pages,
            stats.total_duration_ms,
            target,
        );
    }

    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("Failed to serialise output")
}

/// Map CLI args to `ExtractionConfig`.
///
/// Language-data discovery happens here, once per process.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let pages = parse_pages(&cli.pages)?;

    let mut builder = ExtractionConfig::builder()
        .raster_scale(cli.scale)
        .heading_font_ratio(cli.heading_ratio)
        .ocr_language(cli.lang.clone())
        .ocr_engine_mode(cli.oem.clone().into())
        .tesseract_command(cli.tesseract.clone())
        .ocr_enabled(!cli.no_ocr)
        .pages(pages)
        .download_timeout_secs(cli.download_timeout);

    if let Some(dir) = cli.tessdata_dir.clone().or_else(discover_tessdata_dir) {
        builder = builder.tessdata_dir(dir);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(lib.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }
        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }
        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }
    Ok(PageSelection::Single(page))
}
