//! Configuration types for PDF section extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. One struct carries every knob so a
//! config can be shared across threads, logged, and diffed between runs.
//!
//! Environment probing (where tesseract keeps its language data) is *not*
//! done here per call: [`discover_tessdata_dir`] is meant to run once at
//! process start, and its answer is stored in the config.

use crate::error::ExtractError;
use crate::pipeline::ocr::OcrSettings;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// Default scale factor applied to page dimensions before OCR.
pub const DEFAULT_RASTER_SCALE: f32 = 1.5;

/// Default ratio between page mean font size and the heading threshold.
pub const DEFAULT_HEADING_FONT_RATIO: f32 = 1.2;

/// Default tesseract language code.
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";

/// Text of the placeholder section emitted when nothing was extracted.
pub const NO_CONTENT_MESSAGE: &str = "no content detected";

/// Configuration for one PDF section extraction.
///
/// # Example
/// ```rust
/// use edgequake_pdfsections::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .ocr_language("eng+fra")
///     .raster_scale(2.0)
///     .build()
///     .unwrap();
/// assert_eq!(config.ocr_language, "eng+fra");
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Scale factor applied to the page's point size when rasterising for OCR.
    /// Range: 0.5–6.0. Default: 1.5.
    pub raster_scale: f32,

    /// A native block is a heading candidate when its average font size is at
    /// least `page_mean_font_size × heading_font_ratio`. Default: 1.2.
    pub heading_font_ratio: f32,

    /// Tesseract language code, e.g. `"eng"` or `"eng+fra"`. Default: `"eng"`.
    pub ocr_language: String,

    /// Tesseract engine mode (`--oem`). Default: [`OcrEngineMode::Default`].
    pub ocr_engine_mode: OcrEngineMode,

    /// Tesseract language-data directory. `None` lets tesseract use its
    /// compiled-in default (or `TESSDATA_PREFIX`).
    pub tessdata_dir: Option<PathBuf>,

    /// Name or path of the `tesseract` executable used by the CLI engine.
    pub tesseract_command: PathBuf,

    /// Run OCR on pages without native text. Default: true.
    ///
    /// When false, scanned pages are skipped exactly as if the engine were
    /// unavailable.
    pub ocr_enabled: bool,

    /// Explicit path to libpdfium. `None` binds the system library.
    pub pdfium_library_path: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// Text of the single placeholder section emitted for empty documents.
    pub no_content_message: String,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional progress callback invoked per page.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            raster_scale: DEFAULT_RASTER_SCALE,
            heading_font_ratio: DEFAULT_HEADING_FONT_RATIO,
            ocr_language: DEFAULT_OCR_LANGUAGE.to_string(),
            ocr_engine_mode: OcrEngineMode::default(),
            tessdata_dir: None,
            tesseract_command: PathBuf::from("tesseract"),
            ocr_enabled: true,
            pdfium_library_path: None,
            password: None,
            pages: PageSelection::default(),
            no_content_message: NO_CONTENT_MESSAGE.to_string(),
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("raster_scale", &self.raster_scale)
            .field("heading_font_ratio", &self.heading_font_ratio)
            .field("ocr_language", &self.ocr_language)
            .field("ocr_engine_mode", &self.ocr_engine_mode)
            .field("tessdata_dir", &self.tessdata_dir)
            .field("tesseract_command", &self.tesseract_command)
            .field("ocr_enabled", &self.ocr_enabled)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pages", &self.pages)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
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

    /// The subset of settings handed to the OCR engine.
    pub fn ocr_settings(&self) -> OcrSettings {
        OcrSettings {
            language: self.ocr_language.clone(),
            engine_mode: self.ocr_engine_mode,
            tessdata_dir: self.tessdata_dir.clone(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl fmt::Debug for ExtractionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ExtractionConfigBuilder {
    pub fn raster_scale(mut self, scale: f32) -> Self {
        self.config.raster_scale = scale.clamp(0.5, 6.0);
        self
    }

    pub fn heading_font_ratio(mut self, ratio: f32) -> Self {
        self.config.heading_font_ratio = ratio;
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn ocr_engine_mode(mut self, mode: OcrEngineMode) -> Self {
        self.config.ocr_engine_mode = mode;
        self
    }

    pub fn tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.tessdata_dir = Some(dir.into());
        self
    }

    pub fn tesseract_command(mut self, cmd: impl Into<PathBuf>) -> Self {
        self.config.tesseract_command = cmd.into();
        self
    }

    pub fn ocr_enabled(mut self, v: bool) -> Self {
        self.config.ocr_enabled = v;
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn no_content_message(mut self, msg: impl Into<String>) -> Self {
        self.config.no_content_message = msg.into();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if !c.heading_font_ratio.is_finite() || c.heading_font_ratio <= 0.0 {
            return Err(ExtractError::InvalidConfig(format!(
                "heading font ratio must be > 0, got {}",
                c.heading_font_ratio
            )));
        }
        if c.ocr_language.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "OCR language code must not be empty".into(),
            ));
        }
        if c.no_content_message.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "no-content message must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Tesseract OCR engine mode, mapped onto `--oem`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OcrEngineMode {
    /// Legacy engine only (`--oem 0`).
    LegacyOnly,
    /// Neural-net LSTM engine only (`--oem 1`).
    LstmOnly,
    /// Legacy + LSTM (`--oem 2`).
    LegacyAndLstm,
    /// Whatever the installed language data supports (`--oem 3`). (default)
    #[default]
    Default,
}

impl OcrEngineMode {
    /// Numeric `--oem` value understood by tesseract.
    pub fn as_oem(self) -> u8 {
        match self {
            OcrEngineMode::LegacyOnly => 0,
            OcrEngineMode::LstmOnly => 1,
            OcrEngineMode::LegacyAndLstm => 2,
            OcrEngineMode::Default => 3,
        }
    }
}

/// Specifies which pages of the PDF to extract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// Extract all pages (default).
    #[default]
    All,
    /// Extract a single page (1-indexed).
    Single(usize),
    /// Extract a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Extract specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// First requested page number, used when reporting an empty selection.
    pub fn first_requested(&self) -> usize {
        match self {
            PageSelection::All => 1,
            PageSelection::Single(p) => *p,
            PageSelection::Range(start, _) => *start,
            PageSelection::Set(pages) => pages.iter().copied().min().unwrap_or(0),
        }
    }
}

// ── Language-data discovery ──────────────────────────────────────────────

/// Well-known tessdata locations for the current platform, in probe order.
pub fn tessdata_candidates() -> Vec<PathBuf> {
    let mut paths: Vec<&str> = Vec::new();
    if cfg!(target_os = "windows") {
        paths.extend([
            r"C:\Program Files\Tesseract-OCR\tessdata",
            r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
            r"C:\Tesseract-OCR\tessdata",
        ]);
    }
    if cfg!(target_os = "linux") {
        paths.extend([
            "/usr/share/tesseract-ocr/5/tessdata",
            "/usr/share/tesseract-ocr/4.00/tessdata",
            "/usr/share/tessdata",
            "/usr/local/share/tessdata",
        ]);
    }
    if cfg!(target_os = "macos") {
        paths.extend(["/opt/homebrew/share/tessdata", "/usr/local/share/tessdata"]);
    }
    paths.into_iter().map(PathBuf::from).collect()
}

/// Resolve the tesseract language-data directory.
///
/// `TESSDATA_PREFIX` wins when it names an existing directory; otherwise the
/// first existing entry of [`tessdata_candidates`] is used. Returns `None`
/// when nothing is found, leaving the choice to tesseract itself.
///
/// Call this once at start-up and store the result in
/// [`ExtractionConfig::tessdata_dir`].
pub fn discover_tessdata_dir() -> Option<PathBuf> {
    let from_env = std::env::var_os("TESSDATA_PREFIX").map(PathBuf::from);
    let found = first_existing_dir(from_env.into_iter().chain(tessdata_candidates()));
    match &found {
        Some(dir) => info!("Tesseract language data found at {}", dir.display()),
        None => debug!("No tessdata directory found; relying on tesseract defaults"),
    }
    found
}

fn first_existing_dir(candidates: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    candidates.into_iter().find(|p| p.is_dir())
}
