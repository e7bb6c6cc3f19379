//! OCR fallback for pages without native text.
//!
//! ```text
//! PDF bytes ──▶ Rasterizer (×1.5) ──▶ temp PNG ──▶ OcrEngine ──▶ trimmed text
//!                                      (deleted on drop)
//! ```
//!
//! Two engines are provided:
//!
//! * [`TesseractCli`] (default) shells out to the `tesseract` binary and reads
//!   its TSV output, which carries both text and per-word confidence.
//! * `LeptessEngine` (feature `leptess`) links libtesseract directly.
//!
//! Everything here is blocking; the orchestrator runs it on tokio's blocking
//! pool.

use crate::config::OcrEngineMode;
use crate::error::{OcrError, PageError};
use crate::pipeline::backend::Rasterizer;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Engine parameters resolved from [`crate::config::ExtractionConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrSettings {
    /// Tesseract language code(s), `+`-separated.
    pub language: String,
    pub engine_mode: OcrEngineMode,
    /// Language-data directory; `None` uses the engine default.
    pub tessdata_dir: Option<PathBuf>,
}

/// Text recognised on one image.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrText {
    pub text: String,
    /// Mean word confidence in `0.0..=1.0`. Diagnostic only.
    pub mean_confidence: f32,
}

/// An OCR capability.
///
/// `probe` must not fail loudly: an engine that cannot start just reports
/// `false` and the caller skips scanned pages.
pub trait OcrEngine: Send + Sync {
    /// Short engine name used in logs.
    fn name(&self) -> &str;

    /// Whether the engine can run with `settings` (binary present, language
    /// data installed).
    fn probe(&self, settings: &OcrSettings) -> bool;

    /// Recognise the text of the image at `image_path`.
    fn recognize(&self, image_path: &Path, settings: &OcrSettings) -> Result<OcrText, OcrError>;
}

// ── Page-level driver ────────────────────────────────────────────────────

/// Rasterise page `page_index` (0-based) and run OCR on it.
///
/// The intermediate PNG lives in a uniquely named temp file that is removed
/// when this function returns, whatever the outcome. Engine availability is
/// the caller's concern.
pub fn recognize_page(
    document: &[u8],
    page_index: usize,
    scale: f32,
    rasterizer: &dyn Rasterizer,
    engine: &dyn OcrEngine,
    settings: &OcrSettings,
) -> Result<String, PageError> {
    let page = page_index + 1;

    let image = rasterizer
        .rasterize(document, page_index, scale)
        .map_err(|detail| PageError::RasterisationFailed { page, detail })?;
    debug!(
        "Rasterised page {} at ×{:.1} → {}x{} px",
        page,
        scale,
        image.width(),
        image.height()
    );

    let temp = tempfile::Builder::new()
        .prefix(&format!("ocr_page_{page}_"))
        .suffix(".png")
        .tempfile()
        .map_err(|e| PageError::RasterisationFailed {
            page,
            detail: format!("temp file: {e}"),
        })?;
    image
        .save_with_format(temp.path(), ImageFormat::Png)
        .map_err(|e| PageError::RasterisationFailed {
            page,
            detail: format!("PNG write: {e}"),
        })?;
    debug!("Page {} image written to {}", page, temp.path().display());

    let recognised = engine
        .recognize(temp.path(), settings)
        .map_err(|e| PageError::OcrFailed {
            page,
            detail: e.to_string(),
        })?;

    info!(
        "OCR page {} via {}: {} chars, {:.0}% confidence",
        page,
        engine.name(),
        recognised.text.trim().chars().count(),
        recognised.mean_confidence * 100.0
    );
    Ok(recognised.text.trim().to_string())
}

// ── tesseract CLI engine ─────────────────────────────────────────────────

/// OCR through the `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    command: PathBuf,
}

impl TesseractCli {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn base_command(&self, settings: &OcrSettings) -> Command {
        let mut cmd = Command::new(&self.command);
        if let Some(dir) = &settings.tessdata_dir {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl OcrEngine for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn probe(&self, settings: &OcrSettings) -> bool {
        let output = match self.base_command(settings).arg("--list-langs").output() {
            Ok(output) => output,
            Err(e) => {
                warn!("tesseract not runnable ({}): {}", self.command.display(), e);
                return false;
            }
        };
        if !output.status.success() {
            warn!(
                "tesseract --list-langs failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return false;
        }
        // Older releases print the list on stderr.
        let mut listing = String::from_utf8_lossy(&output.stdout).into_owned();
        listing.push_str(&String::from_utf8_lossy(&output.stderr));
        let available = parse_list_langs(&listing);
        let ok = languages_available(&settings.language, &available);
        if !ok {
            warn!(
                "tesseract language data for '{}' not installed (have: {})",
                settings.language,
                available.join(", ")
            );
        }
        ok
    }

    fn recognize(&self, image_path: &Path, settings: &OcrSettings) -> Result<OcrText, OcrError> {
        let output = self
            .base_command(settings)
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&settings.language)
            .arg("--oem")
            .arg(settings.engine_mode.as_oem().to_string())
            .arg("tsv")
            .output()
            .map_err(|e| OcrError::Init(format!("{}: {e}", self.command.display())))?;

        if !output.status.success() {
            return Err(OcrError::Recognition(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(parse_tsv(&String::from_utf8(output.stdout)?))
    }
}

/// Language codes from `tesseract --list-langs` output.
pub fn parse_list_langs(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("List of available languages"))
        .filter(|l| !l.contains(' '))
        .map(str::to_string)
        .collect()
}

/// Every `+`-separated code of `requested` appears in `available`.
pub fn languages_available(requested: &str, available: &[String]) -> bool {
    requested
        .split('+')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .all(|code| available.iter().any(|a| a == code))
}

/// Rebuild text and mean confidence from tesseract TSV output.
///
/// Word rows (level 5) are grouped into lines by `(page, block, par, line)`;
/// lines are joined with `\n`. Rows with negative confidence are structural
/// and ignored for the mean.
pub fn parse_tsv(tsv: &str) -> OcrText {
    let mut lines: Vec<String> = Vec::new();
    let mut current_key: Option<[u32; 4]> = None;
    let mut confidences: Vec<f32> = Vec::new();

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let word = cols[11..].join("\t");
        let word = word.trim();
        if word.is_empty() {
            continue;
        }
        let key: [u32; 4] = [cols[1], cols[2], cols[3], cols[4]].map(|c| c.parse().unwrap_or(0));
        match lines.last_mut() {
            Some(line) if current_key == Some(key) => {
                line.push(' ');
                line.push_str(word);
            }
            _ => {
                lines.push(word.to_string());
                current_key = Some(key);
            }
        }
        if let Ok(conf) = cols[10].trim().parse::<f32>() {
            if conf >= 0.0 {
                confidences.push(conf);
            }
        }
    }

    let mean_confidence = if confidences.is_empty() {
        0.0
    } else {
        confidences.iter().sum::<f32>() / confidences.len() as f32 / 100.0
    };
    OcrText {
        text: lines.join("\n"),
        mean_confidence,
    }
}

// ── libtesseract engine ──────────────────────────────────────────────────

/// OCR through libtesseract, linked via `leptess`.
///
/// Uses the engine mode compiled into the language data; `engine_mode` is
/// not applied.
#[cfg(feature = "leptess")]
#[derive(Debug, Clone, Default)]
pub struct LeptessEngine;

#[cfg(feature = "leptess")]
impl LeptessEngine {
    fn init(settings: &OcrSettings) -> Result<leptess::LepTess, OcrError> {
        let data_path = settings.tessdata_dir.as_deref().and_then(Path::to_str);
        leptess::LepTess::new(data_path, &settings.language).map_err(|e| {
            OcrError::Init(format!(
                "language '{}' with data path {:?}: {:?}",
                settings.language, data_path, e
            ))
        })
    }
}

#[cfg(feature = "leptess")]
impl OcrEngine for LeptessEngine {
    fn name(&self) -> &str {
        "libtesseract"
    }

    fn probe(&self, settings: &OcrSettings) -> bool {
        match Self::init(settings) {
            Ok(_) => true,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    fn recognize(&self, image_path: &Path, settings: &OcrSettings) -> Result<OcrText, OcrError> {
        let mut lt = Self::init(settings)?;
        lt.set_image(image_path)
            .map_err(|e| OcrError::Recognition(format!("load {}: {:?}", image_path.display(), e)))?;
        let text = lt
            .get_utf8_text()
            .map_err(|e| OcrError::Recognition(format!("{e:?}")))?;
        Ok(OcrText {
            text,
            mean_confidence: lt.mean_text_conf().max(0) as f32 / 100.0,
        })
    }
}
