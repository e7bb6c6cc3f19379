//! Extraction orchestrator and eager entry points.
//!
//! [`Extractor`] owns the injected capabilities (PDF backend, rasteriser,
//! OCR engine) and walks a document page by page, strictly in order:
//!
//! ```text
//! open ─▶ for each selected page:
//!           classify ─┬─ Native  ─▶ layout ─▶ font headings ─┐
//!                     └─ Scanned ─▶ OCR    ─▶ line headings ─┴─▶ append sections
//!       ─▶ placeholder if nothing was found
//! ```
//!
//! Blocking work (pdfium, tesseract) runs on tokio's blocking pool; each page
//! is awaited before the next one starts so list order is reading order.
//! Only failure to open the document is fatal.
//!
//! The free functions ([`extract`], [`extract_bytes`], [`extract_sync`],
//! [`extract_to_file`]) build a default [`Extractor`] from the config.

use crate::config::ExtractionConfig;
use crate::error::{ExtractError, PageError};
use crate::output::{ExtractionOutput, ExtractionStats, PageReport, PageSections, Section};
use crate::pipeline::backend::{LoadedDocument, NativePage, PdfBackend, PdfiumBackend, Rasterizer};
use crate::pipeline::classify::{classify_page, PageKind};
use crate::pipeline::ocr::{self, OcrEngine};
use crate::pipeline::{input, layout, sections};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs extractions with a fixed set of capabilities and configuration.
///
/// Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct Extractor {
    backend: Arc<dyn PdfBackend>,
    rasterizer: Arc<dyn Rasterizer>,
    ocr: Arc<dyn OcrEngine>,
    config: ExtractionConfig,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("ocr", &self.ocr.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Extractor {
    /// pdfium for the native layer and rasterisation; tesseract for OCR
    /// (the `tesseract` binary, or libtesseract with the `leptess` feature).
    pub fn new(config: ExtractionConfig) -> Self {
        let pdfium = Arc::new(PdfiumBackend::new(
            config.pdfium_library_path.clone(),
            config.password.clone(),
        ));
        Self {
            backend: pdfium.clone(),
            rasterizer: pdfium,
            ocr: default_ocr_engine(&config),
            config,
        }
    }

    /// Use caller-supplied capabilities.
    pub fn with_backends(
        config: ExtractionConfig,
        backend: Arc<dyn PdfBackend>,
        rasterizer: Arc<dyn Rasterizer>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        Self {
            backend,
            rasterizer,
            ocr,
            config,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract sections from in-memory PDF bytes.
    ///
    /// # Errors
    /// Only when the document cannot be opened, or the page selection
    /// matches no page. Page-level failures are reported in
    /// [`ExtractionOutput::pages`].
    pub async fn extract(
        &self,
        bytes: impl Into<Arc<[u8]>>,
        name: &str,
    ) -> Result<ExtractionOutput, ExtractError> {
        let total_start = Instant::now();
        let bytes: Arc<[u8]> = bytes.into();
        info!("Starting extraction: {} ({} bytes)", name, bytes.len());

        let loaded = self.open(bytes.clone(), name).await?;
        let page_count = loaded.page_count;
        let selected = loaded.pages.len();

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_extraction_start(selected);
        }

        let mut run = DocumentRun::new(self.clone(), bytes, selected);
        let mut all_sections = Vec::new();
        let mut reports = Vec::with_capacity(selected);
        for page in loaded.pages {
            let PageSections { report, sections } = run.process(page).await;
            all_sections.extend(sections);
            reports.push(report);
        }

        let with_content = reports.iter().filter(|r| r.sections > 0).count();
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_extraction_complete(selected, with_content);
        }

        let stats = ExtractionStats {
            total_pages: page_count,
            processed_pages: selected,
            native_pages: reports.iter().filter(|r| r.kind == PageKind::Native).count(),
            scanned_pages: reports.iter().filter(|r| r.kind == PageKind::Scanned).count(),
            failed_pages: reports.iter().filter(|r| r.error.is_some()).count(),
            extracted_sections: all_sections.len(),
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        if all_sections.is_empty() {
            info!("No content detected in {}", name);
        }
        let result = sections::finalize_document(
            name,
            page_count,
            all_sections,
            &self.config.no_content_message,
        );

        info!(
            "Extraction complete: {} sections from {}/{} pages ({} native, {} scanned, {} failed), {}ms",
            stats.extracted_sections,
            with_content,
            selected,
            stats.native_pages,
            stats.scanned_pages,
            stats.failed_pages,
            stats.total_duration_ms
        );

        Ok(ExtractionOutput {
            result,
            pages: reports,
            stats,
        })
    }

    /// Read a local path or download a URL, then [`Extractor::extract`].
    ///
    /// The file name (or URL basename) becomes the result title.
    pub async fn extract_file(&self, input: &str) -> Result<ExtractionOutput, ExtractError> {
        let pdf = input::resolve_input(input, self.config.download_timeout_secs).await?;
        self.extract(pdf.bytes, &pdf.name).await
    }

    /// Open the document on the blocking pool and apply the page selection.
    pub(crate) async fn open(
        &self,
        bytes: Arc<[u8]>,
        name: &str,
    ) -> Result<LoadedDocument, ExtractError> {
        let backend = Arc::clone(&self.backend);
        let selection = self.config.pages.clone();
        let owned_name = name.to_string();

        let loaded = tokio::task::spawn_blocking(move || {
            backend.load(&bytes, &selection, &owned_name)
        })
        .await
        .map_err(|e| ExtractError::Internal(format!("Load task panicked: {e}")))??;

        if loaded.pages.is_empty() && loaded.page_count > 0 {
            return Err(ExtractError::PageOutOfRange {
                page: self.config.pages.first_requested(),
                total: loaded.page_count,
            });
        }
        debug!(
            "Selected {} of {} pages for extraction",
            loaded.pages.len(),
            loaded.page_count
        );
        Ok(loaded)
    }
}

#[cfg(feature = "leptess")]
fn default_ocr_engine(_config: &ExtractionConfig) -> Arc<dyn OcrEngine> {
    Arc::new(ocr::LeptessEngine)
}

#[cfg(not(feature = "leptess"))]
fn default_ocr_engine(config: &ExtractionConfig) -> Arc<dyn OcrEngine> {
    Arc::new(ocr::TesseractCli::new(config.tesseract_command.clone()))
}

// ── Per-document state ───────────────────────────────────────────────────

/// State of one extraction pass: the shared byte buffer and the cached OCR
/// availability verdict (probed at most once).
pub(crate) struct DocumentRun {
    extractor: Extractor,
    bytes: Arc<[u8]>,
    total: usize,
    ocr_available: Option<bool>,
}

impl DocumentRun {
    pub(crate) fn new(extractor: Extractor, bytes: Arc<[u8]>, total: usize) -> Self {
        Self {
            extractor,
            bytes,
            total,
            ocr_available: None,
        }
    }

    /// Classify one page, run the matching strategy and report progress.
    pub(crate) async fn process(&mut self, page: NativePage) -> PageSections {
        let start = Instant::now();
        let page_num = page.number;
        let cb = self.extractor.config.progress_callback.clone();
        if let Some(ref cb) = cb {
            cb.on_page_start(page_num, self.total);
        }

        let native_text = match &page.text {
            Ok(text) => text.clone(),
            Err(detail) => {
                warn!("Page {}: native text unreadable ({}), trying OCR", page_num, detail);
                String::new()
            }
        };
        let kind = classify_page(&native_text);
        debug!("Page {} classified as {:?}", page_num, kind);

        let (sections, error) = match kind {
            PageKind::Native => (self.native_sections(page, &native_text), None),
            PageKind::Scanned => match self.scanned_sections(page.index()).await {
                Ok(sections) => (sections, None),
                Err(e) => (Vec::new(), Some(e)),
            },
        };

        let report = PageReport {
            page_num,
            kind,
            sections: sections.len(),
            error,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        if let Some(ref cb) = cb {
            match &report.error {
                None => cb.on_page_complete(page_num, self.total, kind, report.sections),
                Some(e) => cb.on_page_error(page_num, self.total, &e.to_string()),
            }
        }
        PageSections { report, sections }
    }

    fn native_sections(&self, page: NativePage, native_text: &str) -> Vec<Section> {
        let ratio = self.extractor.config.heading_font_ratio;
        match page.glyphs {
            Ok(glyphs) => {
                let page_layout = layout::analyze_page(&glyphs);
                if page_layout.blocks.is_empty() {
                    warn!(
                        "Page {}: text present but no positioned glyphs, using line heuristic",
                        page.number
                    );
                    return sections::sections_from_text(native_text);
                }
                let found = sections::sections_from_layout(&page_layout, ratio);
                debug!("Page {}: {} sections from layout", page.number, found.len());
                found
            }
            Err(detail) => {
                warn!(
                    "Page {}: glyph extraction failed ({}), using line heuristic",
                    page.number, detail
                );
                sections::sections_from_text(native_text)
            }
        }
    }

    async fn scanned_sections(&mut self, page_index: usize) -> Result<Vec<Section>, PageError> {
        let page = page_index + 1;
        if !self.ocr_ready().await {
            debug!("Page {}: no native text and OCR unavailable, skipped", page);
            return Err(PageError::OcrUnavailable { page });
        }

        let config = &self.extractor.config;
        let bytes = Arc::clone(&self.bytes);
        let rasterizer = Arc::clone(&self.extractor.rasterizer);
        let engine = Arc::clone(&self.extractor.ocr);
        let settings = config.ocr_settings();
        let scale = config.raster_scale;

        info!("Page {}: no native text, running OCR", page);
        let text = tokio::task::spawn_blocking(move || {
            ocr::recognize_page(
                &bytes,
                page_index,
                scale,
                rasterizer.as_ref(),
                engine.as_ref(),
                &settings,
            )
        })
        .await
        .map_err(|e| PageError::OcrFailed {
            page,
            detail: format!("OCR task panicked: {e}"),
        })?
        .inspect_err(|e| warn!("{}", e))?;

        Ok(sections::sections_from_text(&text))
    }

    /// Probe the OCR engine once per run; later pages reuse the verdict.
    async fn ocr_ready(&mut self) -> bool {
        if let Some(available) = self.ocr_available {
            return available;
        }
        let config = &self.extractor.config;
        let available = if !config.ocr_enabled {
            info!("OCR disabled; pages without native text will be skipped");
            false
        } else {
            let engine = Arc::clone(&self.extractor.ocr);
            let settings = config.ocr_settings();
            let available = tokio::task::spawn_blocking(move || engine.probe(&settings))
                .await
                .unwrap_or(false);
            if available {
                info!("OCR engine '{}' available", self.extractor.ocr.name());
            } else {
                warn!(
                    "OCR engine '{}' unavailable for language '{}'; scanned pages will be skipped",
                    self.extractor.ocr.name(),
                    config.ocr_language
                );
            }
            available
        };
        self.ocr_available = Some(available);
        available
    }
}

// ── Free-function entry points ───────────────────────────────────────────

/// Extract sections from a PDF file or URL.
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdfsections::{extract, ExtractionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let output = extract("report.pdf", &ExtractionConfig::default()).await?;
/// for section in &output.result.sections {
///     println!("{:?}: {}", section.heading, section.text);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn extract(
    input: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    Extractor::new(config.clone())
        .extract_file(input.as_ref())
        .await
}

/// Extract sections from PDF bytes already in memory.
pub async fn extract_bytes(
    bytes: impl Into<Arc<[u8]>>,
    name: &str,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    Extractor::new(config.clone()).extract(bytes, name).await
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(input, config))
}

/// Extract and write the JSON result to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn extract_to_file(
    input: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    pretty: bool,
    config: &ExtractionConfig,
) -> Result<ExtractionStats, ExtractError> {
    let output = extract(input, config).await?;
    write_json_atomic(output_path.as_ref(), &output.result, pretty).await?;
    Ok(output.stats)
}

/// Write `value` as JSON to `path` via a sibling temp file and a rename.
pub async fn write_json_atomic<T: Serialize>(
    path: &Path,
    value: &T,
    pretty: bool,
) -> Result<(), ExtractError> {
    let write_err = |e: std::io::Error| ExtractError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| ExtractError::Internal(format!("JSON serialisation failed: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{DocumentMeta, ExtractionResult};

    fn sample_output() -> ExtractionOutput {
        ExtractionOutput {
            result: ExtractionResult {
                title: "a.pdf".into(),
                meta: DocumentMeta { pages: 1 },
                sections: vec![Section::new(Some("Intro".into()), "Body.")],
            },
            pages: vec![PageReport {
                page_num: 1,
                kind: PageKind::Native,
                sections: 1,
                error: None,
                duration_ms: 3,
            }],
            stats: ExtractionStats::default(),
        }
    }

    #[tokio::test]
    async fn atomic_write_of_full_report_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/report.json");
        let output = sample_output();

        write_json_atomic(&path, &output, true).await.unwrap();

        let back: ExtractionOutput =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, output);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn atomic_write_of_result_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");
        let output = sample_output();

        write_json_atomic(&path, &output.result, false).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains('\n'));
        let back: ExtractionResult = serde_json::from_str(&text).unwrap();
        assert_eq!(back, output.result);
    }
}
