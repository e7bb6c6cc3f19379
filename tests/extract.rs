//! Orchestrator integration tests.
//!
//! Drive [`Extractor`] through in-memory PDF, rasteriser and OCR fakes so the
//! whole pipeline runs without pdfium or tesseract installed.

use edgequake_pdfsections::{
    extract_stream, BoundingBox, ExtractError, ExtractionConfig, ExtractionProgressCallback,
    Extractor, Glyph, LoadedDocument, NativePage, OcrEngine, OcrError, OcrSettings, OcrText,
    PageError, PageKind, PageSelection, PdfBackend, Rasterizer, Section,
};
use futures::StreamExt;
use image::RgbaImage;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Fakes ────────────────────────────────────────────────────────────────────

/// A page as the fake backend serves it.
#[derive(Clone)]
enum FakePage {
    /// Text layer built from positioned runs `(text, left, baseline, size)`.
    Native(Vec<(&'static str, f32, f32, f32)>),
    /// Text layer present but glyph extraction fails.
    NativeWithoutGlyphs(&'static str),
    /// Text layer present but every positioned glyph is whitespace.
    BlankGlyphs(&'static str),
    /// No text layer; OCR returns the given text.
    Scanned(&'static str),
}

struct FakePdf {
    pages: Vec<FakePage>,
    fail_open: bool,
}

impl FakePdf {
    fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            fail_open: false,
        }
    }

    fn ocr_text(&self) -> HashMap<usize, String> {
        self.pages
            .iter()
            .enumerate()
            .filter_map(|(i, p)| match p {
                FakePage::Scanned(text) => Some((i, text.to_string())),
                _ => None,
            })
            .collect()
    }
}

impl PdfBackend for FakePdf {
    fn load(
        &self,
        _bytes: &[u8],
        selection: &PageSelection,
        name: &str,
    ) -> Result<LoadedDocument, ExtractError> {
        if self.fail_open {
            return Err(ExtractError::InvalidDocument {
                name: name.to_string(),
                detail: "corrupt xref".into(),
            });
        }
        let pages = selection
            .to_indices(self.pages.len())
            .into_iter()
            .map(|idx| {
                let number = idx + 1;
                match &self.pages[idx] {
                    FakePage::Native(runs) => {
                        let mut glyphs = Vec::new();
                        let mut lines = Vec::new();
                        for (text, left, baseline, size) in runs {
                            glyphs.extend(Glyph::layout_run(text, *left, *baseline, *size));
                            lines.push(*text);
                        }
                        NativePage {
                            number,
                            text: Ok(lines.join("\n")),
                            glyphs: Ok(glyphs),
                        }
                    }
                    FakePage::NativeWithoutGlyphs(text) => NativePage {
                        number,
                        text: Ok(text.to_string()),
                        glyphs: Err("no char boxes".into()),
                    },
                    FakePage::BlankGlyphs(text) => NativePage {
                        number,
                        text: Ok(text.to_string()),
                        glyphs: Ok(Glyph::layout_run(" ", 72.0, 700.0, 12.0)),
                    },
                    FakePage::Scanned(_) => NativePage {
                        number,
                        text: Ok(String::new()),
                        glyphs: Ok(Vec::new()),
                    },
                }
            })
            .collect();
        Ok(LoadedDocument {
            page_count: self.pages.len(),
            pages,
        })
    }
}

/// Encodes the page index in the image width so the OCR fake can tell
/// pages apart.
struct FakeRasterizer {
    fail: bool,
}

impl Rasterizer for FakeRasterizer {
    fn rasterize(&self, _document: &[u8], page_index: usize, scale: f32) -> Result<RgbaImage, String> {
        assert_eq!(scale, 1.5);
        if self.fail {
            return Err("render failed".into());
        }
        Ok(RgbaImage::new(page_index as u32 + 1, 1))
    }
}

struct FakeOcr {
    available: bool,
    fail: bool,
    text_by_page: HashMap<usize, String>,
    probes: AtomicUsize,
    calls: AtomicUsize,
}

impl FakeOcr {
    fn new(available: bool, text_by_page: HashMap<usize, String>) -> Self {
        Self {
            available,
            fail: false,
            text_by_page,
            probes: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }
}

impl OcrEngine for FakeOcr {
    fn name(&self) -> &str {
        "fake"
    }

    fn probe(&self, settings: &OcrSettings) -> bool {
        assert_eq!(settings.language, "eng");
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.available
    }

    fn recognize(&self, image_path: &Path, _settings: &OcrSettings) -> Result<OcrText, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(image_path.exists(), "raster image must exist during OCR");
        if self.fail {
            return Err(OcrError::Recognition("engine crashed".into()));
        }
        let (width, _) = image::image_dimensions(image_path)
            .map_err(|e| OcrError::Recognition(e.to_string()))?;
        let text = self
            .text_by_page
            .get(&(width as usize - 1))
            .cloned()
            .unwrap_or_default();
        Ok(OcrText {
            text: format!("  {text}\n"),
            mean_confidence: 0.9,
        })
    }
}

struct Harness {
    extractor: Extractor,
    ocr: Arc<FakeOcr>,
}

fn harness(pdf: FakePdf, config: ExtractionConfig) -> Harness {
    let ocr = Arc::new(FakeOcr::new(true, pdf.ocr_text()));
    harness_with(pdf, config, ocr, false)
}

fn harness_with(
    pdf: FakePdf,
    config: ExtractionConfig,
    ocr: Arc<FakeOcr>,
    raster_fails: bool,
) -> Harness {
    let extractor = Extractor::with_backends(
        config,
        Arc::new(pdf),
        Arc::new(FakeRasterizer { fail: raster_fails }),
        ocr.clone(),
    );
    Harness { extractor, ocr }
}

fn native_intro_page() -> FakePage {
    FakePage::Native(vec![
        ("Introduction", 72.0, 740.0, 24.0),
        ("This paper presents a method.", 72.0, 700.0, 12.0),
    ])
}

fn fake_bytes() -> Vec<u8> {
    b"%PDF-1.7 fake".to_vec()
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn native_page_heading_by_font_size() {
    let h = harness(FakePdf::new(vec![native_intro_page()]), ExtractionConfig::default());

    let output = h.extractor.extract(fake_bytes(), "paper.pdf").await.unwrap();

    assert_eq!(output.result.title, "paper.pdf");
    assert_eq!(output.result.meta.pages, 1);
    assert_eq!(
        output.result.sections,
        vec![Section::new(
            Some("Introduction".into()),
            "This paper presents a method."
        )]
    );
    assert_eq!(output.pages[0].kind, PageKind::Native);
    assert_eq!(h.ocr.probes.load(Ordering::SeqCst), 0, "native pages never probe OCR");
}

#[tokio::test]
async fn scanned_page_heading_by_pattern() {
    let pdf = FakePdf::new(vec![FakePage::Scanned(
        "1. Overview\nThis document describes the system.",
    )]);
    let h = harness(pdf, ExtractionConfig::default());

    let output = h.extractor.extract(fake_bytes(), "scan.pdf").await.unwrap();

    assert_eq!(
        output.result.sections,
        vec![Section::new(
            Some("1. Overview".into()),
            "This document describes the system."
        )]
    );
    assert_eq!(output.pages[0].kind, PageKind::Scanned);
    assert_eq!(output.stats.scanned_pages, 1);
    assert!(output.pages[0].error.is_none());
}

#[tokio::test]
async fn unavailable_ocr_yields_placeholder() {
    let pdf = FakePdf::new(vec![FakePage::Scanned("Never read")]);
    let ocr = Arc::new(FakeOcr::new(false, pdf.ocr_text()));
    let h = harness_with(pdf, ExtractionConfig::default(), ocr, false);

    let output = h.extractor.extract(fake_bytes(), "scan.pdf").await.unwrap();

    assert_eq!(output.result.meta.pages, 1);
    assert_eq!(
        output.result.sections,
        vec![Section::new(None, "no content detected")]
    );
    assert_eq!(
        output.pages[0].error,
        Some(PageError::OcrUnavailable { page: 1 })
    );
    assert_eq!(output.stats.extracted_sections, 0);
    assert_eq!(h.ocr.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn disabled_ocr_skips_scanned_pages_without_probing() {
    let pdf = FakePdf::new(vec![native_intro_page(), FakePage::Scanned("Hidden")]);
    let config = ExtractionConfig::builder().ocr_enabled(false).build().unwrap();
    let h = harness(pdf, config);

    let output = h.extractor.extract(fake_bytes(), "mixed.pdf").await.unwrap();

    assert_eq!(output.result.sections.len(), 1);
    assert_eq!(h.ocr.probes.load(Ordering::SeqCst), 0);
    assert_eq!(
        output.pages[1].error,
        Some(PageError::OcrUnavailable { page: 2 })
    );
}

#[tokio::test]
async fn ocr_is_probed_once_per_document() {
    let pdf = FakePdf::new(vec![
        FakePage::Scanned("Page one text"),
        FakePage::Scanned("Page two text"),
        FakePage::Scanned("Page three text"),
    ]);
    let h = harness(pdf, ExtractionConfig::default());

    h.extractor.extract(fake_bytes(), "scan.pdf").await.unwrap();

    assert_eq!(h.ocr.probes.load(Ordering::SeqCst), 1);
    assert_eq!(h.ocr.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn sections_follow_page_order_across_strategies() {
    let pdf = FakePdf::new(vec![
        native_intro_page(),
        FakePage::Scanned("2. Method\nWe measured everything twice."),
        FakePage::Native(vec![
            ("Results", 72.0, 740.0, 24.0),
            ("It worked on every sample we tried.", 72.0, 700.0, 12.0),
        ]),
    ]);
    let h = harness(pdf, ExtractionConfig::default());

    let output = h.extractor.extract(fake_bytes(), "paper.pdf").await.unwrap();

    let headings: Vec<Option<&str>> = output
        .result
        .sections
        .iter()
        .map(|s| s.heading.as_deref())
        .collect();
    assert_eq!(
        headings,
        vec![Some("Introduction"), Some("2. Method"), Some("Results")]
    );
    let numbers: Vec<usize> = output.pages.iter().map(|r| r.page_num).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(output.stats.native_pages, 2);
    assert_eq!(output.stats.scanned_pages, 1);
}

#[tokio::test]
async fn zero_page_document_yields_placeholder() {
    let h = harness(FakePdf::new(Vec::new()), ExtractionConfig::default());

    let output = h.extractor.extract(fake_bytes(), "empty.pdf").await.unwrap();

    assert_eq!(output.result.meta.pages, 0);
    assert_eq!(
        output.result.sections,
        vec![Section::new(None, "no content detected")]
    );
    assert!(output.pages.is_empty());
}

#[tokio::test]
async fn open_failure_is_fatal() {
    let mut pdf = FakePdf::new(vec![native_intro_page()]);
    pdf.fail_open = true;
    let h = harness(pdf, ExtractionConfig::default());

    let err = h.extractor.extract(fake_bytes(), "broken.pdf").await.unwrap_err();
    assert!(matches!(err, ExtractError::InvalidDocument { .. }));
}

#[tokio::test]
async fn selection_outside_document_is_rejected() {
    let config = ExtractionConfig::builder()
        .pages(PageSelection::Single(5))
        .build()
        .unwrap();
    let h = harness(FakePdf::new(vec![native_intro_page()]), config);

    let err = h.extractor.extract(fake_bytes(), "paper.pdf").await.unwrap_err();
    assert!(matches!(
        err,
        ExtractError::PageOutOfRange { page: 5, total: 1 }
    ));
}

#[tokio::test]
async fn selection_keeps_document_page_count() {
    let pdf = FakePdf::new(vec![
        native_intro_page(),
        FakePage::Native(vec![
            ("Results", 72.0, 740.0, 24.0),
            ("It worked on every sample we tried.", 72.0, 700.0, 12.0),
        ]),
    ]);
    let config = ExtractionConfig::builder()
        .pages(PageSelection::Single(2))
        .build()
        .unwrap();
    let h = harness(pdf, config);

    let output = h.extractor.extract(fake_bytes(), "paper.pdf").await.unwrap();

    assert_eq!(output.result.meta.pages, 2);
    assert_eq!(output.stats.processed_pages, 1);
    assert_eq!(output.result.sections[0].heading.as_deref(), Some("Results"));
}

#[tokio::test]
async fn ocr_failure_is_recorded_and_skipped() {
    let pdf = FakePdf::new(vec![native_intro_page(), FakePage::Scanned("Lost text")]);
    let mut ocr = FakeOcr::new(true, pdf.ocr_text());
    ocr.fail = true;
    let h = harness_with(pdf, ExtractionConfig::default(), Arc::new(ocr), false);

    let output = h.extractor.extract(fake_bytes(), "paper.pdf").await.unwrap();

    assert_eq!(output.result.sections.len(), 1);
    assert!(matches!(
        output.pages[1].error,
        Some(PageError::OcrFailed { page: 2, .. })
    ));
    assert_eq!(output.stats.failed_pages, 1);
}

#[tokio::test]
async fn rasterisation_failure_is_recorded() {
    let pdf = FakePdf::new(vec![FakePage::Scanned("Unrendered")]);
    let ocr = Arc::new(FakeOcr::new(true, pdf.ocr_text()));
    let h = harness_with(pdf, ExtractionConfig::default(), ocr, true);

    let output = h.extractor.extract(fake_bytes(), "scan.pdf").await.unwrap();

    assert!(matches!(
        output.pages[0].error,
        Some(PageError::RasterisationFailed { page: 1, .. })
    ));
    assert_eq!(h.ocr.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        output.result.sections,
        vec![Section::new(None, "no content detected")]
    );
}

#[tokio::test]
async fn glyph_failure_falls_back_to_line_heuristic() {
    let pdf = FakePdf::new(vec![FakePage::NativeWithoutGlyphs(
        "1. Scope\nThis applies to all widgets.",
    )]);
    let h = harness(pdf, ExtractionConfig::default());

    let output = h.extractor.extract(fake_bytes(), "widgets.pdf").await.unwrap();

    assert_eq!(output.pages[0].kind, PageKind::Native);
    assert!(output.pages[0].error.is_none());
    assert_eq!(
        output.result.sections,
        vec![Section::new(
            Some("1. Scope".into()),
            "This applies to all widgets."
        )]
    );
    assert_eq!(h.ocr.probes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn whitespace_only_glyphs_fall_back_to_line_heuristic() {
    let pdf = FakePdf::new(vec![FakePage::BlankGlyphs("Introduction\nSome body text.")]);
    let h = harness(pdf, ExtractionConfig::default());

    let output = h.extractor.extract(fake_bytes(), "boxes.pdf").await.unwrap();

    assert_eq!(output.pages[0].kind, PageKind::Native);
    assert_eq!(
        output.result.sections,
        vec![Section::new(Some("Introduction".into()), "Some body text.")]
    );
    assert_eq!(h.ocr.probes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn body_before_first_heading_has_no_heading() {
    let pdf = FakePdf::new(vec![FakePage::Native(vec![
        ("Preface text before anything else.", 72.0, 760.0, 12.0),
        ("Background", 72.0, 700.0, 24.0),
        ("Earlier work exists.", 72.0, 660.0, 12.0),
    ])]);
    let h = harness(pdf, ExtractionConfig::default());

    let output = h.extractor.extract(fake_bytes(), "paper.pdf").await.unwrap();

    assert_eq!(
        output.result.sections,
        vec![
            Section::new(None, "Preface text before anything else."),
            Section::new(Some("Background".into()), "Earlier work exists."),
        ]
    );
}

#[tokio::test]
async fn wire_json_has_expected_shape() {
    let h = harness(FakePdf::new(vec![native_intro_page()]), ExtractionConfig::default());
    let output = h.extractor.extract(fake_bytes(), "paper.pdf").await.unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&output.result.to_json(false).unwrap()).unwrap();
    assert_eq!(value["title"], "paper.pdf");
    assert_eq!(value["meta"]["pages"], 1);
    assert_eq!(value["sections"][0]["heading"], "Introduction");
    assert_eq!(value["sections"][0]["text"], "This paper presents a method.");
}

// ── Streaming ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stream_yields_pages_in_order() {
    let pdf = FakePdf::new(vec![
        native_intro_page(),
        FakePage::Scanned("2. Method\nWe measured everything twice."),
        FakePage::Scanned(""),
    ]);
    let h = harness(pdf, ExtractionConfig::default());

    let (page_count, stream) = extract_stream(&h.extractor, fake_bytes(), "paper.pdf")
        .await
        .unwrap();
    let items: Vec<_> = stream.collect().await;

    assert_eq!(page_count, 3);
    let numbers: Vec<usize> = items.iter().map(|p| p.report.page_num).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(items[0].sections[0].heading.as_deref(), Some("Introduction"));
    assert_eq!(items[1].sections[0].heading.as_deref(), Some("2. Method"));
    assert!(items[2].sections.is_empty(), "placeholder is not streamed");
    assert_eq!(h.ocr.probes.load(Ordering::SeqCst), 1);
}

// ── Progress callbacks ───────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl RecordingCallback {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl ExtractionProgressCallback for RecordingCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        self.push(format!("start {total_pages}"));
    }
    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.push(format!("page {page_num}"));
    }
    fn on_page_complete(&self, page_num: usize, _total: usize, kind: PageKind, sections: usize) {
        self.push(format!("done {page_num} {kind:?} {sections}"));
    }
    fn on_page_error(&self, page_num: usize, _total: usize, _error: &str) {
        self.push(format!("error {page_num}"));
    }
    fn on_extraction_complete(&self, total_pages: usize, with_content: usize) {
        self.push(format!("complete {total_pages} {with_content}"));
    }
}

#[tokio::test]
async fn progress_events_fire_in_order() {
    let pdf = FakePdf::new(vec![native_intro_page(), FakePage::Scanned("Gone")]);
    let recorder = Arc::new(RecordingCallback::default());
    let config = ExtractionConfig::builder()
        .ocr_enabled(false)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let h = harness(pdf, config);

    h.extractor.extract(fake_bytes(), "paper.pdf").await.unwrap();

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "start 2",
            "page 1",
            "done 1 Native 1",
            "page 2",
            "error 2",
            "complete 2 1",
        ]
    );
}

#[test]
fn glyph_runs_stack_left_to_right() {
    let glyphs = Glyph::layout_run("ab", 10.0, 100.0, 12.0);
    assert_eq!(glyphs[0].bbox, BoundingBox::new(10.0, 100.0, 16.0, 112.0));
    assert_eq!(glyphs[1].bbox.left, 16.0);
}
