//! # edgequake-pdfsections
//!
//! Extract an ordered list of `(heading, body)` sections from any PDF, whether
//! its pages carry selectable text or are scanned images.
//!
//! ## How it works
//!
//! Each page is classified on its native text layer. Pages with text go
//! through layout analysis (glyphs → words → blocks in reading order) and a
//! font-size heading test; pages without text are rasterised and OCR'd, and
//! their lines are tested against numbering and title patterns. Sections
//! from every page are concatenated in reading order.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Open      native text + glyphs per page via pdfium (spawn_blocking)
//!  ├─ 3. Classify  Native (has text) or Scanned (no text)
//!  ├─ 4a. Layout   words → blocks → reading order → font headings
//!  ├─ 4b. OCR      rasterise ×1.5 → tesseract → line headings
//!  └─ 5. Sections  fold headings/body per page, placeholder if empty
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfsections::{extract, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .tessdata_dir("/usr/share/tessdata")
//!         .build()?;
//!     let output = extract("document.pdf", &config).await?;
//!     println!("{}", output.result.to_json(true)?);
//!     eprintln!("{} native / {} scanned pages",
//!         output.stats.native_pages,
//!         output.stats.scanned_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `pdfsections` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `leptess` | off     | OCR through linked libtesseract instead of the `tesseract` binary |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdfsections = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirements
//!
//! * libpdfium on the library path (or `pdfium_library_path`).
//! * For scanned pages, tesseract with the configured language data.
//!   Without it, scanned pages are skipped and reported, never fatal.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    discover_tessdata_dir, ExtractionConfig, ExtractionConfigBuilder, OcrEngineMode, PageSelection,
};
pub use error::{ExtractError, OcrError, PageError};
pub use extract::{extract, extract_bytes, extract_sync, extract_to_file, Extractor};
pub use output::{
    DocumentMeta, ExtractionOutput, ExtractionResult, ExtractionStats, PageReport, PageSections,
    Section,
};
pub use pipeline::backend::{LoadedDocument, NativePage, PdfBackend, PdfiumBackend, Rasterizer};
pub use pipeline::classify::PageKind;
pub use pipeline::layout::{BoundingBox, Glyph};
pub use pipeline::ocr::{OcrEngine, OcrSettings, OcrText, TesseractCli};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{extract_stream, PageStream};
