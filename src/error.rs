//! Error types for the edgequake-pdfsections library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: the extraction cannot proceed at all
//!   (unreadable input, document fails to open, pdfium missing). Returned as
//!   `Err(ExtractError)` from the top-level `extract*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed (rasteriser error,
//!   OCR engine crash or missing) but the document is still
//!   returned. Stored inside [`crate::output::PageReport`] so callers can see
//!   which pages contributed nothing and why.
//!
//! [`OcrError`] is the engine-level error of an [`crate::pipeline::ocr::OcrEngine`];
//! the OCR stage converts it into a [`PageError`] before it reaches callers.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdfsections library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The input was read, but does not start with the `%PDF` magic.
    #[error("Input '{name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The document could not be opened (corrupt header, xref, trailer …).
    #[error("PDF '{name}' could not be opened: {detail}")]
    InvalidDocument { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// The page selection matched no page of the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium for your platform, then either:\n\
  • place it on the system library path, or\n\
  • set PDFIUM_LIB_PATH=/path/to/libpdfium (or pass --pdfium-lib).\n"
    )]
    PdfiumBindingFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// The page contributes no sections; every other page is unaffected.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The rasteriser could not produce an image for OCR.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The OCR engine failed while recognising the page image.
    #[error("Page {page}: OCR failed: {detail}")]
    OcrFailed { page: usize, detail: String },

    /// The page needs OCR but no engine is available.
    #[error("Page {page}: OCR engine unavailable, page skipped")]
    OcrUnavailable { page: usize },
}

impl PageError {
    /// 1-indexed page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::RasterisationFailed { page, .. }
            | PageError::OcrFailed { page, .. }
            | PageError::OcrUnavailable { page } => *page,
        }
    }
}

/// Errors raised by an OCR engine implementation.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The engine could not be initialised (binary or language data missing).
    #[error("Failed to initialise OCR engine: {0}")]
    Init(String),

    /// The engine ran but recognition failed.
    #[error("OCR recognition failed: {0}")]
    Recognition(String),

    /// Reading or writing the intermediate image failed.
    #[error("OCR image I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The engine produced bytes that were not valid UTF-8.
    #[error("OCR output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
