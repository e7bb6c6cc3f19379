//! Page classification: native text or OCR fallback.
//!
//! The only signal is whether the page's native text is empty after
//! trimming. There is deliberately no length threshold: a page with a single
//! real character is still `Native`, so thin text pages never pay for OCR.

use serde::{Deserialize, Serialize};

/// Extraction strategy chosen for a page. Final for that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// The page carries selectable text; use layout analysis.
    Native,
    /// The page has no native text; rasterise and OCR it.
    Scanned,
}

/// Classify a page from its native extracted text.
pub fn classify_page(native_text: &str) -> PageKind {
    if native_text.trim().is_empty() {
        PageKind::Scanned
    } else {
        PageKind::Native
    }
}
