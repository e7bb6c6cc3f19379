//! Output types returned by the extraction entry points.
//!
//! [`ExtractionResult`] is the wire shape:
//!
//! ```json
//! { "title": "report.pdf", "meta": { "pages": 3 },
//!   "sections": [ { "heading": "Introduction", "text": "..." } ] }
//! ```
//!
//! [`ExtractionOutput`] wraps it with per-page diagnostics and timing that
//! don't belong on the wire.

use crate::error::PageError;
use crate::pipeline::classify::PageKind;
use serde::{Deserialize, Serialize};

/// One heading and the body text it introduces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// `None` for body text that precedes any heading on its page.
    pub heading: Option<String>,
    /// Trimmed body text; never empty except in the no-content placeholder.
    pub text: String,
}

impl Section {
    pub fn new(heading: Option<String>, text: impl Into<String>) -> Self {
        Self {
            heading,
            text: text.into(),
        }
    }
}

/// Document-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Page count of the document (not of the selection).
    pub pages: usize,
}

/// Sections of one document, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Document name as supplied by the caller.
    pub title: String,
    pub meta: DocumentMeta,
    pub sections: Vec<Section>,
}

impl ExtractionResult {
    /// A result carrying only the placeholder section.
    pub fn placeholder(title: impl Into<String>, pages: usize, message: &str) -> Self {
        Self {
            title: title.into(),
            meta: DocumentMeta { pages },
            sections: vec![Section::new(None, message)],
        }
    }

    pub fn page_count(&self) -> usize {
        self.meta.pages
    }

    /// Serialise as compact or pretty JSON.
    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// What happened on a single processed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    /// 1-indexed page number.
    pub page_num: usize,
    pub kind: PageKind,
    /// Sections this page contributed.
    pub sections: usize,
    /// Set when the page was skipped or failed; such a page contributes nothing.
    pub error: Option<PageError>,
    pub duration_ms: u64,
}

/// The sections of one page together with its report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSections {
    pub report: PageReport,
    pub sections: Vec<Section>,
}

/// Aggregate statistics for one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages actually processed (the selection).
    pub processed_pages: usize,
    pub native_pages: usize,
    pub scanned_pages: usize,
    /// Pages carrying a [`PageError`].
    pub failed_pages: usize,
    /// Sections before the placeholder rule was applied.
    pub extracted_sections: usize,
    pub total_duration_ms: u64,
}

/// Full output of an extraction: the result plus diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    pub result: ExtractionResult,
    /// One report per processed page, in page order.
    pub pages: Vec<PageReport>,
    pub stats: ExtractionStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn result_serialises_to_wire_shape() {
        let result = ExtractionResult {
            title: "report.pdf".into(),
            meta: DocumentMeta { pages: 2 },
            sections: vec![
                Section::new(None, "Preamble."),
                Section::new(Some("Introduction".into()), "Body."),
            ],
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "title": "report.pdf",
                "meta": { "pages": 2 },
                "sections": [
                    { "heading": null, "text": "Preamble." },
                    { "heading": "Introduction", "text": "Body." }
                ]
            })
        );
    }

    #[test]
    fn placeholder_has_single_null_heading_section() {
        let result = ExtractionResult::placeholder("scan.pdf", 0, "no content detected");
        assert_eq!(result.page_count(), 0);
        assert_eq!(
            result.sections,
            vec![Section::new(None, "no content detected")]
        );
    }

    #[test]
    fn pretty_json_is_multiline() {
        let result = ExtractionResult::placeholder("a.pdf", 1, "none");
        assert!(result.to_json(true).unwrap().contains('\n'));
        assert!(!result.to_json(false).unwrap().contains('\n'));
    }
}
