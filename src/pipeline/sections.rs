//! Section aggregation.
//!
//! [`SectionAggregator`] folds a page's classified units, in reading order,
//! into sections. A body buffer is flushed whenever a new heading arrives
//! and at the end of the page; an empty buffer is simply dropped, so two
//! consecutive headings never produce a section of their own.

use crate::output::{DocumentMeta, ExtractionResult, Section};
use crate::pipeline::headings::{is_heading_by_font, is_heading_by_pattern};
use crate::pipeline::layout::PageLayout;
use tracing::debug;

/// One line of OCR output (or of raw native text on the fallback path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrLine {
    pub text: String,
}

/// Split recognised text into trimmed, non-empty lines.
pub fn split_lines(text: &str) -> Vec<OcrLine> {
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| OcrLine { text: l.to_string() })
        .collect()
}

/// Two-state accumulator for one page.
#[derive(Debug, Default)]
pub struct SectionAggregator {
    current_heading: Option<String>,
    current_body: String,
    sections: Vec<Section>,
}

impl SectionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new section headed by `text`, flushing any pending body.
    pub fn push_heading(&mut self, text: &str) {
        self.flush();
        debug!("Heading detected: '{}'", text);
        self.current_heading = Some(text.to_string());
    }

    /// Append body text, space-joined with what is already buffered.
    pub fn push_body(&mut self, text: &str) {
        if !self.current_body.is_empty() {
            self.current_body.push(' ');
        }
        self.current_body.push_str(text);
    }

    /// Flush the pending body and return the page's sections.
    pub fn finish(mut self) -> Vec<Section> {
        self.flush();
        self.sections
    }

    fn flush(&mut self) {
        let body = self.current_body.trim();
        if !body.is_empty() {
            self.sections
                .push(Section::new(self.current_heading.clone(), body));
        }
        self.current_body.clear();
    }
}

/// Sections of a native page from its analysed layout.
///
/// Blocks whose text is blank are skipped.
pub fn sections_from_layout(layout: &PageLayout, heading_font_ratio: f32) -> Vec<Section> {
    let threshold = layout.heading_threshold(heading_font_ratio);
    debug!(
        "Mean font size {:.1}pt, heading threshold {:.1}pt",
        layout.mean_font_size, threshold
    );

    let mut aggregator = SectionAggregator::new();
    for block in &layout.blocks {
        let text = block.text.trim();
        if text.is_empty() {
            continue;
        }
        if is_heading_by_font(text, block.average_font_size, threshold) {
            aggregator.push_heading(text);
        } else {
            aggregator.push_body(text);
        }
    }
    aggregator.finish()
}

/// Sections of a page from plain text, using the line-shape heuristic.
///
/// When the heuristic yields nothing for non-empty text (every line looked
/// like a heading), the whole trimmed text becomes one heading-less section.
pub fn sections_from_text(text: &str) -> Vec<Section> {
    let mut aggregator = SectionAggregator::new();
    for line in split_lines(text) {
        if is_heading_by_pattern(&line.text) {
            aggregator.push_heading(&line.text);
        } else {
            aggregator.push_body(&line.text);
        }
    }
    let sections = aggregator.finish();

    let trimmed = text.trim();
    if sections.is_empty() && !trimmed.is_empty() {
        return vec![Section::new(None, trimmed)];
    }
    sections
}

/// Build the document result, applying the no-content placeholder rule.
pub fn finalize_document(
    title: &str,
    pages: usize,
    sections: Vec<Section>,
    no_content_message: &str,
) -> ExtractionResult {
    if sections.is_empty() {
        return ExtractionResult::placeholder(title, pages, no_content_message);
    }
    ExtractionResult {
        title: title.to_string(),
        meta: DocumentMeta { pages },
        sections,
    }
}
