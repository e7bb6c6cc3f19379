//! Heading predicates.
//!
//! Two independent, stateless classifiers:
//!
//! * [`is_heading_by_font`] for native blocks, where the font size is known.
//! * [`is_heading_by_pattern`] for OCR lines, which carry no font metadata and
//!   fall back to line shape and a handful of numbering/title patterns.

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest native block (in characters) that can still be a heading.
pub const MAX_FONT_HEADING_CHARS: usize = 100;
/// Most words a native heading block may contain.
pub const MAX_FONT_HEADING_WORDS: usize = 15;

/// Longest OCR line (in characters) that can still be a heading.
pub const MAX_PATTERN_HEADING_CHARS: usize = 80;
/// Most words an OCR heading line may contain.
pub const MAX_PATTERN_HEADING_WORDS: usize = 12;

const SHORT_LINE_CHARS: usize = 30;
const SHORT_LINE_WORDS: usize = 5;

static HEADING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\d+\.",          // "1. Overview", "2.3 Scope"
        r"^[A-Z][a-z]+:",   // "Summary: ..."
        r"^[A-Z\s]+$",      // "TABLE OF CONTENTS"
        r"^\d+\s+[A-Z]",    // "3 Results"
        r"^Chapter\s+\d+",
        r"^Chapitre\s+\d+",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Whitespace-separated word count, empty tokens discarded.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// A native block is a heading iff its average font size reaches the page
/// threshold and it is short in both characters and words.
pub fn is_heading_by_font(text: &str, average_font_size: f32, threshold: f32) -> bool {
    average_font_size >= threshold
        && text.chars().count() <= MAX_FONT_HEADING_CHARS
        && word_count(text) <= MAX_FONT_HEADING_WORDS
}

/// An OCR line is a heading iff it passes the shape gate and at least one
/// pattern fires (or it is a short capitalised line).
///
/// `line` is expected to be trimmed.
pub fn is_heading_by_pattern(line: &str) -> bool {
    passes_shape_gate(line) && (matches_pattern(line) || is_short_title(line))
}

fn passes_shape_gate(line: &str) -> bool {
    let mut chars = line.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if line.chars().count() > MAX_PATTERN_HEADING_CHARS
        || !(first.is_uppercase() || first.is_ascii_digit())
        || word_count(line) > MAX_PATTERN_HEADING_WORDS
    {
        return false;
    }
    // A trailing '.' reads as a sentence, except after a number ("1.").
    match line.strip_suffix('.') {
        Some(rest) => rest.chars().last().is_some_and(|c| c.is_ascii_digit()),
        None => true,
    }
}

fn matches_pattern(line: &str) -> bool {
    HEADING_PATTERNS.iter().any(|re| re.is_match(line))
}

fn is_short_title(line: &str) -> bool {
    line.chars().count() < SHORT_LINE_CHARS
        && line.chars().next().is_some_and(char::is_uppercase)
        && word_count(line) <= SHORT_LINE_WORDS
}
