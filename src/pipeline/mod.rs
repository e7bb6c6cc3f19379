//! Pipeline stages for PDF section extraction.
//!
//! Each submodule implements one step and is testable on its own; the
//! capability traits in [`backend`] and [`ocr`] let the orchestrator run
//! without pdfium or tesseract.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ backend ──▶ classify ──┬─ Native ──▶ layout ──▶ headings (font) ────┬─▶ sections
//! (bytes)   (pdfium)    (per page) └─ Scanned ─▶ ocr ─────▶ headings (pattern) ─┘
//! ```
//!
//! 1. [`input`]    — read a local file or download a URL; `%PDF` check
//! 2. [`backend`]  — open the document, read native text and glyphs per page;
//!    rasterise pages for OCR
//! 3. [`classify`] — `Native` when the page has any native text, else `Scanned`
//! 4. [`layout`]   — glyphs → words → blocks in reading order, font baseline
//! 5. [`ocr`]      — rasterise, write a temp PNG, recognise, trim
//! 6. [`headings`] — font-size and line-shape heading predicates
//! 7. [`sections`] — fold classified units into `(heading, body)` sections

pub mod backend;
pub mod classify;
pub mod headings;
pub mod input;
pub mod layout;
pub mod ocr;
pub mod sections;
