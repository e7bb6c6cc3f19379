//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the orchestrator walks the document.
//!
//! Pages are processed strictly in order, so events arrive in page order:
//! `on_page_start(n)` is always followed by exactly one of
//! `on_page_complete(n)` or `on_page_error(n)` before page `n + 1` starts.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdfsections::{ExtractionConfig, ExtractionProgressCallback, PageKind};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     sections: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, _page: usize, _total: usize, _kind: PageKind, sections: usize) {
//!         self.sections.fetch_add(sections, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { sections: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::classify::PageKind;
use std::sync::Arc;

/// Called by the orchestrator as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once after the document is opened, before any page is processed.
    ///
    /// # Arguments
    /// * `total_pages` — number of pages that will be processed
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is classified.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page finished, with the strategy used and how many
    /// sections it produced (possibly zero).
    fn on_page_complete(&self, page_num: usize, total_pages: usize, kind: PageKind, sections: usize) {
        let _ = (page_num, total_pages, kind, sections);
    }

    /// Called when a page failed and contributes no sections.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after every page has been attempted.
    ///
    /// # Arguments
    /// * `total_pages`  — pages that were processed
    /// * `with_content` — pages that produced at least one section
    fn on_extraction_complete(&self, total_pages: usize, with_content: usize) {
        let _ = (total_pages, with_content);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        sections: AtomicUsize,
        errors: AtomicUsize,
        with_content: AtomicUsize,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_page_start(&self, _page_num: usize, _total_pages: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page: usize, _total: usize, _kind: PageKind, sections: usize) {
            self.sections.fetch_add(sections, Ordering::SeqCst);
        }

        fn on_page_error(&self, _page_num: usize, _total_pages: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_extraction_complete(&self, _total_pages: usize, with_content: usize) {
            self.with_content.store(with_content, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start(2);
        cb.on_page_start(1, 2);
        cb.on_page_complete(1, 2, PageKind::Native, 3);
        cb.on_page_error(2, 2, "ocr unavailable");
        cb.on_extraction_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_page_start(1, 2);
        tracker.on_page_complete(1, 2, PageKind::Native, 2);
        tracker.on_page_start(2, 2);
        tracker.on_page_error(2, 2, "rasterisation failed");
        tracker.on_extraction_complete(2, 1);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.sections.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.with_content.load(Ordering::SeqCst), 1);
    }
}
