//! Streaming extraction API: emit each page's sections as it completes.
//!
//! Unlike the eager [`crate::extract::Extractor::extract`], which returns
//! once every page is done, [`extract_stream`] yields a [`PageSections`] per
//! selected page. Pages are still processed one at a time, so items arrive
//! in page order.
//!
//! The no-content placeholder is a document-level rule and is not applied
//! here: a stream where every item has zero sections is an empty document.

use crate::error::ExtractError;
use crate::extract::{DocumentRun, Extractor};
use crate::output::PageSections;
use futures::stream;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-page results.
pub type PageStream = Pin<Box<dyn Stream<Item = PageSections> + Send>>;

/// Open the document and return a stream over its selected pages.
///
/// # Returns
/// - `Ok((page_count, PageStream))` — the document's real page count and
///   the stream of page results
/// - `Err(ExtractError)` — the document could not be opened
pub async fn extract_stream(
    extractor: &Extractor,
    bytes: impl Into<Arc<[u8]>>,
    name: &str,
) -> Result<(usize, PageStream), ExtractError> {
    let bytes: Arc<[u8]> = bytes.into();
    info!("Starting streaming extraction: {}", name);

    let loaded = extractor.open(bytes.clone(), name).await?;
    let selected = loaded.pages.len();
    if let Some(ref cb) = extractor.config().progress_callback {
        cb.on_extraction_start(selected);
    }

    let run = DocumentRun::new(extractor.clone(), bytes, selected);
    let pages = loaded.pages.into_iter();

    let stream = stream::unfold((run, pages), |(mut run, mut pages)| async move {
        let page = pages.next()?;
        let item = run.process(page).await;
        Some((item, (run, pages)))
    });

    Ok((loaded.page_count, Box::pin(stream)))
}
