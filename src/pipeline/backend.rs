//! PDF capabilities: native text/glyph extraction and page rasterisation.
//!
//! Both are traits so the orchestrator can run against fakes in tests. The
//! production implementation, [`PdfiumBackend`], wraps `pdfium-render`.
//!
//! pdfium is a blocking C++ library; every method here is synchronous and the
//! orchestrator calls them from `tokio::task::spawn_blocking`.
//!
//! A pdfium binding and document live only for the duration of one call:
//! the binding is created, used and dropped inside [`PdfBackend::load`] or
//! [`Rasterizer::rasterize`].

use crate::config::PageSelection;
use crate::error::ExtractError;
use crate::pipeline::layout::{BoundingBox, Glyph};
use image::RgbaImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Native data of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct NativePage {
    /// 1-indexed page number.
    pub number: usize,
    /// Raw page text, or why it could not be read.
    pub text: Result<String, String>,
    /// Character primitives, or why they could not be read.
    pub glyphs: Result<Vec<Glyph>, String>,
}

impl NativePage {
    /// 0-indexed position in the document.
    pub fn index(&self) -> usize {
        self.number.saturating_sub(1)
    }
}

/// An opened document: real page count plus native data of the selected pages.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub page_count: usize,
    /// Selected pages, in page order.
    pub pages: Vec<NativePage>,
}

/// Opens documents and reads their native text layer.
pub trait PdfBackend: Send + Sync {
    /// Open `bytes` and read the pages matched by `selection`.
    ///
    /// Only failure to open the document is an error; per-page problems are
    /// reported inside each [`NativePage`]. `name` is used in error messages.
    fn load(
        &self,
        bytes: &[u8],
        selection: &PageSelection,
        name: &str,
    ) -> Result<LoadedDocument, ExtractError>;
}

/// Renders a page to pixels for OCR.
pub trait Rasterizer: Send + Sync {
    /// Render page `page_index` (0-based) of `document` at `scale` × its
    /// point size.
    fn rasterize(&self, document: &[u8], page_index: usize, scale: f32) -> Result<RgbaImage, String>;
}

// ── pdfium implementation ────────────────────────────────────────────────

/// `pdfium-render` implementation of [`PdfBackend`] and [`Rasterizer`].
#[derive(Debug, Clone, Default)]
pub struct PdfiumBackend {
    library_path: Option<PathBuf>,
    password: Option<String>,
}

impl PdfiumBackend {
    /// `library_path` may name the shared library itself or the directory
    /// holding it; `None` binds the system library.
    pub fn new(library_path: Option<PathBuf>, password: Option<String>) -> Self {
        Self {
            library_path,
            password,
        }
    }

    fn bind(&self) -> Result<Pdfium, String> {
        bind_pdfium(self.library_path.as_deref())
    }
}

/// Bind to libpdfium at `library_path` (file or directory), or the system one.
pub fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, String> {
    let bindings = match library_path {
        Some(dir) if dir.is_dir() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
        }
        Some(file) => Pdfium::bind_to_library(file),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| format!("{e:?}"))?;
    Ok(Pdfium::new(bindings))
}

fn open_error(err: PdfiumError, name: &str, password: Option<&str>) -> ExtractError {
    let detail = format!("{err:?}");
    if detail.to_lowercase().contains("password") {
        if password.is_some() {
            ExtractError::WrongPassword {
                name: name.to_string(),
            }
        } else {
            ExtractError::PasswordRequired {
                name: name.to_string(),
            }
        }
    } else {
        ExtractError::InvalidDocument {
            name: name.to_string(),
            detail,
        }
    }
}

impl PdfBackend for PdfiumBackend {
    fn load(
        &self,
        bytes: &[u8],
        selection: &PageSelection,
        name: &str,
    ) -> Result<LoadedDocument, ExtractError> {
        let pdfium = self.bind().map_err(ExtractError::PdfiumBindingFailed)?;
        let password = self.password.as_deref();
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| open_error(e, name, password))?;

        let pages = document.pages();
        let page_count = pages.len() as usize;
        info!("PDF loaded: {} pages", page_count);

        let native = selection
            .to_indices(page_count)
            .into_iter()
            .map(|idx| match pages.get(idx as u16) {
                Ok(page) => read_native_page(&page, idx + 1),
                Err(e) => {
                    let detail = format!("{e:?}");
                    NativePage {
                        number: idx + 1,
                        text: Err(detail.clone()),
                        glyphs: Err(detail),
                    }
                }
            })
            .collect();

        Ok(LoadedDocument {
            page_count,
            pages: native,
        })
    }
}

impl Rasterizer for PdfiumBackend {
    fn rasterize(&self, document: &[u8], page_index: usize, scale: f32) -> Result<RgbaImage, String> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(document, self.password.as_deref())
            .map_err(|e| format!("{e:?}"))?;
        let page = document
            .pages()
            .get(page_index as u16)
            .map_err(|e| format!("{e:?}"))?;

        let config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| format!("{e:?}"))?;
        Ok(bitmap.as_image().to_rgba8())
    }
}

fn read_native_page(page: &PdfPage, number: usize) -> NativePage {
    let text_page = match page.text() {
        Ok(t) => t,
        Err(e) => {
            let detail = format!("{e:?}");
            return NativePage {
                number,
                text: Err(detail.clone()),
                glyphs: Err(detail),
            };
        }
    };

    let text = text_page.all();
    let glyphs = collect_glyphs(&text_page);
    debug!(
        "Page {}: {} chars of text, {} glyphs",
        number,
        text.len(),
        glyphs.len()
    );
    NativePage {
        number,
        text: Ok(text),
        glyphs: Ok(glyphs),
    }
}

/// Character primitives of a page in content order.
///
/// Whitespace that pdfium generates between words often has no bounds; it is
/// kept (with an empty box) because it still separates words.
fn collect_glyphs(text_page: &PdfPageText) -> Vec<Glyph> {
    let mut glyphs = Vec::new();
    for ch in text_page.chars().iter() {
        let Some(c) = ch.unicode_string().and_then(|s| s.chars().next()) else {
            continue;
        };
        let font_size = ch.scaled_font_size().value;
        match ch.loose_bounds() {
            Ok(b) => glyphs.push(Glyph::new(
                c,
                BoundingBox::new(b.left().value, b.bottom().value, b.right().value, b.top().value),
                font_size,
            )),
            Err(_) if c.is_whitespace() => glyphs.push(Glyph::new(
                c,
                BoundingBox::new(0.0, 0.0, 0.0, 0.0),
                font_size,
            )),
            Err(_) => {}
        }
    }
    glyphs
}
