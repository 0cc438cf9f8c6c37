//! PDF rasterisation: render page one to a `DynamicImage` via pdfium.
//!
//! ## Why a trait?
//!
//! [`Rasterizer`] is the narrow contract the converter needs from a
//! rendering engine: load bytes, draw the first page, report metadata.
//! [`PdfiumRasterizer`] is the production implementation. Tests substitute
//! their own to drive the converter's failure paths without a native library.
//!
//! ## Threading
//!
//! Every method here blocks. pdfium uses thread-local state and is not safe
//! to drive from async contexts, so the converter calls these from
//! `tokio::task::spawn_blocking`.

use crate::config::{ConversionConfig, Smoothing};
use crate::error::ConvertError;
use crate::output::DocumentMetadata;
use crate::pipeline::input::SourceDocument;
use image::DynamicImage;
use pdfium_loader::Fetch;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// A rendering engine capable of drawing the first page of a PDF.
pub trait Rasterizer: Send + Sync {
    /// Render page one of `document` according to `config`.
    fn render_first_page(
        &self,
        document: &SourceDocument,
        config: &ConversionConfig,
    ) -> Result<DynamicImage, ConvertError>;

    /// Read document metadata without rendering.
    fn metadata(
        &self,
        document: &SourceDocument,
        config: &ConversionConfig,
    ) -> Result<DocumentMetadata, ConvertError>;
}

/// Rasteriser backed by the PDFium shared library.
///
/// Binds a fresh engine handle on every call; the library path itself is
/// resolved once per process by `pdfium-loader`.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    library: Option<PathBuf>,
    fetch: Fetch,
}

impl PdfiumRasterizer {
    pub fn new(library: Option<PathBuf>, fetch: Fetch) -> Self {
        Self { library, fetch }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        let fetch = if config.download_engine {
            Fetch::Allowed
        } else {
            Fetch::Never
        };
        Self::new(config.engine_library.clone(), fetch)
    }

    /// Capability check: find and bind the engine, or fail with an
    /// environment error.
    fn engine(&self) -> Result<Pdfium, ConvertError> {
        let located = pdfium_loader::ensure_library(self.library.as_deref(), self.fetch, None)?;
        Ok(pdfium_loader::bind(&located.path)?)
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn render_first_page(
        &self,
        document: &SourceDocument,
        config: &ConversionConfig,
    ) -> Result<DynamicImage, ConvertError> {
        let pdfium = self.engine()?;
        let pdf = load(&pdfium, document, config.password.as_deref())?;

        let pages = pdf.pages();
        info!("PDF loaded: {} pages, rendering page 1", pages.len());
        if pages.len() == 0 {
            return Err(ConvertError::NoPages {
                name: document.name().to_string(),
            });
        }

        let page = pages.get(0).map_err(|e| ConvertError::RenderFailed {
            name: document.name().to_string(),
            detail: format!("{:?}", e),
        })?;
        debug!(
            "Page 1 is {:.1} x {:.1} pt, scale {}",
            page.width().value,
            page.height().value,
            config.scale
        );

        let bitmap = page
            .render_with_config(&render_config(config))
            .map_err(|e| ConvertError::RenderFailed {
                name: document.name().to_string(),
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        debug!("Rendered page 1 → {}x{} px", image.width(), image.height());
        Ok(image)
    }

    fn metadata(
        &self,
        document: &SourceDocument,
        config: &ConversionConfig,
    ) -> Result<DocumentMetadata, ConvertError> {
        let pdfium = self.engine()?;
        let pdf = load(&pdfium, document, config.password.as_deref())?;

        let metadata = pdf.metadata();
        let pages = pdf.pages();
        let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
            metadata
                .get(tag)
                .map(|t| t.value().to_string())
                .filter(|v| !v.is_empty())
        };
        let first_page_size = pages
            .get(0)
            .ok()
            .map(|p| (p.width().value, p.height().value));

        Ok(DocumentMetadata {
            title: get_meta(PdfDocumentMetadataTagType::Title),
            author: get_meta(PdfDocumentMetadataTagType::Author),
            subject: get_meta(PdfDocumentMetadataTagType::Subject),
            creator: get_meta(PdfDocumentMetadataTagType::Creator),
            producer: get_meta(PdfDocumentMetadataTagType::Producer),
            creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
            modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
            page_count: pages.len() as usize,
            pdf_version: format!("{:?}", pdf.version()),
            first_page_size,
        })
    }
}

/// Translate the config into pdfium's render settings.
pub fn render_config(config: &ConversionConfig) -> PdfRenderConfig {
    let cap = config.max_pixels.min(i32::MAX as u32) as i32;
    PdfRenderConfig::new()
        .scale_page_by_factor(config.scale)
        .set_maximum_width(cap)
        .set_maximum_height(cap)
        .set_text_smoothing(config.smoothing.text())
        .set_path_smoothing(config.smoothing.paths())
        .set_image_smoothing(config.smoothing.images())
        .use_print_quality(config.smoothing == Smoothing::High)
        .render_form_data(true)
}

fn load<'a>(
    pdfium: &'a Pdfium,
    document: &'a SourceDocument,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, ConvertError> {
    document.ensure_pdf_signature()?;
    let name = || document.name().to_string();
    pdfium
        .load_pdf_from_byte_slice(document.bytes(), password)
        .map_err(|e| {
            let detail = format!("{:?}", e);
            if detail.contains("Password") || detail.contains("password") {
                if password.is_some() {
                    ConvertError::WrongPassword { name: name() }
                } else {
                    ConvertError::PasswordRequired { name: name() }
                }
            } else {
                ConvertError::CorruptPdf {
                    name: name(),
                    detail,
                }
            }
        })
}
