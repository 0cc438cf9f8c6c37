//! Conversion entry points.
//!
//! [`Converter::convert`] is the boundary of the library's contract: every
//! error raised below it, including a panic inside the render thread, is
//! logged and folded into [`ConversionResult::failure`]. Nothing escapes as
//! an `Err` or an unwinding panic.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::naming::derive_image_name;
use crate::output::{ConversionResult, DocumentMetadata, ImageFile};
use crate::pipeline::encode;
use crate::pipeline::input::SourceDocument;
use crate::pipeline::render::{PdfiumRasterizer, Rasterizer};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::RuntimeFlavor;
use tracing::{error, info};

/// Converts the first page of PDF documents to PNG.
///
/// Holds the configuration and the rendering engine it was built with; cheap
/// to clone and safe to share between tasks. Concurrent calls are
/// independent of each other.
#[derive(Clone)]
pub struct Converter {
    config: Arc<ConversionConfig>,
    rasterizer: Arc<dyn Rasterizer>,
}

impl Converter {
    /// A converter that renders with PDFium.
    pub fn new(config: ConversionConfig) -> Self {
        let rasterizer = Arc::new(PdfiumRasterizer::from_config(&config));
        Self::with_rasterizer(config, rasterizer)
    }

    /// A converter that renders with a caller-supplied engine.
    pub fn with_rasterizer(config: ConversionConfig, rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self {
            config: Arc::new(config),
            rasterizer,
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Render page one of `document` and package it as a PNG.
    pub async fn convert(&self, document: &SourceDocument) -> ConversionResult {
        let start = Instant::now();
        info!("Converting '{}' ({} bytes)", document.name(), document.bytes().len());

        match self.try_convert(document).await {
            Ok(file) => {
                info!(
                    "Converted '{}' → '{}' ({} bytes) in {}ms",
                    document.name(),
                    file.name,
                    file.size(),
                    start.elapsed().as_millis()
                );
                ConversionResult::success(file)
            }
            Err(e) => {
                error!("PDF to image conversion of '{}' failed: {}", document.name(), e);
                ConversionResult::failure(&e)
            }
        }
    }

    /// Like [`Converter::convert`], for synchronous callers.
    ///
    /// Outside a runtime a temporary tokio runtime is created. Inside a
    /// multi-threaded runtime the current worker is handed to
    /// [`tokio::task::block_in_place`]; a current-thread runtime cannot block
    /// on itself, so the call reports a failure instead.
    pub fn convert_blocking(&self, document: &SourceDocument) -> ConversionResult {
        let outcome = match tokio::runtime::Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                return tokio::task::block_in_place(|| handle.block_on(self.convert(document)));
            }
            Ok(_) => Err(ConvertError::Internal(
                "convert_sync cannot block a current-thread runtime; await convert() instead"
                    .to_string(),
            )),
            Err(_) => tokio::runtime::Runtime::new().map_err(|e| {
                ConvertError::Internal(format!("Failed to create tokio runtime: {e}"))
            }),
        };

        match outcome {
            Ok(rt) => rt.block_on(self.convert(document)),
            Err(e) => {
                error!("{e}");
                ConversionResult::failure(&e)
            }
        }
    }

    /// Read document metadata without rendering.
    pub async fn inspect(&self, document: &SourceDocument) -> Result<DocumentMetadata, ConvertError> {
        self.config.validate()?;
        let rasterizer = Arc::clone(&self.rasterizer);
        let config = Arc::clone(&self.config);
        let document = document.clone();

        tokio::task::spawn_blocking(move || rasterizer.metadata(&document, &config))
            .await
            .map_err(|e| ConvertError::Internal(format!("Metadata task panicked: {e}")))?
    }

    async fn try_convert(&self, document: &SourceDocument) -> Result<ImageFile, ConvertError> {
        self.config.validate()?;
        let rasterizer = Arc::clone(&self.rasterizer);
        let config = Arc::clone(&self.config);
        let owned = document.clone();

        // Rendering and PNG compression are both CPU-bound; keep them together
        // off the async workers.
        let png = tokio::task::spawn_blocking(move || {
            let image = rasterizer.render_first_page(&owned, &config)?;
            encode::encode_png(&image)
        })
        .await
        .map_err(|e| ConvertError::Internal(format!("Render task panicked: {e}")))??;

        Ok(ImageFile::new(derive_image_name(document.name()), png))
    }
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("config", &self.config)
            .field("rasterizer", &"<dyn Rasterizer>")
            .finish()
    }
}

/// Convert the first page of `document` to PNG.
///
/// This is the primary entry point for the library. It never fails: errors
/// are reported through [`ConversionResult::error`].
///
/// # Example
/// ```rust,no_run
/// use pdf2img::{convert, ConversionConfig, SourceDocument};
///
/// # #[tokio::main]
/// # async fn main() {
/// let bytes = std::fs::read("report.pdf").unwrap();
/// let document = SourceDocument::new("report.pdf", bytes);
/// let result = convert(&document, &ConversionConfig::default()).await;
/// match result.file {
///     Some(file) => println!("{} ({} bytes)", file.name, file.size()),
///     None => eprintln!("{}", result.error.unwrap_or_default()),
/// }
/// # }
/// ```
pub async fn convert(document: &SourceDocument, config: &ConversionConfig) -> ConversionResult {
    Converter::new(config.clone()).convert(document).await
}

/// Convert PDF bytes held in memory; `original_name` names the output.
pub async fn convert_bytes(
    bytes: impl Into<Arc<[u8]>>,
    original_name: &str,
    config: &ConversionConfig,
) -> ConversionResult {
    convert(&SourceDocument::new(original_name, bytes), config).await
}

/// Read a local file or download an http(s) URL, then convert it.
///
/// Read and download failures become failure results like any other error.
pub async fn convert_input(input: impl AsRef<str>, config: &ConversionConfig) -> ConversionResult {
    let input = input.as_ref();
    match SourceDocument::resolve(input, config.download_timeout_secs).await {
        Ok(document) => convert(&document, config).await,
        Err(e) => {
            error!("Reading '{}' failed: {}", input, e);
            ConversionResult::failure(&e)
        }
    }
}

/// Read a local file and convert it.
pub async fn convert_path(path: impl AsRef<Path>, config: &ConversionConfig) -> ConversionResult {
    let path = path.as_ref();
    match SourceDocument::from_path(path).await {
        Ok(document) => convert(&document, config).await,
        Err(e) => {
            error!("Reading '{}' failed: {}", path.display(), e);
            ConversionResult::failure(&e)
        }
    }
}

/// Synchronous wrapper around [`convert`].
pub fn convert_sync(document: &SourceDocument, config: &ConversionConfig) -> ConversionResult {
    Converter::new(config.clone()).convert_blocking(document)
}

/// Extract PDF metadata without converting.
pub async fn inspect(
    document: &SourceDocument,
    config: &ConversionConfig,
) -> Result<DocumentMetadata, ConvertError> {
    Converter::new(config.clone()).inspect(document).await
}
