//! Error types for the pdf2img library.
//!
//! [`ConvertError`] is the internal currency of the pipeline. It never
//! escapes [`crate::convert()`]: the outer boundary folds every variant into
//! the failure shape of [`crate::ConversionResult`]. Functions outside that
//! contract ([`crate::inspect`], [`crate::ConversionConfigBuilder::build`],
//! [`crate::SourceDocument::from_path`]) return it directly.
//!
//! Each variant belongs to one [`ErrorKind`], which is what callers should
//! match on when they care about the class of failure rather than its detail.

use std::path::PathBuf;
use thiserror::Error;

/// Message reported when the encoder yields nothing usable.
pub const EMPTY_IMAGE_MESSAGE: &str = "Failed to create image blob";

/// Coarse failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No rendering engine or drawing surface is available.
    Environment,
    /// The surface produced no encodable bytes.
    Encoding,
    /// Reading, loading, page access or rendering failed.
    Upstream,
}

/// All errors raised while turning a PDF into a PNG.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Environment ───────────────────────────────────────────────────────
    /// PDFium could not be located or bound.
    #[error(
        "PDF rendering engine is unavailable: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or allow the engine download."
    )]
    EngineUnavailable(String),

    // ── Encoding ──────────────────────────────────────────────────────────
    /// The rendered surface had no pixels, or the encoder wrote no bytes.
    #[error("Failed to create image blob")]
    EmptyImage,

    /// The PNG encoder rejected the surface.
    #[error("PNG encoding failed: {0}")]
    EncodeFailed(#[from] image::ImageError),

    // ── Input ─────────────────────────────────────────────────────────────
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// Content does not start with the `%PDF` signature.
    #[error("'{name}' is not a PDF (first bytes: {magic:?})")]
    NotAPdf { name: String, magic: Vec<u8> },

    // ── Document ──────────────────────────────────────────────────────────
    #[error("PDF '{name}' could not be loaded: {detail}")]
    CorruptPdf { name: String, detail: String },

    #[error("PDF '{name}' is encrypted and requires a password")]
    PasswordRequired { name: String },

    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    #[error("PDF '{name}' has no pages")]
    NoPages { name: String },

    #[error("Rendering page 1 of '{name}' failed: {detail}")]
    RenderFailed { name: String, detail: String },

    // ── Output ────────────────────────────────────────────────────────────
    #[error("Failed to write image '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config ────────────────────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::EngineUnavailable(_) => ErrorKind::Environment,
            ConvertError::EmptyImage | ConvertError::EncodeFailed(_) => ErrorKind::Encoding,
            _ => ErrorKind::Upstream,
        }
    }

    /// The string placed in [`crate::ConversionResult::error`].
    ///
    /// Every encoding failure reports the fixed blob message (the detail goes
    /// to the log); everything else is prefixed so the user sees which
    /// operation failed.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Encoding => EMPTY_IMAGE_MESSAGE.to_string(),
            _ => format!("Failed to convert PDF: {self}"),
        }
    }
}

impl From<pdfium_loader::LoaderError> for ConvertError {
    fn from(e: pdfium_loader::LoaderError) -> Self {
        ConvertError::EngineUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        assert_eq!(
            ConvertError::EngineUnavailable("no lib".into()).kind(),
            ErrorKind::Environment
        );
        assert_eq!(ConvertError::EmptyImage.kind(), ErrorKind::Encoding);
        assert_eq!(
            ConvertError::CorruptPdf {
                name: "a.pdf".into(),
                detail: "xref".into()
            }
            .kind(),
            ErrorKind::Upstream
        );
        assert_eq!(
            ConvertError::NoPages { name: "a.pdf".into() }.kind(),
            ErrorKind::Upstream
        );
    }

    #[test]
    fn empty_image_uses_blob_message() {
        assert_eq!(ConvertError::EmptyImage.user_message(), "Failed to create image blob");
    }

    #[test]
    fn encoder_errors_also_use_blob_message() {
        let e = ConvertError::EncodeFailed(image::ImageError::Limits(
            image::error::LimitError::from_kind(image::error::LimitErrorKind::InsufficientMemory),
        ));
        assert_eq!(e.kind(), ErrorKind::Encoding);
        assert_eq!(e.user_message(), EMPTY_IMAGE_MESSAGE);
    }

    #[test]
    fn upstream_message_embeds_detail() {
        let e = ConvertError::RenderFailed {
            name: "scan.pdf".into(),
            detail: "PdfiumLibraryInternalError(Unknown)".into(),
        };
        let msg = e.user_message();
        assert!(msg.starts_with("Failed to convert PDF: "), "got: {msg}");
        assert!(msg.contains("scan.pdf"));
        assert!(msg.contains("PdfiumLibraryInternalError"));
    }

    #[test]
    fn loader_errors_are_environment_errors() {
        let e: ConvertError = pdfium_loader::LoaderError::NotInstalled.into();
        assert_eq!(e.kind(), ErrorKind::Environment);
        assert!(e.to_string().contains("PDFIUM_LIB_PATH"));
    }
}
