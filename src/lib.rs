//! # pdf2img
//!
//! Render the first page of a PDF document to a PNG image.
//!
//! The result is a [`ConversionResult`]: on success a self-contained
//! `data:image/png;base64,…` URL plus an [`ImageFile`] holding the encoded
//! bytes under a name derived from the input (`report.pdf` → `report.png`);
//! on failure an empty URL, no file, and an error message. The conversion
//! functions never return `Err`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Engine  locate + bind PDFium (downloaded on first use if allowed)
//!  ├─ 2. Render  page 1 at 2× scale, anti-aliased (spawn_blocking)
//!  ├─ 3. Encode  lossless PNG
//!  └─ 4. Output  data URL + named file
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2img::{convert_path, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let result = convert_path("report.pdf", &ConversionConfig::default()).await;
//!     match result.file {
//!         Some(file) => file.write_into_dir(std::path::Path::new(".")).map(|_| ()).unwrap(),
//!         None => eprintln!("{}", result.error.unwrap_or_default()),
//!     }
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2img` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2img = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod naming;
pub mod output;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, Smoothing};
pub use convert::{
    convert, convert_bytes, convert_input, convert_path, convert_sync, inspect, Converter,
};
pub use error::{ConvertError, ErrorKind};
pub use naming::derive_image_name;
pub use output::{ConversionResult, DocumentMetadata, ImageFile};
pub use pipeline::input::SourceDocument;
pub use pipeline::render::{PdfiumRasterizer, Rasterizer};
