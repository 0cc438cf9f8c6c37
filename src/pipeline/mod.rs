//! Pipeline stages for PDF-to-PNG conversion.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode
//! (bytes)   (pdfium)   (PNG)
//! ```
//!
//! 1. [`input`]  — load the user-supplied path, URL or buffer into memory
//! 2. [`render`] — bind the engine and rasterise page one; blocking, so the
//!    converter runs it in `spawn_blocking`
//! 3. [`encode`] — compress the rendered surface to lossless PNG

pub mod encode;
pub mod input;
pub mod render;
