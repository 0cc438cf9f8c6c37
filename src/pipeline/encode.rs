//! Image encoding: `DynamicImage` → PNG bytes.
//!
//! PNG is lossless, so there is no quality knob. A surface with no pixels is
//! reported as [`ConvertError::EmptyImage`] instead of an empty file.

use crate::error::ConvertError;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rendered surface as PNG.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, ConvertError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(ConvertError::EmptyImage);
    }

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    if buf.is_empty() {
        return Err(ConvertError::EmptyImage);
    }

    debug!(
        "Encoded {}x{} surface → {} PNG bytes",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}
