//! Output filename derivation.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

// Case-insensitive on the extension only; the stem is kept verbatim.
static PDF_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.pdf$").unwrap());

/// Name of the PNG produced from a document called `original`.
///
/// ```rust
/// assert_eq!(pdf2img::derive_image_name("report.pdf"), "report.png");
/// assert_eq!(pdf2img::derive_image_name("REPORT.PDF"), "REPORT.png");
/// ```
pub fn derive_image_name(original: &str) -> String {
    format!("{}.png", PDF_SUFFIX.replace(original, ""))
}

/// Original name for a document read from `path`: its final component.
pub fn name_from_path(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string())
}
