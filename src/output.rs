//! Result types returned to callers.

use crate::error::{ConvertError, ErrorKind};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::io::Write;
use std::path::{Path, PathBuf};

/// MIME type of every file this crate produces.
pub const PNG_MIME: &str = "image/png";

/// Outcome of one [`crate::convert()`] call.
///
/// Exactly one side is populated: on success `image_url` is non-empty and
/// `file` is `Some`; on failure `image_url` is empty, `file` is `None` and
/// `error` holds a human-readable description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    /// `data:image/png;base64,…` reference, directly displayable.
    pub image_url: String,
    pub file: Option<ImageFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failure class, for callers that branch on it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ConversionResult {
    pub fn success(file: ImageFile) -> Self {
        Self {
            image_url: file.data_url(),
            file: Some(file),
            error: None,
            error_kind: None,
        }
    }

    pub fn failure(err: &ConvertError) -> Self {
        Self {
            image_url: String::new(),
            file: None,
            error: Some(err.user_message()),
            error_kind: Some(err.kind()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.file.is_some()
    }

    /// Collapse into a `Result`, keeping the error text.
    pub fn into_result(self) -> Result<ImageFile, String> {
        match (self.file, self.error) {
            (Some(file), _) => Ok(file),
            (None, Some(error)) => Err(error),
            (None, None) => Err("conversion produced no image".to_string()),
        }
    }
}

/// A named, encoded PNG.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: PNG_MIME,
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Self-contained URL embedding the bytes.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    /// Write the PNG to `path` atomically.
    ///
    /// The bytes go to a temp file in the destination directory which is then
    /// renamed over `path`, so readers never observe a partial image.
    pub fn write_to(&self, path: &Path) -> Result<(), ConvertError> {
        let fail = |source: std::io::Error| ConvertError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(fail)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(fail)?;
        tmp.write_all(&self.bytes).map_err(fail)?;
        tmp.persist(path).map_err(|e| fail(e.error))?;
        Ok(())
    }

    /// Write the PNG under its own name inside `dir`; returns the full path.
    pub fn write_into_dir(&self, dir: &Path) -> Result<PathBuf, ConvertError> {
        let path = dir.join(&self.name);
        self.write_to(&path)?;
        Ok(path)
    }
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

// Bytes are reported by size only; the data URL already carries them.
impl Serialize for ImageFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ImageFile", 3)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("mime_type", self.mime_type)?;
        s.serialize_field("size", &self.bytes.len())?;
        s.end()
    }
}

/// Document information read by [`crate::inspect`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
    /// Size of page one in points (1/72 in).
    pub first_page_size: Option<(f32, f32)>,
}

impl DocumentMetadata {
    /// Pixel size page one renders at for a given scale, before any cap.
    pub fn rendered_size(&self, scale: f32) -> Option<(u32, u32)> {
        self.first_page_size
            .map(|(w, h)| ((w * scale).round() as u32, (h * scale).round() as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ImageFile {
        ImageFile::new("report.png", vec![0x89, b'P', b'N', b'G'])
    }

    #[test]
    fn success_populates_url_and_file_only() {
        let r = ConversionResult::success(sample());
        assert!(r.is_success());
        assert_eq!(r.image_url, "data:image/png;base64,iVBORw==");
        assert!(r.error.is_none());
        assert!(r.error_kind.is_none());
    }

    #[test]
    fn failure_populates_error_only() {
        let r = ConversionResult::failure(&ConvertError::EmptyImage);
        assert!(!r.is_success());
        assert_eq!(r.image_url, "");
        assert!(r.file.is_none());
        assert_eq!(r.error.as_deref(), Some("Failed to create image blob"));
        assert_eq!(r.error_kind, Some(ErrorKind::Encoding));
    }

    #[test]
    fn into_result_keeps_error_text() {
        let r = ConversionResult::failure(&ConvertError::NoPages {
            name: "empty.pdf".into(),
        });
        let err = r.into_result().unwrap_err();
        assert!(err.contains("empty.pdf"));
    }

    #[test]
    fn json_reports_file_size_not_bytes() {
        let json = serde_json::to_value(ConversionResult::success(sample())).unwrap();
        assert_eq!(json["file"]["name"], "report.png");
        assert_eq!(json["file"]["mime_type"], "image/png");
        assert_eq!(json["file"]["size"], 4);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failure_json_has_null_file() {
        let err = ConvertError::EngineUnavailable("missing".into());
        let json = serde_json::to_value(ConversionResult::failure(&err)).unwrap();
        assert!(json["file"].is_null());
        assert_eq!(json["image_url"], "");
        assert_eq!(json["error_kind"], "environment");
    }

    #[test]
    fn write_into_dir_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample().write_into_dir(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("report.png"));
        assert_eq!(std::fs::read(&path).unwrap(), sample().bytes);
    }

    #[test]
    fn write_to_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.png");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"old").unwrap();

        sample().write_to(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), sample().bytes);
    }

    #[test]
    fn rendered_size_scales_points() {
        let meta = DocumentMetadata {
            first_page_size: Some((612.0, 792.0)),
            ..Default::default()
        };
        assert_eq!(meta.rendered_size(2.0), Some((1224, 1584)));
        assert_eq!(DocumentMetadata::default().rendered_size(2.0), None);
    }
}
