//! Input resolution: obtain the PDF bytes and the name they were supplied under.
//!
//! PDFium loads from a byte slice, so every input form (path, URL, buffer)
//! collapses into a [`SourceDocument`] held in memory. The bytes sit behind
//! an `Arc` so the document can be handed to the blocking render thread
//! without copying.

use crate::error::ConvertError;
use crate::naming;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Header must appear within this many leading bytes.
const SIGNATURE_WINDOW: usize = 1024;

/// A PDF held in memory together with its original file name.
#[derive(Clone)]
pub struct SourceDocument {
    name: String,
    bytes: Arc<[u8]>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a local file; the original name is the path's final component.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConvertError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConvertError::ReadFailed {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(Self::new(naming::name_from_path(path), bytes))
    }

    /// Download a document; the original name is the last URL path segment.
    pub async fn from_url(url: &str, timeout_secs: u64) -> Result<Self, ConvertError> {
        info!("Downloading PDF from: {}", url);
        let failed = |reason: String| ConvertError::DownloadFailed {
            url: url.to_string(),
            reason,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| failed(e.to_string()))?;

        let response = client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ConvertError::DownloadTimeout {
                    url: url.to_string(),
                    secs: timeout_secs,
                }
            } else {
                failed(e.to_string())
            }
        })?;
        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
        info!("Downloaded {} bytes", bytes.len());
        Ok(Self::new(name_from_url(url), bytes.to_vec()))
    }

    /// Resolve a CLI-style argument: http(s) URLs are downloaded, anything
    /// else is read from disk.
    pub async fn resolve(input: &str, timeout_secs: u64) -> Result<Self, ConvertError> {
        if is_url(input) {
            Self::from_url(input, timeout_secs).await
        } else {
            Self::from_path(input).await
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Fail fast on content that cannot be a PDF, before the engine sees it.
    pub fn ensure_pdf_signature(&self) -> Result<(), ConvertError> {
        let head = &self.bytes[..self.bytes.len().min(SIGNATURE_WINDOW)];
        if head.windows(5).any(|w| w == b"%PDF-") {
            return Ok(());
        }
        Err(ConvertError::NotAPdf {
            name: self.name.clone(),
            magic: self.bytes.iter().take(4).copied().collect(),
        })
    }
}

impl std::fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDocument")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

fn name_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty())
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}
