//! # pdfium-loader
//!
//! Finds a usable [PDFium](https://pdfium.googlesource.com/pdfium/) shared
//! library for `pdfium-render`, fetching it on first use when allowed.
//!
//! Resolution order, first hit wins:
//!
//! 1. an explicit path handed in by the caller;
//! 2. `PDFIUM_LIB_PATH`;
//! 3. the per-version cache directory (see [`cache_dir`]);
//! 4. a download of the platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    when [`Fetch::Allowed`].
//!
//! An explicit path that does not exist is an error. It never falls through
//! to the other sources, so callers that pin a library get exactly that one.
//!
//! ```rust,no_run
//! use pdfium_loader::{bind, ensure_library, Fetch};
//!
//! let located = ensure_library(None, Fetch::Allowed, None).expect("PDFium unavailable");
//! let pdfium = bind(&located.path).expect("bind failed");
//! # drop(pdfium);
//! ```

use std::fmt;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Release tag of `bblanchon/pdfium-binaries` that downloads are pinned to.
pub const PDFIUM_VERSION: &str = "7690";

const RELEASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Environment variable naming an existing PDFium library.
pub const LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Environment variable overriding the cache root.
pub const CACHE_DIR_ENV: &str = "PDFIUM_CACHE_DIR";

/// Download progress sink: `(bytes_so_far, total_if_known)`.
pub type ProgressFn<'a> = &'a dyn Fn(u64, Option<u64>);

/// Errors raised while locating or binding PDFium.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("no PDFium build is published for {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("PDFium library not found at '{path}'")]
    Missing { path: PathBuf },

    #[error("PDFium is not installed and downloading is disabled (set PDFIUM_LIB_PATH)")]
    NotInstalled,

    #[error("cannot prepare cache directory '{path}': {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("downloading PDFium failed: {0}")]
    Download(String),

    #[error("unpacking PDFium archive failed: {0}")]
    Extract(String),

    #[error("cannot load PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

/// Whether [`ensure_library`] may reach the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    Allowed,
    Never,
}

/// Where a resolved library came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibrarySource {
    Explicit,
    Environment,
    Cache,
    Downloaded,
}

impl fmt::Display for LibrarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LibrarySource::Explicit => "explicit path",
            LibrarySource::Environment => LIB_PATH_ENV,
            LibrarySource::Cache => "cache",
            LibrarySource::Downloaded => "download",
        })
    }
}

/// A library file on disk together with how it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub path: PathBuf,
    pub source: LibrarySource,
}

/// Release asset layout for one OS/arch pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Asset name in the release, e.g. `pdfium-linux-x64.tgz`.
    pub archive: &'static str,
    /// Path of the library inside the archive.
    pub member: &'static str,
    /// File name written to the cache.
    pub file_name: &'static str,
}

impl Platform {
    /// Layout for the platform this binary was compiled for.
    pub fn current() -> Result<Self, LoaderError> {
        let (os, arch) = (std::env::consts::OS, std::env::consts::ARCH);
        Self::for_target(os, arch).ok_or_else(|| LoaderError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        })
    }

    /// Layout for an arbitrary `std::env::consts` OS/arch pair.
    pub fn for_target(os: &str, arch: &str) -> Option<Self> {
        const DYLIB: (&str, &str) = ("lib/libpdfium.dylib", "libpdfium.dylib");
        const SO: (&str, &str) = ("lib/libpdfium.so", "libpdfium.so");
        const DLL: (&str, &str) = ("bin/pdfium.dll", "pdfium.dll");

        let (archive, (member, file_name)) = match (os, arch) {
            ("macos", "aarch64") => ("pdfium-mac-arm64.tgz", DYLIB),
            ("macos", "x86_64") => ("pdfium-mac-x64.tgz", DYLIB),
            ("linux", "x86_64") => ("pdfium-linux-x64.tgz", SO),
            ("linux", "aarch64") => ("pdfium-linux-arm64.tgz", SO),
            ("windows", "x86_64") => ("pdfium-win-x64.tgz", DLL),
            ("windows", "aarch64") => ("pdfium-win-arm64.tgz", DLL),
            ("windows", "x86") => ("pdfium-win-x86.tgz", DLL),
            _ => return None,
        };
        Some(Self {
            archive,
            member,
            file_name,
        })
    }

    /// Download URL of this platform's archive at [`PDFIUM_VERSION`].
    pub fn download_url(&self) -> String {
        format!("{RELEASE_URL}/chromium%2F{PDFIUM_VERSION}/{}", self.archive)
    }
}

/// Per-version cache directory.
///
/// `$PDFIUM_CACHE_DIR/pdfium-{VERSION}` when set, otherwise
/// `{user cache dir}/pdf2img/pdfium-{VERSION}`.
pub fn cache_dir() -> PathBuf {
    let versioned = format!("pdfium-{PDFIUM_VERSION}");
    if let Some(root) = std::env::var_os(CACHE_DIR_ENV) {
        return PathBuf::from(root).join(versioned);
    }
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("pdf2img")
        .join(versioned)
}

/// Resolves a library without touching the network.
///
/// Returns `Ok(None)` when nothing is installed yet.
pub fn locate(explicit: Option<&Path>) -> Result<Option<Located>, LoaderError> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(LoaderError::Missing {
                path: path.to_path_buf(),
            });
        }
        return Ok(Some(Located {
            path: path.to_path_buf(),
            source: LibrarySource::Explicit,
        }));
    }

    if let Some(env_path) = std::env::var_os(LIB_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(Some(Located {
                path,
                source: LibrarySource::Environment,
            }));
        }
        warn!("{LIB_PATH_ENV}='{}' does not exist, ignoring", path.display());
    }

    let cached = cache_dir().join(Platform::current()?.file_name);
    Ok(cached.exists().then_some(Located {
        path: cached,
        source: LibrarySource::Cache,
    }))
}

/// `true` when [`ensure_library`] would succeed without a download.
pub fn is_installed() -> bool {
    matches!(locate(None), Ok(Some(_)))
}

static DEFAULT_LIBRARY: OnceLock<Located> = OnceLock::new();

/// Resolves a library, downloading it into [`cache_dir`] when allowed.
///
/// The default resolution (no explicit path) is memoised for the process.
/// Concurrent first calls may both download; each unpacks into its own temp
/// file and the last persist wins, so every caller sees a complete library.
pub fn ensure_library(
    explicit: Option<&Path>,
    fetch: Fetch,
    on_progress: Option<ProgressFn<'_>>,
) -> Result<Located, LoaderError> {
    if explicit.is_none() {
        if let Some(found) = DEFAULT_LIBRARY.get() {
            return Ok(found.clone());
        }
    }

    let found = match locate(explicit)? {
        Some(found) => found,
        None if fetch == Fetch::Allowed => download_into_cache(on_progress)?,
        None => return Err(LoaderError::NotInstalled),
    };
    debug!("PDFium resolved via {}: {}", found.source, found.path.display());

    if explicit.is_none() {
        let _ = DEFAULT_LIBRARY.set(found.clone());
    }
    Ok(found)
}

/// Binds `pdfium-render` to the library at `path`.
pub fn bind(path: &Path) -> Result<Pdfium, LoaderError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| LoaderError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn download_into_cache(on_progress: Option<ProgressFn<'_>>) -> Result<Located, LoaderError> {
    let platform = Platform::current()?;
    let dir = cache_dir();
    std::fs::create_dir_all(&dir).map_err(|source| LoaderError::CacheDir {
        path: dir.clone(),
        source,
    })?;

    let url = platform.download_url();
    info!("Fetching PDFium {PDFIUM_VERSION} from {url}");
    let archive = fetch_archive(&url, on_progress)?;

    let dest = dir.join(platform.file_name);
    install_member(&archive, platform.member, &dest)?;

    info!("PDFium cached at {}", dest.display());
    Ok(Located {
        path: dest,
        source: LibrarySource::Downloaded,
    })
}

fn fetch_archive(url: &str, on_progress: Option<ProgressFn<'_>>) -> Result<Vec<u8>, LoaderError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-loader/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| LoaderError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| LoaderError::Download(format!("GET {url}: {e}")))?;
    if !response.status().is_success() {
        return Err(LoaderError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut body = Vec::with_capacity(total.unwrap_or(32 << 20) as usize);
    let mut chunk = vec![0u8; 64 << 10];
    loop {
        let n = match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(LoaderError::Download(format!("read: {e}"))),
        };
        body.extend_from_slice(&chunk[..n]);
        if let Some(report) = on_progress {
            report(body.len() as u64, total);
        }
    }
    Ok(body)
}

/// Unpacks `member` into a private temp file beside `dest`, then persists it.
///
/// Readers of `dest` only ever observe a complete file, even with several
/// installers racing on a cold cache.
fn install_member(archive: &[u8], member: &str, dest: &Path) -> Result<(), LoaderError> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| LoaderError::Extract(format!("temp file in {}: {e}", dir.display())))?;

    unpack_member(archive, member, staged.as_file_mut())?;
    staged
        .as_file()
        .sync_all()
        .map_err(|e| LoaderError::Extract(e.to_string()))?;

    match staged.persist(dest) {
        Ok(_) => Ok(()),
        // Another installer holds the destination open (Windows); its copy is
        // just as complete.
        Err(e) if dest.exists() => {
            debug!("keeping existing {}: {}", dest.display(), e.error);
            Ok(())
        }
        Err(e) => Err(LoaderError::Extract(format!("persist into cache: {}", e.error))),
    }
}

/// Copies `member` out of a gzipped tarball into `out`.
fn unpack_member(archive: &[u8], member: &str, out: &mut impl Write) -> Result<u64, LoaderError> {
    let extract = |e: std::io::Error| LoaderError::Extract(e.to_string());
    let mut tarball = tar::Archive::new(flate2::read::GzDecoder::new(archive));

    for entry in tarball.entries().map_err(extract)? {
        let mut entry = entry.map_err(extract)?;
        if entry.path().map_err(extract)?.as_os_str() == member {
            return std::io::copy(&mut entry, out).map_err(extract);
        }
    }
    Err(LoaderError::Extract(format!("'{member}' missing from archive")))
}
