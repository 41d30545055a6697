//! # chromium-auto
//!
//! Auto-download and cache a headless Chromium build at runtime, so that
//! users of a CDP client no longer need to install Chrome themselves or point
//! the client at an executable by hand.
//!
//! ## How it works
//!
//! On first call to [`ensure_chromium`]:
//!
//! 1. Honours `CHROMIUM_EXECUTABLE` when it points to an existing file.
//! 2. Checks `~/.cache/article2pdf/chrome-headless-shell-{VERSION}/` for the
//!    platform executable.
//! 3. If absent, downloads the matching `chrome-headless-shell` zip from the
//!    [Chrome for Testing](https://googlechromelabs.github.io/chrome-for-testing/)
//!    bucket and unpacks it next to the cache directory, then renames the
//!    staging directory into place so a half-extracted tree is never visible.
//!
//! Subsequent calls skip the network entirely.
//!
//! ## Usage
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), chromium_auto::ChromiumAutoError> {
//! let exe = chromium_auto::ensure_chromium(Some(&|downloaded, total| {
//!     if let Some(t) = total {
//!         eprint!("\rDownloading Chromium: {}/{} bytes", downloaded, t);
//!     }
//! }))
//! .await?;
//! println!("headless shell at {}", exe.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Platform support
//!
//! | OS      | Arch    | Archive                                |
//! |---------|---------|----------------------------------------|
//! | macOS   | arm64   | `chrome-headless-shell-mac-arm64.zip`  |
//! | macOS   | x86_64  | `chrome-headless-shell-mac-x64.zip`    |
//! | Linux   | x86_64  | `chrome-headless-shell-linux64.zip`    |
//! | Windows | x86_64  | `chrome-headless-shell-win64.zip`      |
//! | Windows | x86     | `chrome-headless-shell-win32.zip`      |
//!
//! Linux/aarch64 has no Chrome for Testing build; set `CHROMIUM_EXECUTABLE`
//! to a distribution Chromium there.
//!
//! ## Environment variable overrides
//!
//! - `CHROMIUM_EXECUTABLE` — path to an existing Chromium/Chrome binary; skips download.
//! - `CHROMIUM_AUTO_CACHE_DIR` — override the default cache directory.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;
use tracing::{debug, info, warn};

// ── Public constants ─────────────────────────────────────────────────────────

/// The Chrome for Testing release used for downloads.
pub const CHROME_VERSION: &str = "131.0.6778.85";

/// Chrome for Testing bucket base URL.
const BASE_URL: &str = "https://storage.googleapis.com/chrome-for-testing-public";

/// Environment variable naming an existing executable.
pub const EXECUTABLE_ENV: &str = "CHROMIUM_EXECUTABLE";

/// Environment variable overriding the cache root.
pub const CACHE_DIR_ENV: &str = "CHROMIUM_AUTO_CACHE_DIR";

/// Progress callback: `(bytes_downloaded, total_size_option)`.
pub type DownloadProgress<'a> = &'a (dyn Fn(u64, Option<u64>) + Send + Sync);

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by chromium-auto operations.
#[derive(Error, Debug)]
pub enum ChromiumAutoError {
    /// The current OS/architecture combination has no published build.
    #[error("Unsupported platform: {os}/{arch} (set {EXECUTABLE_ENV} to an installed Chromium)")]
    UnsupportedPlatform { os: String, arch: String },

    /// Could not create or navigate the local cache directory.
    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    /// Network download failed.
    #[error("Download failed: {0}")]
    Download(String),

    /// zip extraction failed.
    #[error("Archive extraction failed: {0}")]
    Extract(String),

    /// The archive unpacked but the executable is not where it should be.
    #[error("Chromium executable missing at '{path}'")]
    MissingExecutable { path: PathBuf },
}

// ── Internal: platform metadata ──────────────────────────────────────────────

struct PlatformInfo {
    /// Chrome for Testing platform slug, e.g. `linux64`.
    slug: &'static str,
    /// Executable filename inside the archive folder.
    exe_name: &'static str,
}

impl PlatformInfo {
    fn archive_name(&self) -> String {
        format!("chrome-headless-shell-{}.zip", self.slug)
    }

    /// Path of the executable relative to the extraction root.
    fn exe_path_in_archive(&self) -> PathBuf {
        PathBuf::from(format!("chrome-headless-shell-{}", self.slug)).join(self.exe_name)
    }
}

fn detect_platform() -> Result<PlatformInfo, ChromiumAutoError> {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;

    match (os, arch) {
        ("macos", "aarch64") => Ok(PlatformInfo {
            slug: "mac-arm64",
            exe_name: "chrome-headless-shell",
        }),
        ("macos", "x86_64") => Ok(PlatformInfo {
            slug: "mac-x64",
            exe_name: "chrome-headless-shell",
        }),
        ("linux", "x86_64") => Ok(PlatformInfo {
            slug: "linux64",
            exe_name: "chrome-headless-shell",
        }),
        ("windows", "x86_64") => Ok(PlatformInfo {
            slug: "win64",
            exe_name: "chrome-headless-shell.exe",
        }),
        ("windows", "x86") => Ok(PlatformInfo {
            slug: "win32",
            exe_name: "chrome-headless-shell.exe",
        }),
        (os, arch) => Err(ChromiumAutoError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        }),
    }
}

// ── Cache directory resolution ───────────────────────────────────────────────

/// Returns the per-version cache directory for the headless shell.
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/article2pdf/chrome-headless-shell-{VERSION}/`
/// - **Linux**: `~/.cache/article2pdf/chrome-headless-shell-{VERSION}/`
/// - **Windows**: `%LOCALAPPDATA%\article2pdf\chrome-headless-shell-{VERSION}\`
///
/// Override by setting `CHROMIUM_AUTO_CACHE_DIR`.
pub fn chromium_cache_dir() -> PathBuf {
    let leaf = format!("chrome-headless-shell-{CHROME_VERSION}");
    if let Ok(override_dir) = std::env::var(CACHE_DIR_ENV) {
        return PathBuf::from(override_dir).join(leaf);
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("article2pdf").join(leaf)
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns `true` if an executable is available without network access.
///
/// Also returns `true` when `CHROMIUM_EXECUTABLE` points to an existing file.
pub fn is_chromium_cached() -> bool {
    cached_chromium_path().is_some()
}

/// Returns the on-disk path to the executable, or `None` if not cached.
pub fn cached_chromium_path() -> Option<PathBuf> {
    if let Some(p) = env_executable() {
        return Some(p);
    }
    let info = detect_platform().ok()?;
    let p = chromium_cache_dir().join(info.exe_path_in_archive());
    p.exists().then_some(p)
}

/// Ensures a headless Chromium executable is present and returns its path.
///
/// - If `CHROMIUM_EXECUTABLE` is set (and the file exists), that path is used.
/// - Otherwise, checks [`chromium_cache_dir`] for an existing executable.
/// - If absent, downloads the platform archive and extracts it.
///
/// `on_progress` receives `(bytes_downloaded, total_size_option)` during
/// the download. Pass `None` to suppress progress callbacks.
///
/// Concurrent first calls may each download; callers that need exactly one
/// download should serialise calls themselves.
pub async fn ensure_chromium(
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<PathBuf, ChromiumAutoError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = resolve_or_download(on_progress).await?;

    // Best-effort cache in the OnceLock (ignore race; both paths are equal).
    let _ = RESOLVED_PATH.set(path.clone());

    Ok(path)
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn env_executable() -> Option<PathBuf> {
    let raw = std::env::var(EXECUTABLE_ENV).ok()?;
    let p = PathBuf::from(raw);
    p.is_file().then_some(p)
}

async fn resolve_or_download(
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<PathBuf, ChromiumAutoError> {
    // 1. Environment variable override.
    if let Ok(raw) = std::env::var(EXECUTABLE_ENV) {
        let p = PathBuf::from(&raw);
        if p.is_file() {
            debug!("Using {} = {}", EXECUTABLE_ENV, p.display());
            return Ok(p);
        }
        warn!("{} '{}' not found; downloading …", EXECUTABLE_ENV, raw);
    }

    let info = detect_platform()?;
    let cache_dir = chromium_cache_dir();
    let exe_path = cache_dir.join(info.exe_path_in_archive());

    // 2. Already cached on disk.
    if exe_path.is_file() {
        return Ok(exe_path);
    }

    // 3. Download and extract.
    let url = format!(
        "{}/{}/{}/{}",
        BASE_URL,
        CHROME_VERSION,
        info.slug,
        info.archive_name()
    );
    info!("Downloading headless Chromium {} from {}", CHROME_VERSION, url);

    let archive_bytes = download_bytes(&url, on_progress).await?;

    let rel_exe = info.exe_path_in_archive();
    let target = cache_dir.clone();
    tokio::task::spawn_blocking(move || install_archive(archive_bytes, &target, &rel_exe))
        .await
        .map_err(|e| ChromiumAutoError::Extract(format!("extraction task panicked: {e}")))??;

    info!("Chromium installed at {}", exe_path.display());
    Ok(exe_path)
}

/// Streams a URL into a `Vec<u8>`, calling `on_progress` after every chunk.
async fn download_bytes(
    url: &str,
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<Vec<u8>, ChromiumAutoError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("chromium-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| ChromiumAutoError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ChromiumAutoError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(ChromiumAutoError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let capacity = total.unwrap_or(100 * 1024 * 1024) as usize;
    let mut buf = Vec::with_capacity(capacity);
    let mut downloaded: u64 = 0;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| ChromiumAutoError::Download(format!("Read error: {e}")))?
    {
        buf.extend_from_slice(&chunk);
        downloaded += chunk.len() as u64;
        if let Some(cb) = on_progress {
            cb(downloaded, total);
        }
    }

    Ok(buf)
}

/// Unpacks `archive_bytes` into a staging directory and renames it to `target`.
fn install_archive(
    archive_bytes: Vec<u8>,
    target: &Path,
    rel_exe: &Path,
) -> Result<(), ChromiumAutoError> {
    let staging = staging_dir(target);
    if staging.exists() {
        std::fs::remove_dir_all(&staging).map_err(ChromiumAutoError::CacheDir)?;
    }
    std::fs::create_dir_all(&staging).map_err(ChromiumAutoError::CacheDir)?;

    extract_archive(&archive_bytes, &staging)?;

    let staged_exe = staging.join(rel_exe);
    if !staged_exe.is_file() {
        return Err(ChromiumAutoError::MissingExecutable { path: staged_exe });
    }
    mark_executable(&staged_exe)?;

    // A previous partial install without the executable is discarded.
    if target.exists() {
        std::fs::remove_dir_all(target).map_err(ChromiumAutoError::CacheDir)?;
    }
    std::fs::rename(&staging, target).map_err(ChromiumAutoError::CacheDir)?;
    Ok(())
}

fn staging_dir(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    target.with_file_name(name)
}

/// Extracts every entry of a zip archive into `dest`.
fn extract_archive(archive_bytes: &[u8], dest: &Path) -> Result<(), ChromiumAutoError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(archive_bytes))
        .map_err(|e| ChromiumAutoError::Extract(e.to_string()))?;

    archive
        .extract(dest)
        .map_err(|e| ChromiumAutoError::Extract(format!("Unpack failed: {e}")))
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<(), ChromiumAutoError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)
        .map_err(ChromiumAutoError::CacheDir)?
        .permissions();
    perms.set_mode(perms.mode() | 0o755);
    std::fs::set_permissions(path, perms).map_err(ChromiumAutoError::CacheDir)
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<(), ChromiumAutoError> {
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
