//! Error types for the article2pdf library.
//!
//! Each pipeline stage owns a closed error enum carrying only the fields its
//! failure kinds need:
//!
//! * [`DownloadError`] — the fetch stage (status classification, retries).
//! * [`ExtractError`] — the extraction stage; every content failure carries a
//!   bounded excerpt of the offending markup.
//! * [`EngineError`] — acquiring the shared rendering engine.
//! * [`RenderError`] — composing the page and exporting the PDF.
//!
//! [`Article2PdfError`] is the union handed to the invocation boundary. It
//! maps every kind to a distinct message and a non-zero exit code, so callers
//! dispatch on the variant rather than parsing messages.

use std::path::PathBuf;
use thiserror::Error;

/// Upper bound (in characters) for markup excerpts attached to extraction errors.
pub const MAX_EXCERPT_CHARS: usize = 500;

/// Returns at most [`MAX_EXCERPT_CHARS`] characters from the start of `markup`.
pub fn markup_excerpt(markup: &str) -> String {
    markup.chars().take(MAX_EXCERPT_CHARS).collect()
}

// ── Download ─────────────────────────────────────────────────────────────

/// Failures of the network fetch stage.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The locator is empty or not an HTTP/HTTPS URL.
    #[error("Invalid article URL '{url}': {reason}")]
    InvalidLocator { url: String, reason: String },

    /// The server answered 404. Never retried.
    #[error("Article not found: '{url}'")]
    NotFound { url: String },

    /// Every attempt was answered with 429.
    #[error("Rate limit exceeded for '{url}' after {attempts} attempts. Try again later.")]
    RateLimitExceeded { url: String, attempts: u32 },

    /// A non-retryable status, or retries exhausted on a transient failure.
    ///
    /// `status` is `None` when the last attempt failed at the transport level.
    #[error("Failed to download article from '{url}' ({}): {detail}", status_label(.status))]
    DownloadFailed {
        url: String,
        status: Option<u16>,
        detail: String,
    },

    /// The cancellation token fired during the delay or the exchange.
    #[error("Download of '{url}' was cancelled")]
    Cancelled { url: String },

    /// The HTTP client could not be constructed.
    #[error("Failed to initialise HTTP client: {0}")]
    Client(String),
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {code}"),
        None => "no response".to_string(),
    }
}

impl DownloadError {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            DownloadError::NotFound { .. } => Some(404),
            DownloadError::RateLimitExceeded { .. } => Some(429),
            DownloadError::DownloadFailed { status, .. } => *status,
            _ => None,
        }
    }
}

// ── Extraction ───────────────────────────────────────────────────────────

/// Failures of the content extraction stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The markup was empty or whitespace-only.
    #[error("Invalid input: markup is empty")]
    InvalidInput,

    /// No `h1` inside `article`/`main`, no `og:title`, no `<title>`.
    #[error("No title found in HTML content")]
    NoTitleFound { excerpt: String },

    /// Neither an `article` nor a `main` element exists.
    #[error("No article or main element found in HTML content")]
    NoBodyFound { excerpt: String },

    /// The body region was empty after sanitisation.
    #[error("Body content is empty after extraction")]
    EmptyBody { excerpt: String },
}

impl ExtractError {
    /// Bounded prefix of the markup that failed, when the kind carries one.
    pub fn excerpt(&self) -> Option<&str> {
        match self {
            ExtractError::InvalidInput => None,
            ExtractError::NoTitleFound { excerpt }
            | ExtractError::NoBodyFound { excerpt }
            | ExtractError::EmptyBody { excerpt } => Some(excerpt),
        }
    }
}

// ── Engine ───────────────────────────────────────────────────────────────

/// Failures acquiring the shared rendering engine.
///
/// Both setup kinds leave the manager uninitialised, so the next call may
/// try again.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The engine runtime could not be located or downloaded.
    #[error(
        "Rendering engine is unavailable: {0}\n\n\
Chromium is normally downloaded automatically on first run.\n\
  • Check your internet connection and disk permissions, then try again.\n\
  • Set CHROMIUM_EXECUTABLE=/path/to/chrome to use an existing browser.\n"
    )]
    DependencyUnavailable(String),

    /// The engine runtime exists but the browser process would not start.
    #[error(
        "Failed to launch the rendering engine: {0}\n\
On Linux containers try --no-sandbox; make sure Chromium's shared libraries are installed."
    )]
    LaunchFailed(String),

    /// The cancellation token fired while waiting for or initialising the engine.
    #[error("Rendering engine acquisition was cancelled")]
    Cancelled,
}

/// Step of a single page print that failed inside an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintStage {
    OpenPage,
    LoadContent,
    Export,
}

impl std::fmt::Display for PrintStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PrintStage::OpenPage => "opening page",
            PrintStage::LoadContent => "loading content",
            PrintStage::Export => "exporting PDF",
        };
        f.write_str(s)
    }
}

/// Low-level failure raised by a [`crate::engine::RenderEngine`].
///
/// Never surfaced directly: the renderer wraps it in
/// [`RenderError::GenerationFailed`].
#[derive(Debug, Clone, Error)]
#[error("{stage} failed: {detail}")]
pub struct PrintError {
    pub stage: PrintStage,
    pub detail: String,
}

impl PrintError {
    pub fn new(stage: PrintStage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            detail: detail.into(),
        }
    }
}

// ── Render ───────────────────────────────────────────────────────────────

/// Failures of the document rendering stage.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The custom stylesheet path did not resolve to readable text.
    #[error("Custom stylesheet '{path}' could not be read: {reason}")]
    Configuration { path: PathBuf, reason: String },

    /// Engine acquisition failed; re-surfaced unchanged.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Page composition, load, export or file write failed.
    #[error("Failed to generate PDF '{path}': {detail}")]
    GenerationFailed { path: PathBuf, detail: String },

    /// The cancellation token fired during rendering.
    #[error("Rendering of '{path}' was cancelled")]
    Cancelled { path: PathBuf },
}

// ── Invocation boundary ──────────────────────────────────────────────────

/// All errors returned by the top-level `convert*` functions.
#[derive(Debug, Error)]
pub enum Article2PdfError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Render(#[from] RenderError),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EngineError> for Article2PdfError {
    fn from(e: EngineError) -> Self {
        Article2PdfError::Render(RenderError::Engine(e))
    }
}

impl Article2PdfError {
    /// Stable, machine-readable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Article2PdfError::Download(e) => match e {
                DownloadError::InvalidLocator { .. } => "invalid_url",
                DownloadError::NotFound { .. } => "not_found",
                DownloadError::RateLimitExceeded { .. } => "rate_limited",
                DownloadError::DownloadFailed { .. } => "download_failed",
                DownloadError::Cancelled { .. } => "cancelled",
                DownloadError::Client(_) => "http_client",
            },
            Article2PdfError::Extract(e) => match e {
                ExtractError::InvalidInput => "empty_markup",
                ExtractError::NoTitleFound { .. } => "no_title",
                ExtractError::NoBodyFound { .. } => "no_body",
                ExtractError::EmptyBody { .. } => "empty_body",
            },
            Article2PdfError::Render(e) => match e {
                RenderError::Configuration { .. } => "bad_stylesheet",
                RenderError::Engine(EngineError::DependencyUnavailable(_)) => "engine_unavailable",
                RenderError::Engine(EngineError::LaunchFailed(_)) => "engine_launch_failed",
                RenderError::Engine(EngineError::Cancelled) => "cancelled",
                RenderError::GenerationFailed { .. } => "generation_failed",
                RenderError::Cancelled { .. } => "cancelled",
            },
            Article2PdfError::InvalidConfig(_) => "invalid_config",
            Article2PdfError::Internal(_) => "internal",
        }
    }

    /// Short, human-readable heading for the failure kind.
    pub fn headline(&self) -> &'static str {
        match self.kind() {
            "invalid_url" => "Invalid URL",
            "not_found" => "Article not found",
            "rate_limited" => "Rate limit exceeded",
            "download_failed" | "http_client" => "Download failed",
            "cancelled" => "Cancelled",
            "empty_markup" | "no_title" | "no_body" | "empty_body" => "Content extraction failed",
            "bad_stylesheet" => "Invalid stylesheet",
            "engine_unavailable" => "Browser download failed",
            "engine_launch_failed" => "Browser launch failed",
            "generation_failed" => "PDF generation failed",
            "invalid_config" => "Invalid configuration",
            _ => "Internal error",
        }
    }

    /// Process exit code for the invocation boundary. Never zero.
    pub fn exit_code(&self) -> i32 {
        match self {
            Article2PdfError::InvalidConfig(_)
            | Article2PdfError::Download(DownloadError::InvalidLocator { .. }) => 2,
            Article2PdfError::Download(DownloadError::Cancelled { .. })
            | Article2PdfError::Render(RenderError::Cancelled { .. })
            | Article2PdfError::Render(RenderError::Engine(EngineError::Cancelled)) => 130,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_is_bounded_by_chars_not_bytes() {
        let markup = "é".repeat(MAX_EXCERPT_CHARS + 20);
        let excerpt = markup_excerpt(&markup);
        assert_eq!(excerpt.chars().count(), MAX_EXCERPT_CHARS);
    }

    #[test]
    fn short_markup_excerpt_is_verbatim() {
        assert_eq!(markup_excerpt("<p>x</p>"), "<p>x</p>");
    }

    #[test]
    fn download_failed_display_with_status() {
        let e = DownloadError::DownloadFailed {
            url: "https://example.com/a".into(),
            status: Some(503),
            detail: "Service Unavailable".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("HTTP 503"), "got: {msg}");
        assert_eq!(e.status(), Some(503));
    }

    #[test]
    fn download_failed_display_without_status() {
        let e = DownloadError::DownloadFailed {
            url: "https://example.com/a".into(),
            status: None,
            detail: "connection refused".into(),
        };
        assert!(e.to_string().contains("no response"));
        assert_eq!(e.status(), None);
    }

    #[test]
    fn extraction_kinds_expose_excerpts() {
        let e = ExtractError::EmptyBody {
            excerpt: "<article></article>".into(),
        };
        assert_eq!(e.excerpt(), Some("<article></article>"));
        assert_eq!(ExtractError::InvalidInput.excerpt(), None);
    }

    #[test]
    fn every_kind_maps_to_nonzero_exit() {
        let errors: Vec<Article2PdfError> = vec![
            DownloadError::NotFound { url: "u".into() }.into(),
            DownloadError::RateLimitExceeded {
                url: "u".into(),
                attempts: 4,
            }
            .into(),
            ExtractError::InvalidInput.into(),
            EngineError::LaunchFailed("boom".into()).into(),
            RenderError::GenerationFailed {
                path: "out.pdf".into(),
                detail: "x".into(),
            }
            .into(),
            Article2PdfError::InvalidConfig("bad".into()),
        ];
        for e in &errors {
            assert_ne!(e.exit_code(), 0, "{}", e.kind());
        }
    }

    #[test]
    fn engine_errors_keep_distinct_kinds() {
        let dep: Article2PdfError = EngineError::DependencyUnavailable("offline".into()).into();
        let launch: Article2PdfError = EngineError::LaunchFailed("no libnss3".into()).into();
        assert_eq!(dep.kind(), "engine_unavailable");
        assert_eq!(launch.kind(), "engine_launch_failed");
        assert_ne!(dep.headline(), launch.headline());
    }
}
