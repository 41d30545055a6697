//! # article2pdf
//!
//! Save a web article as a clean, print-ready PDF.
//!
//! ## Why this crate?
//!
//! Printing an article straight from a browser drags the whole page along:
//! navigation bars, share buttons, cookie banners and footers. This crate
//! isolates the article itself (title, byline and body), strips page chrome
//! and inline presentation, and prints the result through headless Chromium
//! with a readable default stylesheet.
//!
//! ## Pipeline Overview
//!
//! ```text
//! URL
//!  │
//!  ├─ 1. Fetch    politeness delay, GET with classified retry + jittered backoff
//!  ├─ 2. Extract  title / author / date heuristics, body sanitisation (html5ever)
//!  ├─ 3. Compose  default CSS → custom CSS → byline block → body
//!  └─ 4. Render   shared headless Chromium (lazy, single-flight) → A4 PDF
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use article2pdf::{convert_to_file, ConvertConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConvertConfig::default();
//!     let summary = convert_to_file(
//!         "https://example.com/posts/understanding-async",
//!         "understanding-async.pdf",
//!         None,
//!         &config,
//!     )
//!     .await?;
//!     println!("{} → {}", summary.title, summary.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Sharing the engine
//!
//! Starting Chromium is expensive. A [`Converter`] owns an
//! `Arc<`[`RenderEngineManager`]`>`; build several converters with
//! [`Converter::with_engine`] (or share one converter) and every render
//! reuses the same browser process, started once on first use.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `article2pdf` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! article2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod styles;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConvertConfig, ConvertConfigBuilder, EngineSettings, PageLayout};
pub use convert::{convert_sync, convert_to_file, ConvertRequest, Converter};
pub use document::{ConversionSummary, ExtractedDocument, RenderRequest, StylesheetSource};
pub use engine::{
    ChromiumEngine, ChromiumLauncher, EngineLauncher, RenderEngine, RenderEngineManager,
};
pub use error::{
    Article2PdfError, DownloadError, EngineError, ExtractError, PrintError, PrintStage,
    RenderError,
};
pub use pipeline::extract::extract_article;
pub use pipeline::fetch::Fetcher;
pub use pipeline::render::DocumentRenderer;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};

/// Re-exported so callers need no direct `tokio-util` dependency.
pub use tokio_util::sync::CancellationToken;
