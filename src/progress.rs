//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConvertConfigBuilder::progress_callback`] to receive
//! events as the pipeline fetches, extracts and renders an article.
//!
//! # Example
//!
//! ```rust
//! use article2pdf::{ConversionProgressCallback, ConvertConfig};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! struct RetryCounter {
//!     retries: AtomicU32,
//! }
//!
//! impl ConversionProgressCallback for RetryCounter {
//!     fn on_fetch_retry(&self, attempt: u32, max_retries: u32, delay_ms: u64, reason: &str) {
//!         self.retries.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("retry {attempt}/{max_retries} in {delay_ms}ms: {reason}");
//!     }
//! }
//!
//! let counter = Arc::new(RetryCounter { retries: AtomicU32::new(0) });
//! let config = ConvertConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::document::ExtractedDocument;
use std::path::Path;
use std::sync::Arc;

/// Called by the pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`: concurrent
/// conversions sharing one config call into the same instance.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once, before the politeness delay.
    fn on_fetch_start(&self, url: &str) {
        let _ = url;
    }

    /// Called before sleeping ahead of a retry.
    ///
    /// # Arguments
    /// * `attempt`     — 1-indexed retry number
    /// * `max_retries` — configured retry budget
    /// * `delay_ms`    — jittered backoff about to be slept
    /// * `reason`      — status or transport error that triggered the retry
    fn on_fetch_retry(&self, attempt: u32, max_retries: u32, delay_ms: u64, reason: &str) {
        let _ = (attempt, max_retries, delay_ms, reason);
    }

    /// Called when the article markup has been downloaded.
    fn on_fetched(&self, markup_bytes: usize) {
        let _ = markup_bytes;
    }

    /// Called after a successful extraction.
    fn on_extracted(&self, document: &ExtractedDocument) {
        let _ = document;
    }

    /// Called while the browser runtime is being downloaded (first run only).
    ///
    /// `total` is `None` when the server sent no `Content-Length`.
    fn on_engine_download(&self, downloaded: u64, total: Option<u64>) {
        let _ = (downloaded, total);
    }

    /// Called before the rendering engine is acquired.
    fn on_render_start(&self, destination: &Path) {
        let _ = destination;
    }

    /// Called once the PDF has been written.
    fn on_render_complete(&self, destination: &Path, pdf_bytes: usize) {
        let _ = (destination, pdf_bytes);
    }
}

/// Convenience alias for the shared callback handle.
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// A no-op implementation, handy as an explicit default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}
