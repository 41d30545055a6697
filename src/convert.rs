//! End-to-end conversion entry points.
//!
//! [`Converter`] runs fetch → extract → render for one article at a time and
//! can be shared (via `&`) by concurrent tasks: they all render through the
//! same lazily started engine. [`convert_to_file`] and [`convert_sync`] are
//! one-shot wrappers for callers that convert a single article.

use crate::config::ConvertConfig;
use crate::document::{ConversionSummary, RenderRequest};
use crate::engine::{ChromiumLauncher, EngineLauncher, RenderEngineManager};
use crate::error::Article2PdfError;
use crate::pipeline::extract::extract_article;
use crate::pipeline::fetch::Fetcher;
use crate::pipeline::render::DocumentRenderer;
use crate::progress::ProgressCallback;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// What to convert and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertRequest {
    pub url: String,
    pub output: PathBuf,
    /// CSS file applied after the default stylesheet.
    pub stylesheet: Option<PathBuf>,
}

impl ConvertRequest {
    pub fn new(url: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            output: output.into(),
            stylesheet: None,
        }
    }

    pub fn with_stylesheet(mut self, path: impl Into<PathBuf>) -> Self {
        self.stylesheet = Some(path.into());
        self
    }
}

/// The article pipeline bound to one engine manager.
pub struct Converter<L: EngineLauncher = ChromiumLauncher> {
    fetcher: Fetcher,
    renderer: DocumentRenderer<L>,
    progress: Option<ProgressCallback>,
}

impl Converter<ChromiumLauncher> {
    /// Build a converter that renders with headless Chromium.
    pub fn new(config: &ConvertConfig) -> Result<Self, Article2PdfError> {
        let launcher =
            ChromiumLauncher::new(config.engine.clone(), config.progress_callback.clone());
        Self::with_engine(config, Arc::new(RenderEngineManager::new(launcher)))
    }
}

impl<L: EngineLauncher> Converter<L> {
    /// Build a converter around an existing (possibly shared) engine manager.
    pub fn with_engine(
        config: &ConvertConfig,
        engines: Arc<RenderEngineManager<L>>,
    ) -> Result<Self, Article2PdfError> {
        Ok(Self {
            fetcher: Fetcher::new(config)?,
            renderer: DocumentRenderer::new(
                engines,
                config.layout,
                config.progress_callback.clone(),
            ),
            progress: config.progress_callback.clone(),
        })
    }

    pub fn engines(&self) -> &Arc<RenderEngineManager<L>> {
        self.renderer.engines()
    }

    /// Fetch, extract and render one article.
    ///
    /// # Errors
    /// The first stage failure, typed by stage. Nothing is written to
    /// `request.output` unless the whole pipeline succeeds.
    pub async fn convert(
        &self,
        request: &ConvertRequest,
        cancel: &CancellationToken,
    ) -> Result<ConversionSummary, Article2PdfError> {
        let start = Instant::now();
        if request.output.as_os_str().is_empty() {
            return Err(Article2PdfError::InvalidConfig(
                "Output path must not be empty".into(),
            ));
        }
        info!("Starting conversion: {}", request.url);

        // ── Step 1: Fetch ────────────────────────────────────────────────
        let markup = self.fetcher.fetch(&request.url, cancel).await?;

        // ── Step 2: Extract ──────────────────────────────────────────────
        let document = extract_article(&markup)?;
        if let Some(ref cb) = self.progress {
            cb.on_extracted(&document);
        }

        // ── Step 3: Render ───────────────────────────────────────────────
        let mut render = RenderRequest::new(document, &request.output);
        if let Some(ref css) = request.stylesheet {
            render = render.with_stylesheet_path(css);
        }
        let pdf_bytes = self.renderer.render(&render, cancel).await?;

        let summary = ConversionSummary {
            title: render.document.title().to_string(),
            author: render.document.author().map(str::to_string),
            publish_date: render.document.publish_date(),
            output_path: request.output.clone(),
            markup_bytes: markup.len(),
            pdf_bytes,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            "Conversion complete: '{}' → {} in {}ms",
            summary.title,
            summary.output_path.display(),
            summary.duration_ms
        );
        Ok(summary)
    }
}

/// Convert one article to a PDF file with a fresh Chromium engine.
pub async fn convert_to_file(
    url: impl AsRef<str>,
    output: impl AsRef<Path>,
    stylesheet: Option<&Path>,
    config: &ConvertConfig,
) -> Result<ConversionSummary, Article2PdfError> {
    let converter = Converter::new(config)?;
    let mut request = ConvertRequest::new(url.as_ref(), output.as_ref());
    if let Some(css) = stylesheet {
        request = request.with_stylesheet(css);
    }
    converter.convert(&request, &CancellationToken::new()).await
}

/// Synchronous wrapper around [`convert_to_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    url: impl AsRef<str>,
    output: impl AsRef<Path>,
    stylesheet: Option<&Path>,
    config: &ConvertConfig,
) -> Result<ConversionSummary, Article2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Article2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_to_file(url, output, stylesheet, config))
}
