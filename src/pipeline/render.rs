//! Document rendering: compose the print page and export it as PDF.
//!
//! ## Order of operations
//!
//! 1. Load the custom stylesheet, if any. A bad path fails here, before the
//!    engine is touched.
//! 2. Compose the page (default CSS → custom CSS → byline block → body).
//! 3. Acquire the shared engine ([`RenderEngineManager::acquire`]).
//! 4. Print in an isolated page context.
//! 5. Verify the `%PDF` signature and write atomically (temp + rename).
//!
//! Engine acquisition errors pass through unchanged as
//! [`RenderError::Engine`]; every later failure becomes
//! [`RenderError::GenerationFailed`] carrying the destination path.

use crate::config::PageLayout;
use crate::document::{ExtractedDocument, RenderRequest, StylesheetSource};
use crate::engine::{EngineLauncher, RenderEngine, RenderEngineManager};
use crate::error::RenderError;
use crate::progress::ProgressCallback;
use crate::styles::{DATE_FORMAT, DEFAULT_STYLESHEET, META_CLASS, META_SEPARATOR};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Leading bytes of every PDF file.
pub const PDF_SIGNATURE: &[u8] = b"%PDF";

/// Renders [`ExtractedDocument`]s to PDF files through a shared engine.
pub struct DocumentRenderer<L: EngineLauncher> {
    engines: Arc<RenderEngineManager<L>>,
    layout: PageLayout,
    progress: Option<ProgressCallback>,
}

impl<L: EngineLauncher> DocumentRenderer<L> {
    pub fn new(
        engines: Arc<RenderEngineManager<L>>,
        layout: PageLayout,
        progress: Option<ProgressCallback>,
    ) -> Self {
        Self {
            engines,
            layout,
            progress,
        }
    }

    pub fn engines(&self) -> &Arc<RenderEngineManager<L>> {
        &self.engines
    }

    /// Render `request.document` to `request.destination`.
    ///
    /// Returns the number of bytes written. On failure nothing is left at
    /// the destination.
    pub async fn render(
        &self,
        request: &RenderRequest,
        cancel: &CancellationToken,
    ) -> Result<usize, RenderError> {
        let start = Instant::now();
        let destination = request.destination();

        let custom_css = load_stylesheet(request.custom_stylesheet.as_ref()).await?;
        let html = compose_page(&request.document, custom_css.as_deref());
        debug!("Composed page: {} bytes", html.len());

        if let Some(ref cb) = self.progress {
            cb.on_render_start(destination);
        }

        let engine = self.engines.acquire(cancel).await?;

        let printed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(destination)),
            r = engine.print_pdf(&html, &self.layout) => r,
        };
        let bytes = printed.map_err(|e| generation_failed(destination, e.to_string()))?;

        if !bytes.starts_with(PDF_SIGNATURE) {
            return Err(generation_failed(
                destination,
                "engine output is not a PDF document".into(),
            ));
        }

        if cancel.is_cancelled() {
            return Err(cancelled(destination));
        }
        // Not raced against `cancel`: dropping a half-done write would orphan
        // its temp file.
        write_atomically(destination, &bytes).await?;

        info!(
            "Wrote {} ({} bytes) in {:?}",
            destination.display(),
            bytes.len(),
            start.elapsed()
        );
        if let Some(ref cb) = self.progress {
            cb.on_render_complete(destination, bytes.len());
        }
        Ok(bytes.len())
    }
}

/// Read the custom stylesheet. A blank path means "no stylesheet".
async fn load_stylesheet(source: Option<&StylesheetSource>) -> Result<Option<String>, RenderError> {
    match source {
        None => Ok(None),
        Some(StylesheetSource::Inline(css)) => Ok(Some(css.clone())),
        Some(StylesheetSource::Path(path)) if path.as_os_str().is_empty() => Ok(None),
        Some(StylesheetSource::Path(path)) => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| RenderError::Configuration {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            let css = String::from_utf8(bytes).map_err(|_| RenderError::Configuration {
                path: path.clone(),
                reason: "file is not valid UTF-8 text".into(),
            })?;
            debug!("Loaded custom stylesheet {} ({} bytes)", path.display(), css.len());
            Ok(Some(css))
        }
    }
}

/// Build the complete HTML page handed to the engine.
pub fn compose_page(document: &ExtractedDocument, custom_css: Option<&str>) -> String {
    let title = escape_html(document.title());
    let mut html = String::with_capacity(
        DEFAULT_STYLESHEET.len() + document.body_html().len() + 512,
    );

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{title}</title>\n"));
    html.push_str(&format!("<style>{DEFAULT_STYLESHEET}</style>\n"));
    if let Some(css) = custom_css {
        html.push_str(&format!("<style>{css}</style>\n"));
    }
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>{title}</h1>\n"));
    if let Some(meta) = byline(document) {
        html.push_str(&format!("<div class=\"{META_CLASS}\">{meta}</div>\n"));
    }
    html.push_str(document.body_html());
    html.push_str("\n</body>\n</html>\n");
    html
}

/// "By {author} · {date}" with either part omitted when absent.
fn byline(document: &ExtractedDocument) -> Option<String> {
    let mut parts = Vec::with_capacity(2);
    if let Some(author) = document.author() {
        parts.push(format!("By {}", escape_html(author)));
    }
    if let Some(date) = document.publish_date() {
        parts.push(date.format(DATE_FORMAT).to_string());
    }
    (!parts.is_empty()).then(|| parts.join(META_SEPARATOR))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Write `bytes` to a unique sibling temp file then rename over `dest`.
async fn write_atomically(destination: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    let fail = |e: std::io::Error| generation_failed(destination, e.to_string());

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }

    let tmp = temp_path(destination);
    if let Err(e) = tokio::fs::write(&tmp, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(fail(e));
    }
    if let Err(e) = tokio::fs::rename(&tmp, destination).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(fail(e));
    }
    Ok(())
}

/// `.<name>.<pid>-<n>.tmp` next to `destination`, distinct per call.
fn temp_path(destination: &Path) -> PathBuf {
    static NEXT: AtomicU64 = AtomicU64::new(0);

    let mut name = OsString::from(".");
    if let Some(file) = destination.file_name() {
        name.push(file);
    }
    name.push(format!(
        ".{}-{}.tmp",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    ));
    destination.with_file_name(name)
}

fn generation_failed(path: &Path, detail: String) -> RenderError {
    RenderError::GenerationFailed {
        path: path.to_path_buf(),
        detail,
    }
}

fn cancelled(path: &Path) -> RenderError {
    RenderError::Cancelled {
        path: path.to_path_buf(),
    }
}
