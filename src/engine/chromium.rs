//! Headless Chromium engine driven over CDP with `chromiumoxide`.
//!
//! [`ChromiumLauncher`] resolves the browser through `chromium-auto`
//! (explicit path → `CHROMIUM_EXECUTABLE` → cache → download) and starts it.
//! [`ChromiumEngine`] opens a fresh tab for every print, so concurrent
//! renders share only the browser process.

use super::{EngineLauncher, RenderEngine};
use crate::config::{EngineSettings, PageLayout};
use crate::error::{EngineError, PrintError, PrintStage};
use crate::progress::ProgressCallback;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How often `document.readyState` is polled while waiting for a load.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Starts a headless Chromium according to [`EngineSettings`].
pub struct ChromiumLauncher {
    settings: EngineSettings,
    progress: Option<ProgressCallback>,
}

impl ChromiumLauncher {
    pub fn new(settings: EngineSettings, progress: Option<ProgressCallback>) -> Self {
        Self { settings, progress }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

#[async_trait]
impl EngineLauncher for ChromiumLauncher {
    type Engine = ChromiumEngine;

    async fn ensure_runtime(&self) -> Result<PathBuf, EngineError> {
        if let Some(ref exe) = self.settings.executable {
            if exe.is_file() {
                debug!("Using configured Chromium at {}", exe.display());
                return Ok(exe.clone());
            }
            return Err(EngineError::DependencyUnavailable(format!(
                "configured browser executable '{}' does not exist",
                exe.display()
            )));
        }

        let progress = self.progress.clone();
        let report = move |downloaded: u64, total: Option<u64>| {
            if let Some(ref cb) = progress {
                cb.on_engine_download(downloaded, total);
            }
        };
        chromium_auto::ensure_chromium(Some(&report))
            .await
            .map_err(|e| EngineError::DependencyUnavailable(e.to_string()))
    }

    async fn launch(&self, runtime: &Path) -> Result<ChromiumEngine, EngineError> {
        let mut builder = BrowserConfig::builder()
            .chrome_executable(runtime)
            .launch_timeout(Duration::from_secs(self.settings.launch_timeout_secs));
        if !self.settings.sandbox {
            builder = builder.no_sandbox();
        }
        let config = builder.build().map_err(EngineError::LaunchFailed)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| EngineError::LaunchFailed(e.to_string()))?;

        // The CDP connection only makes progress while its handler is polled.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler stopped: {}", e);
                    break;
                }
            }
        });

        info!("Launched Chromium from {}", runtime.display());
        Ok(ChromiumEngine {
            browser,
            handler_task,
            load_timeout: Duration::from_secs(self.settings.load_timeout_secs),
        })
    }
}

/// A running headless browser.
pub struct ChromiumEngine {
    browser: Browser,
    handler_task: JoinHandle<()>,
    load_timeout: Duration,
}

impl ChromiumEngine {
    async fn wait_until_loaded(&self, page: &Page) -> Result<(), PrintError> {
        let poll = async {
            loop {
                let state: String = page
                    .evaluate("document.readyState")
                    .await
                    .map_err(|e| PrintError::new(PrintStage::LoadContent, e.to_string()))?
                    .into_value()
                    .map_err(|e| PrintError::new(PrintStage::LoadContent, e.to_string()))?;
                if state == "complete" {
                    return Ok(());
                }
                tokio::time::sleep(READY_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(self.load_timeout, poll)
            .await
            .map_err(|_| {
                PrintError::new(
                    PrintStage::LoadContent,
                    format!("page did not finish loading within {:?}", self.load_timeout),
                )
            })?
    }

    async fn print_page(&self, page: &Page, html: &str, layout: &PageLayout) -> Result<Vec<u8>, PrintError> {
        page.set_content(html)
            .await
            .map_err(|e| PrintError::new(PrintStage::LoadContent, e.to_string()))?;
        self.wait_until_loaded(page).await?;

        page.pdf(print_params(layout))
            .await
            .map_err(|e| PrintError::new(PrintStage::Export, e.to_string()))
    }
}

#[async_trait]
impl RenderEngine for ChromiumEngine {
    async fn print_pdf(&self, html: &str, layout: &PageLayout) -> Result<Vec<u8>, PrintError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| PrintError::new(PrintStage::OpenPage, e.to_string()))?;

        let result = self.print_page(&page, html, layout).await;

        if let Err(e) = page.close().await {
            warn!("Failed to close page: {}", e);
        }
        result
    }
}

impl Drop for ChromiumEngine {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

/// CDP print parameters for `layout`; CDP takes inches.
pub fn print_params(layout: &PageLayout) -> PrintToPdfParams {
    PrintToPdfParams {
        paper_width: Some(PageLayout::inches(layout.width_mm)),
        paper_height: Some(PageLayout::inches(layout.height_mm)),
        margin_top: Some(PageLayout::inches(layout.margin_top_mm)),
        margin_right: Some(PageLayout::inches(layout.margin_right_mm)),
        margin_bottom: Some(PageLayout::inches(layout.margin_bottom_mm)),
        margin_left: Some(PageLayout::inches(layout.margin_left_mm)),
        print_background: Some(layout.print_background),
        ..Default::default()
    }
}
