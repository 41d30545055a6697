//! Test doubles for the rendering engine.
#![allow(dead_code)]

use article2pdf::{EngineError, EngineLauncher, PageLayout, PrintError, PrintStage, RenderEngine};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const FAKE_PDF: &[u8] = b"%PDF-1.7\n%fake\n%%EOF\n";

/// What the fake engine returns from `print_pdf`.
#[derive(Clone, Debug)]
pub enum PrintBehaviour {
    Pdf,
    Bytes(Vec<u8>),
    Fail(PrintStage),
}

/// Records every page it is asked to print.
#[derive(Debug)]
pub struct FakeEngine {
    pub id: usize,
    pub pages: Mutex<Vec<String>>,
    behaviour: PrintBehaviour,
}

impl FakeEngine {
    pub fn printed(&self) -> Vec<String> {
        self.pages.lock().unwrap().clone()
    }
}

#[async_trait]
impl RenderEngine for FakeEngine {
    async fn print_pdf(&self, html: &str, _layout: &PageLayout) -> Result<Vec<u8>, PrintError> {
        self.pages.lock().unwrap().push(html.to_string());
        match &self.behaviour {
            PrintBehaviour::Pdf => Ok(FAKE_PDF.to_vec()),
            PrintBehaviour::Bytes(b) => Ok(b.clone()),
            PrintBehaviour::Fail(stage) => Err(PrintError::new(*stage, "simulated failure")),
        }
    }
}

/// Counts initialisation steps; failures and delays are injectable.
pub struct FakeLauncher {
    pub runtime_calls: AtomicUsize,
    pub launch_calls: AtomicUsize,
    /// The first N `ensure_runtime` calls fail with `DependencyUnavailable`.
    pub runtime_failures: AtomicUsize,
    /// The first N `launch` calls fail with `LaunchFailed`.
    pub launch_failures: AtomicUsize,
    pub delay: Duration,
    pub behaviour: PrintBehaviour,
}

impl Default for FakeLauncher {
    fn default() -> Self {
        Self {
            runtime_calls: AtomicUsize::new(0),
            launch_calls: AtomicUsize::new(0),
            runtime_failures: AtomicUsize::new(0),
            launch_failures: AtomicUsize::new(0),
            delay: Duration::ZERO,
            behaviour: PrintBehaviour::Pdf,
        }
    }
}

impl FakeLauncher {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn failing_runtime(times: usize) -> Self {
        Self {
            runtime_failures: AtomicUsize::new(times),
            ..Self::default()
        }
    }

    pub fn failing_launch(times: usize) -> Self {
        Self {
            launch_failures: AtomicUsize::new(times),
            ..Self::default()
        }
    }

    pub fn printing(behaviour: PrintBehaviour) -> Self {
        Self {
            behaviour,
            ..Self::default()
        }
    }

    pub fn runtime_calls(&self) -> usize {
        self.runtime_calls.load(Ordering::SeqCst)
    }

    pub fn launch_calls(&self) -> usize {
        self.launch_calls.load(Ordering::SeqCst)
    }
}

fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl EngineLauncher for FakeLauncher {
    type Engine = FakeEngine;

    async fn ensure_runtime(&self) -> Result<PathBuf, EngineError> {
        self.runtime_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if take_failure(&self.runtime_failures) {
            return Err(EngineError::DependencyUnavailable("simulated download failure".into()));
        }
        Ok(PathBuf::from("/fake/chromium"))
    }

    async fn launch(&self, _runtime: &Path) -> Result<FakeEngine, EngineError> {
        let id = self.launch_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.launch_failures) {
            return Err(EngineError::LaunchFailed("simulated launch failure".into()));
        }
        Ok(FakeEngine {
            id,
            pages: Mutex::new(Vec::new()),
            behaviour: self.behaviour.clone(),
        })
    }
}
