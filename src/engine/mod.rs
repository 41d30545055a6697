//! Shared rendering engine with single-flight lazy initialisation.
//!
//! ## State machine
//!
//! ```text
//!             acquire()                 ensure_runtime + launch ok
//! Uninitialized ────────▶ Initializing ──────────────────────────▶ Ready(Arc<E>)
//!       ▲                      │
//!       └──────────────────────┘
//!        error or cancellation
//! ```
//!
//! `Ready` is terminal: every later [`RenderEngineManager::acquire`] clones
//! the same `Arc`. A failed or cancelled initialisation is not cached; the
//! state reverts so the next caller tries again.
//!
//! The whole transition happens while holding one `tokio::sync::Mutex`, so
//! concurrent callers queue on the lock and then find the engine ready. No
//! caller can observe a half-initialised engine and at most one
//! initialisation sequence runs at a time.
//!
//! The two initialisation steps and the per-page print are behind the
//! [`EngineLauncher`] and [`RenderEngine`] traits; [`chromium`] provides the
//! production implementation.

pub mod chromium;

use crate::config::PageLayout;
use crate::error::{EngineError, PrintError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use chromium::{ChromiumEngine, ChromiumLauncher};

/// A running engine able to turn a composed HTML page into PDF bytes.
///
/// Implementations must isolate each call (one page context per call) so
/// concurrent renders sharing the engine do not interfere.
#[async_trait]
pub trait RenderEngine: Send + Sync + 'static {
    async fn print_pdf(&self, html: &str, layout: &PageLayout) -> Result<Vec<u8>, PrintError>;
}

/// The two-step initialisation of a [`RenderEngine`].
#[async_trait]
pub trait EngineLauncher: Send + Sync + 'static {
    type Engine: RenderEngine;

    /// Make the engine's runtime dependency available locally, downloading
    /// it if needed. Returns the path to launch.
    async fn ensure_runtime(&self) -> Result<PathBuf, EngineError>;

    /// Start the engine from the runtime at `runtime`.
    async fn launch(&self, runtime: &Path) -> Result<Self::Engine, EngineError>;
}

enum EngineState<E> {
    Uninitialized,
    Initializing,
    Ready(Arc<E>),
}

impl<E> EngineState<E> {
    fn label(&self) -> &'static str {
        match self {
            EngineState::Uninitialized => "uninitialized",
            EngineState::Initializing => "initializing",
            EngineState::Ready(_) => "ready",
        }
    }
}

/// Owns the lazily started engine shared by every render in the process.
pub struct RenderEngineManager<L: EngineLauncher> {
    launcher: L,
    state: Mutex<EngineState<L::Engine>>,
    initializations: AtomicUsize,
}

impl<L: EngineLauncher> RenderEngineManager<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            state: Mutex::new(EngineState::Uninitialized),
            initializations: AtomicUsize::new(0),
        }
    }

    /// Return the shared engine, initialising it on first use.
    ///
    /// # Errors
    /// - [`EngineError::DependencyUnavailable`] when the runtime cannot be obtained
    /// - [`EngineError::LaunchFailed`] when the engine does not start
    /// - [`EngineError::Cancelled`] when `cancel` fires first; the state is
    ///   reset and an engine already shared with others is left running
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<Arc<L::Engine>, EngineError> {
        let mut state = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            guard = self.state.lock() => guard,
        };

        if let EngineState::Ready(ref engine) = *state {
            return Ok(Arc::clone(engine));
        }

        debug!("Engine state: {} → initializing", state.label());
        *state = EngineState::Initializing;
        self.initializations.fetch_add(1, Ordering::SeqCst);
        let start = Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(EngineError::Cancelled),
            r = self.initialize() => r,
        };

        match outcome {
            Ok(engine) => {
                let engine = Arc::new(engine);
                *state = EngineState::Ready(Arc::clone(&engine));
                info!("Rendering engine ready in {:?}", start.elapsed());
                Ok(engine)
            }
            Err(e) => {
                *state = EngineState::Uninitialized;
                warn!("Engine initialisation failed, will retry on next use: {}", e);
                Err(e)
            }
        }
    }

    async fn initialize(&self) -> Result<L::Engine, EngineError> {
        let runtime = self.launcher.ensure_runtime().await?;
        debug!("Engine runtime at {}", runtime.display());
        self.launcher.launch(&runtime).await
    }

    /// Number of initialisation sequences started so far.
    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::SeqCst)
    }

    /// `true` once an engine is running. Returns `false` while another
    /// caller holds the lock.
    pub fn is_ready(&self) -> bool {
        self.state
            .try_lock()
            .map(|s| matches!(*s, EngineState::Ready(_)))
            .unwrap_or(false)
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }
}
