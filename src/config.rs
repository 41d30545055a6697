//! Configuration types for article-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConvertConfig`], built
//! via its [`ConvertConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across tasks and to log the exact settings a
//! run used.

use crate::error::Article2PdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Millimetres per inch; the CDP print API takes inches.
const MM_PER_INCH: f64 = 25.4;

/// Configuration for one conversion pipeline.
///
/// # Example
/// ```rust
/// use article2pdf::ConvertConfig;
///
/// let config = ConvertConfig::builder()
///     .politeness_delay_ms(500)
///     .max_retries(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_retries, 2);
/// ```
#[derive(Clone)]
pub struct ConvertConfig {
    /// Pause before the first request, in milliseconds. Default: 2000.
    ///
    /// Article hosts rate-limit aggressively; one polite pause per invocation
    /// keeps the tool well below any sane threshold.
    pub politeness_delay_ms: u64,

    /// Retries after the first attempt on a transient failure. Default: 3.
    ///
    /// Only 429, 500, 502, 503, 504 and transport errors are transient.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds. Default: 1000.
    ///
    /// Doubles after each attempt (1 s → 2 s → 4 s) and is jittered so
    /// concurrent clients do not retry in lockstep.
    pub retry_base_delay_ms: u64,

    /// Per-request timeout in seconds. Default: 60.
    pub request_timeout_secs: u64,

    /// `User-Agent` header sent with the article request.
    pub user_agent: String,

    /// Browser engine settings.
    pub engine: EngineSettings,

    /// Paper size and margins of the exported PDF.
    pub layout: PageLayout,

    /// Optional progress callback for real-time stage events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            politeness_delay_ms: 2000,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            request_timeout_secs: 60,
            user_agent: default_user_agent(),
            engine: EngineSettings::default(),
            layout: PageLayout::default(),
            progress_callback: None,
        }
    }
}

/// `article2pdf/<crate version>`.
pub fn default_user_agent() -> String {
    concat!("article2pdf/", env!("CARGO_PKG_VERSION")).to_string()
}

impl fmt::Debug for ConvertConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertConfig")
            .field("politeness_delay_ms", &self.politeness_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("engine", &self.engine)
            .field("layout", &self.layout)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ConvertConfig {
    /// Create a new builder for `ConvertConfig`.
    pub fn builder() -> ConvertConfigBuilder {
        ConvertConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConvertConfig`].
#[derive(Debug)]
pub struct ConvertConfigBuilder {
    config: ConvertConfig,
}

impl ConvertConfigBuilder {
    pub fn politeness_delay_ms(mut self, ms: u64) -> Self {
        self.config.politeness_delay_ms = ms;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_base_delay_ms(mut self, ms: u64) -> Self {
        self.config.retry_base_delay_ms = ms;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.engine.executable = Some(path.into());
        self
    }

    pub fn sandbox(mut self, enabled: bool) -> Self {
        self.config.engine.sandbox = enabled;
        self
    }

    pub fn launch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.engine.launch_timeout_secs = secs;
        self
    }

    pub fn load_timeout_secs(mut self, secs: u64) -> Self {
        self.config.engine.load_timeout_secs = secs;
        self
    }

    pub fn layout(mut self, layout: PageLayout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConvertConfig, Article2PdfError> {
        let c = &self.config;
        if c.request_timeout_secs == 0 {
            return Err(Article2PdfError::InvalidConfig(
                "Request timeout must be ≥ 1 second".into(),
            ));
        }
        if c.user_agent.trim().is_empty() {
            return Err(Article2PdfError::InvalidConfig(
                "User agent must not be empty".into(),
            ));
        }
        if c.engine.launch_timeout_secs == 0 || c.engine.load_timeout_secs == 0 {
            return Err(Article2PdfError::InvalidConfig(
                "Engine timeouts must be ≥ 1 second".into(),
            ));
        }
        c.layout.validate()?;
        Ok(self.config)
    }
}

// ── Engine settings ──────────────────────────────────────────────────────

/// How the headless browser is located and started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Explicit browser executable. `None` resolves via `chromium-auto`.
    pub executable: Option<PathBuf>,

    /// Run Chromium with its sandbox. Default: true.
    ///
    /// Containers running as root usually need this off.
    pub sandbox: bool,

    /// Seconds allowed for the browser process to come up. Default: 30.
    pub launch_timeout_secs: u64,

    /// Seconds allowed for a composed page to finish loading. Default: 30.
    pub load_timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            executable: None,
            sandbox: true,
            launch_timeout_secs: 30,
            load_timeout_secs: 30,
        }
    }
}

// ── Page layout ──────────────────────────────────────────────────────────

/// Paper size and margins of the exported PDF, in millimetres.
///
/// The default is A4 with 20 mm top/bottom and 15 mm left/right margins,
/// background graphics included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_top_mm: f64,
    pub margin_right_mm: f64,
    pub margin_bottom_mm: f64,
    pub margin_left_mm: f64,
    pub print_background: bool,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageLayout {
    /// A4 portrait, 20 mm vertical and 15 mm horizontal margins.
    pub const fn a4() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_top_mm: 20.0,
            margin_right_mm: 15.0,
            margin_bottom_mm: 20.0,
            margin_left_mm: 15.0,
            print_background: true,
        }
    }

    /// Converts a millimetre length to inches.
    pub fn inches(mm: f64) -> f64 {
        mm / MM_PER_INCH
    }

    fn validate(&self) -> Result<(), Article2PdfError> {
        if self.width_mm <= 0.0 || self.height_mm <= 0.0 {
            return Err(Article2PdfError::InvalidConfig(format!(
                "Page size must be positive, got {}×{} mm",
                self.width_mm, self.height_mm
            )));
        }
        let margins = [
            self.margin_top_mm,
            self.margin_right_mm,
            self.margin_bottom_mm,
            self.margin_left_mm,
        ];
        if margins.iter().any(|m| *m < 0.0) {
            return Err(Article2PdfError::InvalidConfig(
                "Margins must not be negative".into(),
            ));
        }
        if self.margin_left_mm + self.margin_right_mm >= self.width_mm
            || self.margin_top_mm + self.margin_bottom_mm >= self.height_mm
        {
            return Err(Article2PdfError::InvalidConfig(
                "Margins leave no printable area".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let c = ConvertConfig::default();
        assert_eq!(c.politeness_delay_ms, 2000);
        assert_eq!(c.max_retries, 3);
        assert_eq!(c.retry_base_delay_ms, 1000);
        assert!(c.user_agent.starts_with("article2pdf/"));
        assert!(c.engine.sandbox);
        assert_eq!(c.layout, PageLayout::a4());
    }

    #[test]
    fn a4_margins_in_inches() {
        let l = PageLayout::a4();
        assert!((PageLayout::inches(l.width_mm) - 8.267).abs() < 0.001);
        assert!((PageLayout::inches(l.margin_top_mm) - 0.787).abs() < 0.001);
        assert!((PageLayout::inches(l.margin_left_mm) - 0.590).abs() < 0.001);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ConvertConfig::builder()
            .request_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, Article2PdfError::InvalidConfig(_)));
    }

    #[test]
    fn oversized_margins_are_rejected() {
        let layout = PageLayout {
            margin_left_mm: 110.0,
            margin_right_mm: 110.0,
            ..PageLayout::a4()
        };
        assert!(ConvertConfig::builder().layout(layout).build().is_err());
    }

    #[test]
    fn builder_sets_engine_fields() {
        let c = ConvertConfig::builder()
            .chrome_executable("/usr/bin/chromium")
            .sandbox(false)
            .build()
            .unwrap();
        assert_eq!(c.engine.executable, Some(PathBuf::from("/usr/bin/chromium")));
        assert!(!c.engine.sandbox);
    }
}
