//! CLI binary for article2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConvertConfig`, runs one conversion and reports the outcome.

use anyhow::{Context, Result};
use article2pdf::{
    Article2PdfError, CancellationToken, ConversionProgressCallback, ConvertConfig,
    ConvertRequest, Converter, ExtractedDocument, ProgressCallback,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Stage spinner plus a byte bar shown only while Chromium is downloaded.
struct CliProgressCallback {
    spinner: ProgressBar,
    download: Mutex<Option<ProgressBar>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        spinner.set_prefix("Preparing");
        spinner.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            spinner,
            download: Mutex::new(None),
        })
    }

    fn stage(&self, prefix: &'static str, msg: String) {
        self.spinner.set_prefix(prefix);
        self.spinner.set_message(msg);
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
        if let Ok(mut guard) = self.download.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_fetch_start(&self, url: &str) {
        self.stage("Fetching", url.to_string());
    }

    fn on_fetch_retry(&self, attempt: u32, max_retries: u32, delay_ms: u64, reason: &str) {
        self.spinner.println(format!(
            "  {} retry {attempt}/{max_retries} in {}  {}",
            red("↻"),
            dim(&format!("{:.1}s", delay_ms as f64 / 1000.0)),
            dim(reason),
        ));
    }

    fn on_fetched(&self, markup_bytes: usize) {
        self.stage("Extracting", format!("{markup_bytes} bytes of HTML"));
    }

    fn on_extracted(&self, document: &ExtractedDocument) {
        self.spinner
            .println(format!("  {} {}", green("✓"), bold(document.title())));
    }

    fn on_engine_download(&self, downloaded: u64, total: Option<u64>) {
        let Ok(mut guard) = self.download.lock() else {
            return;
        };
        let bar = guard.get_or_insert_with(|| {
            let bar = ProgressBar::new(total.unwrap_or(0));
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {prefix:.bold}  \
                     [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  ")
                .tick_strings(TICKS),
            );
            bar.set_prefix("Chromium");
            bar
        });
        if let Some(t) = total {
            if bar.length() != Some(t) {
                bar.set_length(t);
            }
        }
        bar.set_position(downloaded);
    }

    fn on_render_start(&self, destination: &Path) {
        self.stage("Rendering", destination.display().to_string());
    }

    fn on_render_complete(&self, _destination: &Path, _pdf_bytes: usize) {
        self.finish();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Save an article as PDF
  article2pdf https://example.com/posts/understanding-async -o async.pdf

  # Apply your own stylesheet on top of the defaults
  article2pdf https://example.com/post -o post.pdf --style print.css

  # Use an installed browser inside a container
  article2pdf https://example.com/post -o post.pdf --chrome /usr/bin/chromium --no-sandbox

  # Machine-readable summary
  article2pdf https://example.com/post -o post.pdf --json

ENVIRONMENT VARIABLES:
  CHROMIUM_EXECUTABLE      Path to an existing Chrome/Chromium; skips auto-download
  CHROMIUM_AUTO_CACHE_DIR  Override the browser cache directory
  RUST_LOG                 Override log filtering (e.g. article2pdf=debug)

SETUP:
  A headless Chromium (~100 MB) is downloaded automatically on first run and
  cached per version. No manual browser setup is required.
"#;

const TERMS_NOTICE: &str = "Note: the site's Terms of Service may prohibit automated access. \
Use this tool responsibly and at your own risk.";

/// Save web articles as clean, print-ready PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "article2pdf",
    version,
    about = "Save web articles as clean, print-ready PDFs",
    long_about = "Download a web article, isolate its title, byline and body from the \
surrounding page chrome, and render it to an A4 PDF with headless Chromium.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// HTTP/HTTPS URL of the article.
    url: String,

    /// Destination PDF file.
    #[arg(short, long, env = "ARTICLE2PDF_OUTPUT")]
    output: PathBuf,

    /// CSS file applied after the default stylesheet.
    #[arg(long, env = "ARTICLE2PDF_STYLE")]
    style: Option<PathBuf>,

    /// Chrome/Chromium executable to use instead of the managed download.
    #[arg(long, env = "CHROMIUM_EXECUTABLE")]
    chrome: Option<PathBuf>,

    /// Launch Chromium without its sandbox (needed in most containers).
    #[arg(long, env = "ARTICLE2PDF_NO_SANDBOX")]
    no_sandbox: bool,

    /// Pause before the request, in milliseconds.
    #[arg(long, env = "ARTICLE2PDF_DELAY_MS", default_value_t = 2000)]
    delay_ms: u64,

    /// Retries on 429/5xx or network failure.
    #[arg(long, env = "ARTICLE2PDF_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// HTTP request timeout in seconds.
    #[arg(long, env = "ARTICLE2PDF_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Print a JSON summary on stdout.
    #[arg(long, env = "ARTICLE2PDF_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ARTICLE2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "ARTICLE2PDF_QUIET")]
    quiet: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "ARTICLE2PDF_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress = show_progress.then(CliProgressCallback::new);

    match run(&cli, progress.clone()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(ref p) = progress {
                p.finish();
            }
            match e.downcast_ref::<Article2PdfError>() {
                Some(err) => {
                    eprintln!("{} {}", red("✘"), bold(err.headline()));
                    eprintln!("  {err}");
                    ExitCode::from(exit_byte(err.exit_code()))
                }
                None => {
                    eprintln!("{} {e:#}", red("✘"));
                    ExitCode::FAILURE
                }
            }
        }
    }
}

async fn run(cli: &Cli, progress: Option<Arc<CliProgressCallback>>) -> Result<()> {
    if cli.url.trim().is_empty() {
        return Err(Article2PdfError::InvalidConfig("URL must not be empty".into()).into());
    }

    if shows_notice(cli) {
        eprintln!("{}", dim(TERMS_NOTICE));
    }

    let callback = progress.map(|p| p as ProgressCallback);
    let config = build_config(cli, callback)?;
    let converter = Converter::new(&config)?;

    // Ctrl-C cancels the in-flight stage instead of killing the process
    // mid-write.
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let mut request = ConvertRequest::new(cli.url.trim(), &cli.output);
    if let Some(ref css) = cli.style {
        request = request.with_stylesheet(css);
    }

    let summary = converter.convert(&request, &cancel).await?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        let byline = match (&summary.author, summary.publish_date) {
            (Some(a), Some(d)) => format!("by {a}, {d}"),
            (Some(a), None) => format!("by {a}"),
            (None, Some(d)) => d.to_string(),
            (None, None) => String::new(),
        };
        eprintln!(
            "{}  {}  {}",
            green("✔"),
            bold(&summary.title),
            dim(&byline)
        );
        eprintln!(
            "   {} KB  {}ms  →  {}",
            summary.pdf_bytes / 1024,
            summary.duration_ms,
            bold(&summary.output_path.display().to_string()),
        );
    }
    Ok(())
}

/// The terms notice goes to stderr unless output is quiet or machine-read.
fn shows_notice(cli: &Cli) -> bool {
    !cli.quiet && !cli.json
}

/// Map CLI args to `ConvertConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConvertConfig> {
    let mut builder = ConvertConfig::builder()
        .politeness_delay_ms(cli.delay_ms)
        .max_retries(cli.max_retries)
        .request_timeout_secs(cli.timeout)
        .sandbox(!cli.no_sandbox);

    if let Some(ref exe) = cli.chrome {
        builder = builder.chrome_executable(exe);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    Ok(builder.build()?)
}

fn exit_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}
