//! CLI binary for blogpress.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, prompts for a file when none is given, and prints
//! results.

use anyhow::{Context, Result};
use blogpress::pipeline::input::normalise_typed_path;
use blogpress::{
    convert_to_dir, AnchorPolicy, ConversionConfig, ConversionProgressCallback, InputFormat,
    ProgressCallback,
};
use chrono::NaiveDate;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the media downloads plus a log
/// line per file. Downloads complete out of order, so start times are keyed
/// by URL.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<String, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::hidden();
        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn elapsed_secs(&self, url: &str) -> f64 {
        self.start_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(url)
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_media_start(&self, total_media: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        self.bar.set_length(total_media as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Downloading");
        self.bar.enable_steady_tick(Duration::from_millis(80));
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Fetching {total_media} remote media file(s)…"))
        ));
    }

    fn on_fetch_start(&self, url: &str, local_name: &str) {
        self.start_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), Instant::now());
        self.bar.set_message(local_name.to_string());
    }

    fn on_media_complete(&self, url: &str, local_name: &str, bytes: u64) {
        let secs = self.elapsed_secs(url);
        self.bar.println(format!(
            "  {} {:<32} {:>10}  {}",
            green("✓"),
            local_name,
            dim(&format!("{bytes} bytes")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_media_error(&self, url: &str, error: &str) {
        let secs = self.elapsed_secs(url);

        // Keep the log tidy on long error chains.
        let msg: String = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {}  {}",
            red("✗"),
            red(&msg),
            dim(&format!("{secs:.1}s"))
        ));
        self.bar.inc(1);
    }

    fn on_media_finished(&self, total_media: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total_media.saturating_sub(success_count);
        if failed == 0 {
            eprintln!(
                "{} {} media file(s) downloaded",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} media file(s) downloaded  ({} kept as remote links)",
                cyan("⚠"),
                bold(&success_count.to_string()),
                total_media,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Prompt for the file interactively
  blogpress

  # Convert a block-markup post; writes posts/day1.html
  blogpress posts/day1.mbs

  # Markdown into a separate directory, with a table of contents
  blogpress notes.md -o site/2025-01-02 --nav

  # Pin the date used for og:image / og:url
  blogpress post.md --date 2025-01-02 --base-url https://blog.example.org

  # Custom page shell
  blogpress post.md --template my-shell.html

  # Machine-readable summary
  blogpress post.md --json > summary.json

SHELL PLACEHOLDERS:
  $title  $description  $og_image  $og_url  $nav  $content

ENVIRONMENT VARIABLES:
  BLOGPRESS_BASE_URL          Base of og:image / og:url
  BLOGPRESS_DATE              Fixed date (YYYY-MM-DD)
  BLOGPRESS_TEMPLATE          Custom shell template path
  BLOGPRESS_CONCURRENCY       Parallel media downloads
  BLOGPRESS_DOWNLOAD_TIMEOUT  Per-download timeout (seconds)
  RUST_LOG                    Log filter, overrides --verbose / --quiet
"#;

/// Convert Markdown and block-markup posts into styled HTML pages.
#[derive(Parser, Debug)]
#[command(
    name = "blogpress",
    version,
    about = "Convert Markdown and block-markup posts into styled HTML pages",
    long_about = "Convert a Markdown (.md, .markdown) or block-markup (.mbs) post into a \
self-contained HTML page. Remote images and videos are downloaded next to the page and \
their references rewritten to the local copies.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Source file (.md, .markdown or .mbs). Prompted for when omitted.
    input: Option<PathBuf>,

    /// Directory for the page and its media. Default: the input's directory.
    #[arg(short, long, env = "BLOGPRESS_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Date for og:image / og:url (YYYY-MM-DD). Default: today.
    #[arg(long, env = "BLOGPRESS_DATE", value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Base URL for og:image / og:url.
    #[arg(long, env = "BLOGPRESS_BASE_URL", default_value = blogpress::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Path to a custom shell template.
    #[arg(long, env = "BLOGPRESS_TEMPLATE")]
    template: Option<PathBuf>,

    /// Insert a heading navigation list at `$nav`.
    #[arg(long, env = "BLOGPRESS_NAV")]
    nav: bool,

    /// Suffix repeated heading ids with -1, -2, …
    #[arg(long, env = "BLOGPRESS_UNIQUE_ANCHORS")]
    unique_anchors: bool,

    /// Number of parallel media downloads.
    #[arg(short, long, env = "BLOGPRESS_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Per-download timeout in seconds.
    #[arg(long, env = "BLOGPRESS_DOWNLOAD_TIMEOUT", default_value_t = 30)]
    download_timeout: u64,

    /// Leave remote media references untouched.
    #[arg(long, env = "BLOGPRESS_NO_DOWNLOAD")]
    no_download: bool,

    /// Print a JSON summary (metadata, headings, media, warnings, stats).
    #[arg(long, env = "BLOGPRESS_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "BLOGPRESS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BLOGPRESS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "BLOGPRESS_QUIET")]
    quiet: bool,
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless --verbose asks for them.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Resolve input ────────────────────────────────────────────────────
    let input = match cli.input {
        Some(ref path) => path.clone(),
        None => tokio::task::block_in_place(prompt_for_input)?,
    };
    let out_dir = match cli.output_dir {
        Some(ref dir) => dir.clone(),
        None => parent_dir(&input),
    };

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert_to_dir(&input, &out_dir, &config)
        .await
        .with_context(|| format!("Conversion of {} failed", input.display()))?;

    if cli.json {
        let summary = serde_json::json!({
            "output_path": output.output_path,
            "metadata": output.metadata,
            "headings": output.headings,
            "media": output.media,
            "warnings": output.warnings,
            "stats": output.stats,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
        return Ok(());
    }

    if !cli.quiet {
        for warning in &output.warnings {
            eprintln!("  {} {}", yellow("⚠"), warning);
        }
        let path = output
            .output_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        eprintln!(
            "{}  {}  {}",
            green("✔"),
            bold(&path),
            dim(&format!(
                "{} heading(s), {}/{} media, {} warning(s), {}ms",
                output.stats.headings,
                output.stats.media_downloaded,
                output.stats.media_found,
                output.stats.warnings,
                output.stats.total_duration_ms
            )),
        );
    }

    Ok(())
}

/// Ask for a source path until an existing file with a supported extension
/// is given. Windows separators and drag-and-drop quotes are accepted.
fn prompt_for_input() -> Result<PathBuf> {
    let stdin = io::stdin();
    let mut lines = stdin.lock();
    loop {
        eprint!("{} ", bold("Source file (.md / .markdown / .mbs):"));
        io::stderr().flush().ok();

        let mut line = String::new();
        if lines.read_line(&mut line).context("Failed to read from stdin")? == 0 {
            anyhow::bail!("No input file given");
        }
        let path = normalise_typed_path(&line);
        if path.as_os_str().is_empty() {
            continue;
        }
        if !InputFormat::is_supported(&path.to_string_lossy()) {
            eprintln!(
                "{} unsupported extension; expected .md, .markdown or .mbs",
                red("Error:")
            );
            continue;
        }
        if !path.is_file() {
            eprintln!("{} file '{}' does not exist", red("Error:"), path.display());
            continue;
        }
        return Ok(path);
    }
}

fn parent_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .base_url(cli.base_url.clone())
        .concurrency(cli.concurrency)
        .download_timeout_secs(cli.download_timeout)
        .download_media(!cli.no_download)
        .include_nav(cli.nav)
        .anchor_policy(if cli.unique_anchors {
            AnchorPolicy::Suffix
        } else {
            AnchorPolicy::Preserve
        });

    if let Some(date) = cli.date {
        builder = builder.date(date);
    }
    if let Some(ref path) = cli.template {
        let shell = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read shell template from {:?}", path))?;
        builder = builder.shell_template(shell);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
