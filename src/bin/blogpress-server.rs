//! Upload-and-convert HTTP service.
//!
//! Serves the upload form at `/` and converts `POST /upload` into a
//! `result.zip` holding `index.html` and its media.

use anyhow::{Context, Result};
use blogpress::{AnchorPolicy, ConversionConfig};
use clap::Parser;
use std::io;
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Serve the blogpress upload form and conversion endpoint.
#[derive(Parser, Debug)]
#[command(
    name = "blogpress-server",
    version,
    about = "Serve the blogpress upload form and conversion endpoint",
    color = clap::ColorChoice::Auto
)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "BLOGPRESS_BIND", default_value = "0.0.0.0:5000")]
    bind: SocketAddr,

    /// Base URL for og:image / og:url.
    #[arg(long, env = "BLOGPRESS_BASE_URL", default_value = blogpress::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Path to a custom shell template.
    #[arg(long, env = "BLOGPRESS_TEMPLATE")]
    template: Option<std::path::PathBuf>,

    /// Insert a heading navigation list at `$nav`.
    #[arg(long, env = "BLOGPRESS_NAV")]
    nav: bool,

    /// Suffix repeated heading ids with -1, -2, …
    #[arg(long, env = "BLOGPRESS_UNIQUE_ANCHORS")]
    unique_anchors: bool,

    /// Number of parallel media downloads per upload.
    #[arg(short, long, env = "BLOGPRESS_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Per-download timeout in seconds.
    #[arg(long, env = "BLOGPRESS_DOWNLOAD_TIMEOUT", default_value_t = 30)]
    download_timeout: u64,

    /// Leave remote media references untouched.
    #[arg(long, env = "BLOGPRESS_NO_DOWNLOAD")]
    no_download: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BLOGPRESS_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

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
    if let Some(ref path) = cli.template {
        let shell = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read shell template from {:?}", path))?;
        builder = builder.shell_template(shell);
    }
    let config = builder.build().context("Invalid configuration")?;

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cli.bind))?;
    info!("blogpress-server v{} listening on {}", env!("CARGO_PKG_VERSION"), cli.bind);

    axum::serve(listener, blogpress::server::router(config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
