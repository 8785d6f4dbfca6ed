//! # blogpress
//!
//! Convert Markdown and the `#tag` block-markup dialect into styled,
//! self-contained HTML blog pages.
//!
//! ## Pipeline Overview
//!
//! ```text
//! source (.md / .markdown / .mbs)
//!  │
//!  ├─ 1. Metadata  #title / #description, og:image / og:url from the date
//!  ├─ 2. Media     download remote images/videos next to the page
//!  ├─ 3. Render    Markdown (pulldown-cmark) or block markup, styled blocks
//!  ├─ 4. Headings  slug anchors + optional navigation list
//!  └─ 5. Assemble  substitute into the HTML shell
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blogpress::{convert_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .base_url("https://blog.example.org")
//!         .build()?;
//!     let output = convert_file("posts/day1.mbs", &config).await?;
//!     println!("wrote {:?}", output.output_path);
//!     for warning in &output.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`    | on | Enables the `blogpress` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `server` | on | Enables [`server`] and, with `cli`, the `blogpress-server` binary (axum) |
//!
//! Disable both when using only the library:
//! ```toml
//! blogpress = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod archive;
pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
#[cfg(feature = "server")]
pub mod server;
pub mod styles;
pub mod template;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AnchorPolicy, ConversionConfig, ConversionConfigBuilder};
pub use context::RenderContext;
pub use convert::{convert_bytes, convert_file, convert_source, convert_sync, convert_to_dir};
pub use error::{BlogPressError, MarkupWarning, MediaError};
pub use output::{ConversionOutput, ConversionStats, Heading, MediaOutcome, Metadata};
pub use pipeline::input::{InputFormat, SourceDocument};
pub use pipeline::media::{HttpFetcher, MediaFetcher};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
