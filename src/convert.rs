//! Conversion entry points.
//!
//! [`convert_source`] runs the pipeline on a document already in memory and
//! returns the assembled page without writing it. The `convert_*` functions
//! around it add file I/O: reading the source, choosing the output name and
//! writing the page atomically next to its downloaded media.

use crate::config::ConversionConfig;
use crate::context::RenderContext;
use crate::error::{BlogPressError, MarkupWarning};
use crate::output::{ConversionOutput, ConversionStats, MediaOutcome};
use crate::pipeline::input::{self, InputFormat, SourceDocument};
use crate::pipeline::media::{FilenameRegistry, MediaLocalizer};
use crate::pipeline::{assemble, blocks, document, headings, markdown, metadata};
use crate::template::DEFAULT_SHELL;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Name of the page written by [`convert_bytes`].
pub const INDEX_FILE: &str = "index.html";

/// Convert an in-memory document.
///
/// Remote media are downloaded into `ctx.output_dir()` (which should exist);
/// the page itself is not written. `output_path` is `None` in the result.
///
/// # Errors
/// Only when the HTTP client for media downloads cannot be built. Markup
/// problems and failed downloads are reported inside the output.
pub async fn convert_source(
    source: &SourceDocument,
    ctx: &RenderContext,
    config: &ConversionConfig,
) -> Result<ConversionOutput, BlogPressError> {
    let registry = Arc::new(FilenameRegistry::new(ctx.output_dir()));
    render_page(source, ctx, config, registry).await
}

/// Convert a source file and write `<stem>.html` into the input's directory.
pub async fn convert_file(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, BlogPressError> {
    let input = input.as_ref();
    let dir = match input.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    convert_to_dir(input, dir, config).await
}

/// Convert a source file and write `<stem>.html` plus media into `out_dir`.
///
/// # Errors
/// Returns `Err` for a missing, unreadable or unsupported input, or when the
/// output directory or page cannot be written.
pub async fn convert_to_dir(
    input: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, BlogPressError> {
    let input = input.as_ref();
    let out_dir = out_dir.as_ref();
    info!("Starting conversion: {}", input.display());

    let source = input::read_source(input).await?;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "index".to_string());
    let page_name = format!("{stem}.html");

    write_output(&source, out_dir, &page_name, config).await
}

/// Convert an uploaded body. `filename` selects the format; the page is
/// written as `index.html` in `out_dir`.
pub async fn convert_bytes(
    bytes: &[u8],
    filename: &str,
    out_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, BlogPressError> {
    let format = InputFormat::from_name(filename)?;
    info!("Starting conversion of upload '{}' ({} bytes)", filename, bytes.len());
    let source = SourceDocument::from_bytes(bytes, format);
    write_output(&source, out_dir.as_ref(), INDEX_FILE, config).await
}

/// Synchronous wrapper around [`convert_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, BlogPressError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BlogPressError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_file(input, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn write_output(
    source: &SourceDocument,
    out_dir: &Path,
    page_name: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutput, BlogPressError> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .map_err(|e| BlogPressError::OutputDirFailed {
            path: out_dir.to_path_buf(),
            source: e,
        })?;

    let ctx = RenderContext::from_config(config, out_dir);
    let registry = Arc::new(FilenameRegistry::new(out_dir));
    // Media must never take the page's name, or its temporary sibling's.
    registry.reserve(page_name);
    registry.reserve(&format!("{page_name}.tmp"));

    let mut output = render_page(source, &ctx, config, registry).await?;
    let path = out_dir.join(page_name);
    write_atomic(&path, &output.html).await?;
    info!("Wrote {}", path.display());
    output.output_path = Some(path);
    Ok(output)
}

/// Write to a temporary sibling, then rename into place.
async fn write_atomic(path: &Path, contents: &str) -> Result<(), BlogPressError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let write_err = |e| BlogPressError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };
    tokio::fs::write(&tmp, contents).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(write_err(e));
    }
    Ok(())
}

async fn render_page(
    source: &SourceDocument,
    ctx: &RenderContext,
    config: &ConversionConfig,
    registry: Arc<FilenameRegistry>,
) -> Result<ConversionOutput, BlogPressError> {
    let start = Instant::now();

    // ── Step 1: Metadata, then strip directive lines ─────────────────────
    let meta = metadata::extract(source.text(), ctx, config);
    let text = metadata::strip_directives(source.text());
    debug!("Title: {:?}", meta.title);

    let localizer = if config.download_media {
        Some(MediaLocalizer::new(config, registry)?)
    } else {
        None
    };

    // ── Step 2: Localize media and render, per format ────────────────────
    let mut media: Vec<MediaOutcome> = Vec::new();
    let mut warnings: Vec<MarkupWarning> = Vec::new();
    let mut body_blocks = match source.format() {
        InputFormat::Markdown => {
            let text = match localizer {
                Some(ref l) => {
                    let (text, outcomes) = l.localize_markdown(&text).await;
                    media = outcomes;
                    text
                }
                None => text,
            };
            markdown::render(&text)
        }
        InputFormat::BlockMarkup => {
            let parsed = blocks::parse(&text);
            warnings = parsed.warnings;
            let mut parsed_blocks = parsed.blocks;
            if let Some(ref l) = localizer {
                media = l.localize_blocks(&mut parsed_blocks).await;
            }
            parsed_blocks
        }
    };

    // ── Step 3: Heading anchors ──────────────────────────────────────────
    let heads = headings::annotate(&mut body_blocks, config.anchor_policy);

    // ── Step 4: Emit and assemble ────────────────────────────────────────
    let body = document::emit(&body_blocks);
    let nav = if config.include_nav {
        headings::render_nav(&heads)
    } else {
        String::new()
    };
    let shell = config.shell_template.as_deref().unwrap_or(DEFAULT_SHELL);
    let html = assemble::assemble(shell, &meta, &nav, &body);

    let stats = ConversionStats {
        media_found: media.len(),
        media_downloaded: media.iter().filter(|m| m.is_localized()).count(),
        media_failed: media.iter().filter(|m| m.error.is_some()).count(),
        bytes_downloaded: media.iter().map(|m| m.bytes).sum(),
        headings: heads.len(),
        warnings: warnings.len(),
        total_duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} heading(s), {}/{} media localized, {} warning(s), {}ms",
        stats.headings,
        stats.media_downloaded,
        stats.media_found,
        stats.warnings,
        stats.total_duration_ms
    );

    Ok(ConversionOutput {
        html,
        body,
        metadata: meta,
        headings: heads,
        media,
        warnings,
        output_path: None,
        stats,
    })
}
