//! Error types for the blogpress library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`BlogPressError`]: **Fatal**: the conversion cannot proceed at all
//!   (missing input file, unsupported format, output directory not
//!   writable). Returned as `Err(BlogPressError)` from the top-level
//!   `convert*` functions.
//!
//! * [`MediaError`]: **Non-fatal**: a single remote media reference could
//!   not be downloaded. The reference keeps pointing at its remote URL and the
//!   error is stored inside [`crate::output::MediaOutcome`].
//!
//! * [`MarkupWarning`]: **Non-fatal**: a block-markup tag was unknown or its
//!   payload was malformed. The original tag text stays in the page and the
//!   warning is collected in [`crate::output::ConversionOutput::warnings`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the blogpress library.
///
/// Per-reference download failures use [`MediaError`] and markup problems use
/// [`MarkupWarning`]; neither is propagated here.
#[derive(Debug, Error)]
pub enum BlogPressError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Source file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input extension is not one of the supported formats.
    #[error("Unsupported input format '{name}'\nSupported extensions: .md, .markdown, .mbs")]
    UnsupportedFormat { name: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the output directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output HTML file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Packaging the output directory into a ZIP archive failed.
    #[error("Failed to build archive from '{path}': {detail}")]
    ArchiveFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client for media downloads could not be constructed.
    #[error("Failed to initialise the HTTP client: {0}")]
    HttpClient(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single remote media reference.
///
/// Stored in [`crate::output::MediaOutcome`] when a download fails. The
/// conversion continues and the reference keeps its original URL.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum MediaError {
    /// Connecting or transferring failed.
    #[error("Failed to download '{url}': {reason}")]
    FetchFailed { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("Failed to download '{url}': HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The fetch did not finish within the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    Timeout { url: String, secs: u64 },

    /// The response body could not be written to the output directory.
    #[error("Failed to write '{path}' for '{url}': {reason}")]
    WriteFailed {
        url: String,
        path: PathBuf,
        reason: String,
    },
}

impl MediaError {
    /// The remote URL the failed fetch was for.
    pub fn url(&self) -> &str {
        match self {
            MediaError::FetchFailed { url, .. }
            | MediaError::HttpStatus { url, .. }
            | MediaError::Timeout { url, .. }
            | MediaError::WriteFailed { url, .. } => url,
        }
    }
}

/// A non-fatal diagnostic produced while expanding block markup.
///
/// Line numbers are 1-indexed and refer to the source after directive
/// stripping.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum MarkupWarning {
    /// A `#name` tag that the parser does not know.
    #[error("line {line}: unknown tag '#{name}' left unexpanded")]
    UnknownTag { name: String, line: usize },

    /// A known tag whose payload does not have the expected shape.
    #[error("line {line}: malformed '#{tag}' payload: {reason}")]
    MalformedPayload {
        tag: String,
        line: usize,
        reason: String,
    },

    /// A `#table` tag whose pipe table could not be parsed.
    #[error("line {line}: malformed '#table': {reason}")]
    MalformedTable { line: usize, reason: String },
}
