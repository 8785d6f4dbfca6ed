//! Output types returned by a conversion.

use crate::error::{MarkupWarning, MediaError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Page metadata substituted into the shell.
///
/// `title` and `description` come from the `#title` / `#description`
/// directives (or configured defaults). `og_image` and `og_url` depend only
/// on the render date and base URL, never on the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub description: String,
    pub og_image: String,
    pub og_url: String,
}

/// One annotated heading, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// 1, 2 or 3.
    pub level: u8,
    /// Plain text of the heading.
    pub text: String,
    /// Slug used as the element `id`.
    pub anchor_id: String,
}

/// What happened to one distinct remote media URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaOutcome {
    /// Original remote URL as written in the source.
    pub url: String,
    /// Local filename inside the output directory when the download succeeded.
    pub local_name: Option<String>,
    /// Bytes written.
    pub bytes: u64,
    /// Why the download failed, if it did.
    pub error: Option<MediaError>,
}

impl MediaOutcome {
    pub fn is_localized(&self) -> bool {
        self.local_name.is_some()
    }
}

/// Aggregate numbers for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Distinct remote media URLs found.
    pub media_found: usize,
    pub media_downloaded: usize,
    pub media_failed: usize,
    pub bytes_downloaded: u64,
    pub headings: usize,
    pub warnings: usize,
    pub total_duration_ms: u64,
}

/// The assembled page plus everything learned while building it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The complete HTML document.
    pub html: String,
    /// The rendered article body (the `$content` substitution).
    pub body: String,
    pub metadata: Metadata,
    /// Annotated headings in document order.
    pub headings: Vec<Heading>,
    /// One record per distinct remote media URL, in first-reference order.
    pub media: Vec<MediaOutcome>,
    /// Block-markup diagnostics. Always empty for Markdown input.
    pub warnings: Vec<MarkupWarning>,
    /// Where the page was written, when the entry point writes one.
    pub output_path: Option<PathBuf>,
    pub stats: ConversionStats,
}
