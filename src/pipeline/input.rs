//! Input resolution: turn a path or an uploaded body into a [`SourceDocument`].
//!
//! The format is decided by file extension before any conversion work starts,
//! so an unsupported upload is rejected without touching the output
//! directory. Bytes are decoded leniently: authors paste text from anywhere
//! and a single bad byte should not cost them the whole post.

use crate::error::BlogPressError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The two supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputFormat {
    /// CommonMark with fenced code, tables and hard line breaks.
    Markdown,
    /// The `#tag` block-markup dialect (`.mbs`).
    BlockMarkup,
}

impl InputFormat {
    /// Detect the format from a file name or path by its extension.
    pub fn from_name(name: &str) -> Result<Self, BlogPressError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("md") | Some("markdown") => Ok(InputFormat::Markdown),
            Some("mbs") => Ok(InputFormat::BlockMarkup),
            _ => Err(BlogPressError::UnsupportedFormat {
                name: name.to_string(),
            }),
        }
    }

    pub fn is_supported(name: &str) -> bool {
        Self::from_name(name).is_ok()
    }
}

/// Raw source text plus its format. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    text: String,
    format: InputFormat,
}

impl SourceDocument {
    pub fn new(text: impl Into<String>, format: InputFormat) -> Self {
        Self {
            text: normalise(&text.into()),
            format,
        }
    }

    /// Decode an uploaded body. Invalid UTF-8 is replaced, never rejected.
    pub fn from_bytes(bytes: &[u8], format: InputFormat) -> Self {
        Self::new(String::from_utf8_lossy(bytes).into_owned(), format)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn format(&self) -> InputFormat {
        self.format
    }
}

/// Read a source file, validating existence, permissions and extension.
pub async fn read_source(path: &Path) -> Result<SourceDocument, BlogPressError> {
    let format = InputFormat::from_name(&path.to_string_lossy())?;

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BlogPressError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(BlogPressError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(BlogPressError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    debug!("Read {} bytes of {:?} from {}", bytes.len(), format, path.display());
    Ok(SourceDocument::from_bytes(&bytes, format))
}

/// Normalise a path typed at a prompt: Windows separators become `/` and
/// surrounding quotes (left by drag-and-drop) are removed.
pub fn normalise_typed_path(input: &str) -> PathBuf {
    let trimmed = input.trim().trim_matches(|c| c == '"' || c == '\'');
    PathBuf::from(trimmed.replace('\\', "/"))
}

/// Drop a leading BOM and convert CRLF / CR line endings to LF.
fn normalise(text: &str) -> String {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn detects_formats() {
        assert_eq!(InputFormat::from_name("post.md").unwrap(), InputFormat::Markdown);
        assert_eq!(
            InputFormat::from_name("dir/Post.MARKDOWN").unwrap(),
            InputFormat::Markdown
        );
        assert_eq!(
            InputFormat::from_name("post.mbs").unwrap(),
            InputFormat::BlockMarkup
        );
        assert!(InputFormat::from_name("post.txt").is_err());
        assert!(InputFormat::from_name("README").is_err());
        assert!(!InputFormat::is_supported(""));
    }

    #[test]
    fn decoding_is_lenient() {
        let doc =
            SourceDocument::from_bytes(b"\xEF\xBB\xBF# Hi\r\nthere \xFF", InputFormat::Markdown);
        assert_eq!(doc.text(), "# Hi\nthere \u{FFFD}");
    }

    #[test]
    fn typed_paths_are_normalised() {
        assert_eq!(
            normalise_typed_path("  \"C:\\posts\\day1.mbs\" \n"),
            PathBuf::from("C:/posts/day1.mbs")
        );
        assert_eq!(normalise_typed_path("post.md"), PathBuf::from("post.md"));
    }

    #[tokio::test]
    async fn read_missing_file() {
        let err = read_source(Path::new("/definitely/not/here.md"))
            .await
            .unwrap_err();
        assert!(matches!(err, BlogPressError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn read_rejects_unsupported_before_io() {
        let err = read_source(Path::new("/definitely/not/here.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, BlogPressError::UnsupportedFormat { .. }));
    }

    #[tokio::test]
    async fn read_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("day.mbs");
        std::fs::write(&path, "#text hello").unwrap();
        let doc = read_source(&path).await.unwrap();
        assert_eq!(doc.format(), InputFormat::BlockMarkup);
        assert_eq!(doc.text(), "#text hello");
    }
}
