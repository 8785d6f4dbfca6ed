//! ZIP packaging of an output directory.
//!
//! The archive holds the regular files at the top level of the directory
//! (the page and its media), sorted by name, Deflate-compressed. Building it
//! is blocking file I/O plus compression, so it runs in `spawn_blocking`.

use crate::error::BlogPressError;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zip the files of `dir` into an in-memory archive.
pub async fn zip_dir(dir: &Path) -> Result<Vec<u8>, BlogPressError> {
    let dir = dir.to_path_buf();
    let failed_dir = dir.clone();
    tokio::task::spawn_blocking(move || zip_dir_blocking(&dir))
        .await
        .map_err(|e| BlogPressError::ArchiveFailed {
            path: failed_dir,
            detail: format!("archive task panicked: {e}"),
        })?
}

fn zip_dir_blocking(dir: &Path) -> Result<Vec<u8>, BlogPressError> {
    let fail = |detail: String| BlogPressError::ArchiveFailed {
        path: dir.to_path_buf(),
        detail,
    };

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| fail(e.to_string()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for path in &files {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let data = std::fs::read(path).map_err(|e| fail(format!("{name}: {e}")))?;
        zip.start_file(name.as_str(), options)
            .map_err(|e| fail(format!("{name}: {e}")))?;
        zip.write_all(&data).map_err(|e| fail(format!("{name}: {e}")))?;
        debug!("Archived {} ({} bytes)", name, data.len());
    }

    let cursor = zip.finish().map_err(|e| fail(e.to_string()))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    #[tokio::test]
    async fn archives_top_level_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        std::fs::write(dir.path().join("pic.png"), [0u8, 1, 2, 3]).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let bytes = zip_dir(dir.path()).await.unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["index.html", "pic.png"]);

        let mut page = String::new();
        archive
            .by_name("index.html")
            .unwrap()
            .read_to_string(&mut page)
            .unwrap();
        assert_eq!(page, "<html></html>");
    }

    #[tokio::test]
    async fn missing_dir_is_an_error() {
        let err = zip_dir(Path::new("/no/such/dir")).await.unwrap_err();
        assert!(matches!(err, BlogPressError::ArchiveFailed { .. }));
    }
}
