//! Media localization: download remote images/videos next to the page and
//! rewrite their references to the local filenames.
//!
//! ## Filename allocation
//!
//! Names are allocated by a single [`FilenameRegistry`] per output directory,
//! sequentially and in first-reference order, *before* any fetch starts. The
//! fetches themselves then run concurrently (bounded by
//! `ConversionConfig::concurrency`) with no shared state besides the files
//! they each own, so the name a URL receives never depends on network timing.
//!
//! ## Failure semantics
//!
//! A failed fetch (connect error, non-2xx status, timeout, write error) is
//! logged and recorded as a [`MediaError`] in the outcome; the reference keeps
//! its original remote URL and the rest of the document is unaffected.

use crate::config::ConversionConfig;
use crate::error::{BlogPressError, MediaError};
use crate::output::MediaOutcome;
use crate::pipeline::document::Block;
use crate::progress::ProgressCallback;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};
use reqwest::Url;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// `![alt](ref)` where `ref` may carry a trailing `"title"`.
static RE_MEDIA_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[(.*?)\]\((.*?)\)").unwrap());

/// Fetches one remote resource into a local file.
///
/// Implementations must leave no partial file behind when they fail.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download `url` into `dest`, returning the number of bytes written.
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<u64, MediaError>;
}

/// Streaming HTTP fetcher backed by `reqwest`.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    /// Build a client that applies the configured timeout to each whole
    /// request, body included.
    pub fn new(config: &ConversionConfig) -> Result<Self, BlogPressError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| BlogPressError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            timeout_secs: config.download_timeout_secs,
        })
    }

    fn map_err(&self, url: &Url, e: reqwest::Error) -> MediaError {
        if e.is_timeout() {
            MediaError::Timeout {
                url: url.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            MediaError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }

    async fn stream_to_file(
        &self,
        url: &Url,
        response: reqwest::Response,
        dest: &Path,
    ) -> Result<u64, MediaError> {
        let write_err = |e: std::io::Error| MediaError::WriteFailed {
            url: url.to_string(),
            path: dest.to_path_buf(),
            reason: e.to_string(),
        };

        let mut file = tokio::fs::File::create(dest).await.map_err(write_err)?;
        let mut body = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| self.map_err(url, e))?;
            file.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;
        Ok(written)
    }
}

#[async_trait]
impl MediaFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<u64, MediaError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.map_err(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let result = self.stream_to_file(url, response, dest).await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(dest).await;
        }
        result
    }
}

// ── Filename registry ────────────────────────────────────────────────────

/// The single synchronized namespace of filenames in one output directory.
///
/// A name is handed out at most once and never names a file that already
/// existed in the directory when it was allocated.
#[derive(Debug)]
pub struct FilenameRegistry {
    dir: PathBuf,
    taken: Mutex<HashSet<String>>,
}

impl FilenameRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            taken: Mutex::new(HashSet::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Claim `name` as-is, e.g. for the page being written. Returns false if
    /// it was already claimed in this run.
    pub fn reserve(&self, name: &str) -> bool {
        self.taken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string())
    }

    /// Allocate a unique name derived from `base`: `base`, then `stem_1.ext`,
    /// `stem_2.ext`, ...
    pub fn allocate(&self, base: &str) -> String {
        let mut taken = self.taken.lock().unwrap_or_else(PoisonError::into_inner);
        let (stem, ext) = split_ext(base);
        let mut candidate = base.to_string();
        let mut n = 1u32;
        while taken.contains(&candidate) || self.dir.join(&candidate).exists() {
            candidate = format!("{stem}_{n}{ext}");
            n += 1;
        }
        taken.insert(candidate.clone());
        candidate
    }
}

/// Split off the last extension, keeping its dot. A leading dot alone does
/// not start an extension (`.hidden` has none).
fn split_ext(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if name[..i].chars().any(|c| c != '.') => name.split_at(i),
        _ => (name, ""),
    }
}

/// True when `reference` is an absolute http(s) URL.
pub fn is_remote(reference: &str) -> bool {
    Url::parse(reference)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Derive a local base filename from the last URL path segment.
pub fn base_filename(url: &Url) -> String {
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    let decoded = percent_decode_str(last).decode_utf8_lossy();
    let sanitized: String = decoded
        .chars()
        .map(|c| {
            if c.is_whitespace() || c.is_control() || "/\\:*?\"<>|()[]".contains(c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        "media".to_string()
    } else {
        sanitized
    }
}

// ── Localizer ────────────────────────────────────────────────────────────

/// Downloads the remote media of one document into its output directory.
pub struct MediaLocalizer {
    fetcher: Arc<dyn MediaFetcher>,
    registry: Arc<FilenameRegistry>,
    concurrency: usize,
    progress: Option<ProgressCallback>,
}

impl MediaLocalizer {
    /// Use the configured fetcher, or a fresh [`HttpFetcher`].
    pub fn new(
        config: &ConversionConfig,
        registry: Arc<FilenameRegistry>,
    ) -> Result<Self, BlogPressError> {
        let fetcher: Arc<dyn MediaFetcher> = match config.fetcher {
            Some(ref f) => Arc::clone(f),
            None => Arc::new(HttpFetcher::new(config)?),
        };
        Ok(Self {
            fetcher,
            registry,
            concurrency: config.concurrency.max(1),
            progress: config.progress_callback.clone(),
        })
    }

    /// Rewrite every remote `![alt](url)` in Markdown source.
    ///
    /// Relative references and failed downloads are left exactly as written.
    pub async fn localize_markdown(&self, text: &str) -> (String, Vec<MediaOutcome>) {
        let urls: Vec<String> = RE_MEDIA_REF
            .captures_iter(text)
            .map(|caps| split_ref(&caps[2]).0.to_string())
            .filter(|url| is_remote(url))
            .collect();
        if urls.is_empty() {
            return (text.to_string(), Vec::new());
        }

        let outcomes = self.resolve(urls).await;
        let local = local_names(&outcomes);

        let rewritten = RE_MEDIA_REF.replace_all(text, |caps: &Captures| {
            let (url, rest) = split_ref(&caps[2]);
            match local.get(url) {
                Some(name) => format!("![{}]({}{})", &caps[1], name, rest),
                None => caps[0].to_string(),
            }
        });
        (rewritten.into_owned(), outcomes)
    }

    /// Rewrite the `src` of every remote [`Block::Image`].
    pub async fn localize_blocks(&self, blocks: &mut [Block]) -> Vec<MediaOutcome> {
        let urls: Vec<String> = blocks
            .iter()
            .filter_map(|b| match b {
                Block::Image { src, .. } if is_remote(src) => Some(src.clone()),
                _ => None,
            })
            .collect();
        if urls.is_empty() {
            return Vec::new();
        }

        let outcomes = self.resolve(urls).await;
        let local = local_names(&outcomes);
        for block in blocks.iter_mut() {
            if let Block::Image { src, .. } = block {
                if let Some(name) = local.get(src.as_str()) {
                    *src = name.clone();
                }
            }
        }
        outcomes
    }

    /// Fetch each distinct URL once. Outcomes are returned in first-reference
    /// order regardless of completion order.
    pub async fn resolve(&self, urls: Vec<String>) -> Vec<MediaOutcome> {
        let mut seen = HashSet::new();
        let distinct: Vec<String> = urls.into_iter().filter(|u| seen.insert(u.clone())).collect();
        let total = distinct.len();

        // Names are fixed up front, in document order.
        let jobs: Vec<(usize, String, Option<(Url, String)>)> = distinct
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| {
                let target = Url::parse(&raw).ok().map(|url| {
                    let name = self.registry.allocate(&base_filename(&url));
                    (url, name)
                });
                (idx, raw, target)
            })
            .collect();

        if let Some(ref cb) = self.progress {
            cb.on_media_start(total);
        }
        info!("Localizing {} remote media reference(s)", total);

        let mut outcomes: Vec<(usize, MediaOutcome)> = stream::iter(jobs.into_iter().map(
            |(idx, raw, target)| async move { (idx, self.fetch_one(raw, target).await) },
        ))
        .buffer_unordered(self.concurrency)
        .collect()
        .await;

        outcomes.sort_by_key(|(idx, _)| *idx);
        let outcomes: Vec<MediaOutcome> = outcomes.into_iter().map(|(_, o)| o).collect();

        let ok = outcomes.iter().filter(|o| o.is_localized()).count();
        if let Some(ref cb) = self.progress {
            cb.on_media_finished(total, ok);
        }
        info!("Media: {}/{} downloaded", ok, total);
        outcomes
    }

    async fn fetch_one(&self, raw: String, target: Option<(Url, String)>) -> MediaOutcome {
        let Some((url, name)) = target else {
            let error = MediaError::FetchFailed {
                url: raw.clone(),
                reason: "not an absolute URL".into(),
            };
            return self.failed(raw, error);
        };

        if let Some(ref cb) = self.progress {
            cb.on_fetch_start(&raw, &name);
        }
        debug!("Fetching {} -> {}", raw, name);

        let dest = self.registry.dir().join(&name);
        match self.fetcher.fetch(&url, &dest).await {
            Ok(bytes) => {
                if let Some(ref cb) = self.progress {
                    cb.on_media_complete(&raw, &name, bytes);
                }
                debug!("Saved {} ({} bytes)", dest.display(), bytes);
                MediaOutcome {
                    url: raw,
                    local_name: Some(name),
                    bytes,
                    error: None,
                }
            }
            Err(error) => self.failed(raw, error),
        }
    }

    fn failed(&self, url: String, error: MediaError) -> MediaOutcome {
        warn!("{}; keeping remote reference", error);
        if let Some(ref cb) = self.progress {
            cb.on_media_error(&url, &error.to_string());
        }
        MediaOutcome {
            url,
            local_name: None,
            bytes: 0,
            error: Some(error),
        }
    }
}

/// Split a Markdown link destination into the URL and any trailing title.
fn split_ref(reference: &str) -> (&str, &str) {
    let trimmed = reference.trim_start();
    match trimmed.find(char::is_whitespace) {
        Some(i) => trimmed.split_at(i),
        None => (trimmed, ""),
    }
}

fn local_names(outcomes: &[MediaOutcome]) -> HashMap<&str, String> {
    outcomes
        .iter()
        .filter_map(|o| o.local_name.as_ref().map(|n| (o.url.as_str(), n.clone())))
        .collect()
}
