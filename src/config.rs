//! Configuration types for page conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. One struct holds every knob so the
//! same config can be shared between the CLI, the upload service and tests.

use crate::error::BlogPressError;
use crate::pipeline::media::MediaFetcher;
use crate::progress::ProgressCallback;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Placeholder title used when the source has no `#title` directive.
pub const DEFAULT_TITLE: &str = "ここはタイトルです。";

/// Placeholder description used when the source has no `#description` directive.
pub const DEFAULT_DESCRIPTION: &str = "ここは一言コメントです。";

/// Base URL for og:image / og:url when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://example.com/blog";

/// Configuration for a single conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use blogpress::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .base_url("https://blog.example.org")
///     .concurrency(8)
///     .include_nav(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Base of the social-preview URLs. Default: [`DEFAULT_BASE_URL`].
    ///
    /// og:image becomes `<base>/Card/Card_<date>.png` and og:url becomes
    /// `<base>/<date>/index.html`.
    pub base_url: String,

    /// Date used for og:image / og:url. If None, today's local date.
    pub date: Option<NaiveDate>,

    /// Title used when the source has no `#title` directive.
    pub default_title: String,

    /// Description used when the source has no `#description` directive.
    pub default_description: String,

    /// Number of concurrent media downloads. Default: 4.
    pub concurrency: usize,

    /// Per-download timeout in seconds. Default: 30.
    ///
    /// An expired fetch is a failed fetch: the reference keeps its remote URL.
    pub download_timeout_secs: u64,

    /// User-Agent sent with media downloads.
    pub user_agent: String,

    /// Download remote media into the output directory. Default: true.
    pub download_media: bool,

    /// Substitute a heading navigation list into the shell. Default: false.
    pub include_nav: bool,

    /// What to do when two headings slugify to the same id. Default: preserve.
    pub anchor_policy: AnchorPolicy,

    /// Custom shell template text. If None, uses [`crate::template::DEFAULT_SHELL`].
    pub shell_template: Option<String>,

    /// Pre-constructed media fetcher. Takes precedence over the built-in HTTP
    /// fetcher; tests use it to avoid the network.
    pub fetcher: Option<Arc<dyn MediaFetcher>>,

    /// Receives media-download progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            date: None,
            default_title: DEFAULT_TITLE.to_string(),
            default_description: DEFAULT_DESCRIPTION.to_string(),
            concurrency: 4,
            download_timeout_secs: 30,
            user_agent: concat!("blogpress/", env!("CARGO_PKG_VERSION")).to_string(),
            download_media: true,
            include_nav: false,
            anchor_policy: AnchorPolicy::default(),
            shell_template: None,
            fetcher: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("base_url", &self.base_url)
            .field("date", &self.date)
            .field("default_title", &self.default_title)
            .field("default_description", &self.default_description)
            .field("concurrency", &self.concurrency)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("download_media", &self.download_media)
            .field("include_nav", &self.include_nav)
            .field("anchor_policy", &self.anchor_policy)
            .field(
                "shell_template",
                &self.shell_template.as_ref().map(|t| format!("<{} bytes>", t.len())),
            )
            .field("fetcher", &self.fetcher.as_ref().map(|_| "<dyn MediaFetcher>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.config.date = Some(date);
        self
    }

    pub fn default_title(mut self, title: impl Into<String>) -> Self {
        self.config.default_title = title.into();
        self
    }

    pub fn default_description(mut self, description: impl Into<String>) -> Self {
        self.config.default_description = description.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn download_media(mut self, v: bool) -> Self {
        self.config.download_media = v;
        self
    }

    pub fn include_nav(mut self, v: bool) -> Self {
        self.config.include_nav = v;
        self
    }

    pub fn anchor_policy(mut self, policy: AnchorPolicy) -> Self {
        self.config.anchor_policy = policy;
        self
    }

    pub fn shell_template(mut self, shell: impl Into<String>) -> Self {
        self.config.shell_template = Some(shell.into());
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn MediaFetcher>) -> Self {
        self.config.fetcher = Some(fetcher);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, BlogPressError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(BlogPressError::InvalidConfig(
                "Concurrency must be at least 1".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(BlogPressError::InvalidConfig(
                "Download timeout must be at least 1 second".into(),
            ));
        }
        match reqwest::Url::parse(&c.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(BlogPressError::InvalidConfig(format!(
                    "Base URL must be an absolute http(s) URL, got '{}'",
                    c.base_url
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Policy for headings whose slugs collide within one document.
///
/// | Policy | `## Setup` twice |
/// |--------|------------------|
/// | `Preserve` | `setup`, `setup` (matches pages already published) |
/// | `Suffix` | `setup`, `setup-1` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnchorPolicy {
    /// Keep duplicate ids as generated. (default)
    #[default]
    Preserve,
    /// Append `-1`, `-2`, … to every repeat of an id.
    Suffix,
}
