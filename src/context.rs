//! The immutable per-run render context.
//!
//! Every date- or location-dependent value the pipeline needs is read from a
//! [`RenderContext`] built once at the start of a conversion. Nothing in the
//! pipeline consults the clock or global state, so two conversions sharing a
//! context (or a fixed date) produce identical social-preview URLs.

use crate::config::ConversionConfig;
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};

/// Date, base URL and output directory for one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    date: NaiveDate,
    base_url: String,
    output_dir: PathBuf,
}

impl RenderContext {
    /// Build a context explicitly. A trailing `/` on `base_url` is dropped.
    pub fn new(
        date: NaiveDate,
        base_url: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            date,
            base_url,
            output_dir: output_dir.into(),
        }
    }

    /// Build a context from the config, using today's local date unless the
    /// config pins one.
    pub fn from_config(config: &ConversionConfig, output_dir: impl Into<PathBuf>) -> Self {
        let date = config.date.unwrap_or_else(|| Local::now().date_naive());
        Self::new(date, config.base_url.clone(), output_dir)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `YYYY-MM-DD`
    pub fn date_stamp(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Social-preview card image: `<base>/Card/Card_<YYYY-MM-DD>.png`.
    pub fn og_image(&self) -> String {
        format!("{}/Card/Card_{}.png", self.base_url, self.date_stamp())
    }

    /// Canonical page URL: `<base>/<YYYY-MM-DD>/index.html`.
    pub fn og_url(&self) -> String {
        format!("{}/{}/index.html", self.base_url, self.date_stamp())
    }
}
