//! Progress-callback trait for media-download events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events while the media localizer downloads remote images and videos.
//! Rendering itself is fast; downloads are the only slow part of a
//! conversion, so they are the only part that reports progress.
//!
//! # Example
//!
//! ```rust
//! use blogpress::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     downloaded: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_media_complete(&self, url: &str, local_name: &str, bytes: u64) {
//!         self.downloaded.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{url} -> {local_name} ({bytes} bytes)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     downloaded: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the media localizer as it downloads each remote reference.
///
/// Implementations must be `Send + Sync`: downloads run concurrently and the
/// per-media methods may be called from different tasks at the same time.
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before any download starts.
    ///
    /// # Arguments
    /// * `total_media`: number of distinct remote URLs that will be fetched
    fn on_media_start(&self, total_media: usize) {
        let _ = total_media;
    }

    /// Called just before a fetch is issued.
    fn on_fetch_start(&self, url: &str, local_name: &str) {
        let _ = (url, local_name);
    }

    /// Called when a file has been fully written to the output directory.
    fn on_media_complete(&self, url: &str, local_name: &str, bytes: u64) {
        let _ = (url, local_name, bytes);
    }

    /// Called when a fetch fails; the reference keeps its remote URL.
    fn on_media_error(&self, url: &str, error: &str) {
        let _ = (url, error);
    }

    /// Called once after every fetch has been attempted.
    ///
    /// # Arguments
    /// * `total_media`  : distinct remote URLs attempted
    /// * `success_count`: URLs now served from a local file
    fn on_media_finished(&self, total_media: usize, success_count: usize) {
        let _ = (total_media, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
