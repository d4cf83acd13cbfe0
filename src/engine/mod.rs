// src/engine/mod.rs
// Media engine adapter: the only place that talks to the extraction tool

pub mod format;
pub mod progress;
pub mod ytdlp;

use crate::cancel::CancellationFlag;
use crate::error::{AppError, DownloadError};
use crate::media::{DownloadOptions, Metadata, ProgressEvent};
use async_trait::async_trait;

pub use ytdlp::YtDlpEngine;

/// An extraction/download backend
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Look up a video or playlist without downloading it.
    /// Failures surface as `AppError::MetadataFetch` carrying the engine's text.
    async fn fetch_metadata(&self, url: &str) -> Result<Metadata, AppError>;

    /// Download one URL, reporting progress until it completes.
    ///
    /// Implementations must check `cancel` at every progress event and abort
    /// promptly with `DownloadError::Cancelled` once it is set.
    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
        progress: &mut (dyn FnMut(ProgressEvent) + Send),
        cancel: &CancellationFlag,
    ) -> Result<(), DownloadError>;
}
