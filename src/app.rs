// src/app.rs
// Application context: the command surface the presentation layer talks to

use crate::cancel::CancellationFlag;
use crate::config::Settings;
use crate::engine::MediaEngine;
use crate::error::AppError;
use crate::events::{self, Notification, NotificationSender};
use crate::media::{validate_quality, MediaFormat, Metadata, PlaylistEntry};
use crate::queue::{lock_queue, QueueItem, QueueStore, SharedQueue};
use crate::utils::validate_url;
use crate::worker::{CancelPolicy, DownloadWorker, PassSummary};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Owns the queue, the cancellation flag, the worker and the engine.
///
/// Commands return immediately. Long-running work happens on background
/// tasks that report through the notification channel returned by `new`.
pub struct AppContext {
    queue: SharedQueue,
    cancel: CancellationFlag,
    worker: DownloadWorker,
    engine: Arc<dyn MediaEngine>,
    notifier: NotificationSender,
    output_dir: PathBuf,
}

impl AppContext {
    pub fn new(
        engine: Arc<dyn MediaEngine>,
        output_dir: PathBuf,
        policy: CancelPolicy,
        channel_capacity: usize,
    ) -> (Self, mpsc::Receiver<Notification>) {
        let (notifier, rx) = events::channel(channel_capacity);
        let queue: SharedQueue = Arc::new(Mutex::new(QueueStore::new()));
        let cancel = CancellationFlag::new();
        let worker = DownloadWorker::new(
            Arc::clone(&queue),
            cancel.clone(),
            Arc::clone(&engine),
            notifier.clone(),
            policy,
        );

        let ctx = Self {
            queue,
            cancel,
            worker,
            engine,
            notifier,
            output_dir,
        };
        (ctx, rx)
    }

    pub fn from_settings(
        engine: Arc<dyn MediaEngine>,
        settings: &Settings,
    ) -> (Self, mpsc::Receiver<Notification>) {
        Self::new(
            engine,
            settings.output_dir.clone(),
            settings.cancel_policy,
            settings.channel_capacity,
        )
    }

    /// Look up `url` in the background.
    ///
    /// The result arrives as `MetadataReady` or `MetadataError`. An invalid
    /// URL is reported the same way without reaching the engine.
    pub fn fetch_metadata(&self, url: &str) -> JoinHandle<()> {
        let engine = Arc::clone(&self.engine);
        let notifier = self.notifier.clone();
        let url = url.trim().to_string();

        tokio::spawn(async move {
            let notification = match validate_url(&url) {
                Err(e) => Notification::MetadataError(e.to_string()),
                Ok(()) => match engine.fetch_metadata(&url).await {
                    Ok(metadata) => {
                        debug!("Metadata ready for {}: {}", url, metadata.title);
                        Notification::MetadataReady(metadata)
                    }
                    Err(e) => {
                        info!("Metadata lookup for {} failed: {}", url, e);
                        Notification::MetadataError(error_text(e))
                    }
                },
            };
            notifier.publish(notification).await;
        })
    }

    /// Queue a single URL, titled after itself
    pub fn enqueue(&self, url: &str, format: MediaFormat, quality: &str) -> Result<u64, AppError> {
        self.enqueue_titled(url, None, format, quality)
    }

    pub fn enqueue_titled(
        &self,
        url: &str,
        title: Option<&str>,
        format: MediaFormat,
        quality: &str,
    ) -> Result<u64, AppError> {
        let url = url.trim();
        validate_url(url)?;
        validate_quality(format, quality)?;

        let item = QueueItem::new(url, format, quality).with_title(title);
        let id = lock_queue(&self.queue).enqueue(item)?;
        self.queue_changed();
        Ok(id)
    }

    /// Queue every playlist entry with a URL, in order. Returns how many were added.
    pub fn enqueue_playlist(
        &self,
        entries: &[PlaylistEntry],
        format: MediaFormat,
        quality: &str,
    ) -> Result<usize, AppError> {
        validate_quality(format, quality)?;
        let added = lock_queue(&self.queue).enqueue_playlist(entries, format, quality);
        if added > 0 {
            self.queue_changed();
        }
        Ok(added)
    }

    /// Queue what a metadata lookup of `url` found: one item per entry for a
    /// playlist, otherwise a single item titled after the media.
    pub fn enqueue_metadata(
        &self,
        metadata: &Metadata,
        url: &str,
        format: MediaFormat,
        quality: &str,
    ) -> Result<usize, AppError> {
        if metadata.is_playlist {
            let added = self.enqueue_playlist(&metadata.entries, format, quality)?;
            info!("Added {} of {} playlist entries", added, metadata.entries.len());
            Ok(added)
        } else {
            self.enqueue_titled(url, Some(&metadata.title), format, quality)?;
            Ok(1)
        }
    }

    /// Remove a pending item by its current position
    pub fn remove(&self, index: usize) -> Result<QueueItem, AppError> {
        let item = lock_queue(&self.queue).remove(index)?;
        self.queue_changed();
        Ok(item)
    }

    /// Start a pass. Returns false when one is already running.
    pub fn start(&self) -> bool {
        self.worker.start(self.output_dir.clone())
    }

    /// Ask the active download to stop. A no-op when nothing is downloading.
    pub fn cancel(&self) {
        if self.worker.is_running() {
            info!("Cancellation requested");
        }
        self.cancel.request_cancel();
    }

    pub fn snapshot(&self) -> Vec<QueueItem> {
        lock_queue(&self.queue).snapshot()
    }

    /// Drop finished items. Refused while a pass is running.
    pub fn clear_finished(&self) -> Result<usize, AppError> {
        if self.worker.is_running() {
            return Err(AppError::InvalidState(
                "cannot clear finished items while downloads are running".to_string(),
            ));
        }
        let removed = lock_queue(&self.queue).clear_finished();
        if removed > 0 {
            self.queue_changed();
        }
        Ok(removed)
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    /// Wait for the running pass to end and return its summary
    pub async fn wait_idle(&self) -> Option<PassSummary> {
        self.worker.wait().await
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Takes effect from the next pass
    pub fn set_output_dir(&mut self, dir: PathBuf) {
        self.output_dir = dir;
    }

    pub fn cancel_policy(&self) -> CancelPolicy {
        self.worker.policy()
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    fn queue_changed(&self) {
        let snapshot = lock_queue(&self.queue).snapshot();
        self.notifier.try_publish(Notification::QueueChanged(snapshot));
    }
}

/// The engine's own text for metadata failures, the full message otherwise
fn error_text(error: AppError) -> String {
    match error {
        AppError::MetadataFetch(message) => message,
        other => other.to_string(),
    }
}
