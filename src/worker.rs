// src/worker.rs
// Sequential download worker: one pass over the queue on a background task

use crate::cancel::CancellationFlag;
use crate::engine::MediaEngine;
use crate::error::DownloadError;
use crate::events::{Notification, NotificationSender};
use crate::media::{DownloadOptions, ProgressEvent};
use crate::queue::{lock_queue, ItemStatus, QueueItem, SharedQueue};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;

/// Message recorded on items stopped by the user
pub const CANCELLED_MESSAGE: &str = "cancelled";

/// What a cancelled item does to the rest of the pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelPolicy {
    /// End the pass; later items stay pending
    StopPass,
    /// Record the item as cancelled and continue with the next one
    SkipItem,
}

impl Default for CancelPolicy {
    fn default() -> Self {
        Self::StopPass
    }
}

/// Outcome of one pass over the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    /// Items that reached `Done` during the pass
    pub done: usize,
    /// Items that reached `Error` during the pass, cancellations included
    pub failed: usize,
    /// Items the pass started downloading
    pub attempted: usize,
    /// Items still pending when the pass ended
    pub not_attempted: usize,
    /// Whether the pass ended or skipped an item because of a cancellation
    pub cancelled: bool,
}

impl PassSummary {
    /// Items the pass covered: attempted plus left pending
    pub fn total(&self) -> usize {
        self.attempted + self.not_attempted
    }
}

/// Runs passes over the shared queue, at most one at a time
pub struct DownloadWorker {
    queue: SharedQueue,
    cancel: CancellationFlag,
    engine: Arc<dyn MediaEngine>,
    notifier: NotificationSender,
    policy: CancelPolicy,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<PassSummary>>>,
}

impl DownloadWorker {
    pub fn new(
        queue: SharedQueue,
        cancel: CancellationFlag,
        engine: Arc<dyn MediaEngine>,
        notifier: NotificationSender,
        policy: CancelPolicy,
    ) -> Self {
        Self {
            queue,
            cancel,
            engine,
            notifier,
            policy,
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> CancelPolicy {
        self.policy
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start a pass writing into `target_directory`.
    ///
    /// Returns false without doing anything while a pass is already running.
    /// On success the first pending item is already marked downloading.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, target_directory: PathBuf) -> bool {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Download pass already running, ignoring start request");
            return false;
        }

        // Claim the first item before returning so a cancel issued right after
        // `start` lands on a download that is already marked active
        let first = claim_next(&self.queue, &self.cancel);
        let pass = Pass {
            queue: Arc::clone(&self.queue),
            cancel: self.cancel.clone(),
            engine: Arc::clone(&self.engine),
            notifier: self.notifier.clone(),
            policy: self.policy,
            target_directory,
        };
        let running = RunningGuard(Arc::clone(&self.running));

        let handle = tokio::spawn(async move {
            let summary = pass.run(first).await;
            // Still running while the summary goes out, so no later pass can
            // publish ahead of it
            pass.notifier.publish(Notification::PassFinished(summary)).await;
            drop(running);
            summary
        });

        *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        true
    }

    /// Wait for the current pass, if any, and return its summary
    pub async fn wait(&self) -> Option<PassSummary> {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        match handle.await {
            Ok(summary) => Some(summary),
            Err(e) => {
                error!("Download pass task failed: {}", e);
                None
            }
        }
    }
}

/// Clears the running flag when the pass task ends, even by panic
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Take the first pending item and mark it downloading, atomically.
/// Clears the cancellation flag so a stale request never hits the new item.
fn claim_next(queue: &SharedQueue, cancel: &CancellationFlag) -> Option<(usize, QueueItem)> {
    let mut store = lock_queue(queue);
    let (index, _) = store.next_pending()?;
    cancel.clear();
    if let Err(e) = store.mark_downloading(index) {
        error!("Cannot start queue item {}: {}", index, e);
        return None;
    }
    store.get(index).cloned().map(|item| (index, item))
}

/// Everything one pass needs, moved into its task
struct Pass {
    queue: SharedQueue,
    cancel: CancellationFlag,
    engine: Arc<dyn MediaEngine>,
    notifier: NotificationSender,
    policy: CancelPolicy,
    target_directory: PathBuf,
}

impl Pass {
    async fn run(&self, first: Option<(usize, QueueItem)>) -> PassSummary {
        info!("Download pass started using {}", self.engine.name());
        let mut summary = PassSummary::default();

        let mut next = first;
        while let Some((index, item)) = next {
            summary.attempted += 1;
            self.publish_queue().await;
            info!("Downloading {} ({})", item.title, item.url);

            let result = self.download(index, &item).await;
            let stop = match &result {
                Ok(()) => {
                    summary.done += 1;
                    info!("Finished {}", item.title);
                    false
                }
                Err(DownloadError::Cancelled) => {
                    summary.failed += 1;
                    summary.cancelled = true;
                    info!("Cancelled {}", item.title);
                    self.policy == CancelPolicy::StopPass
                }
                Err(DownloadError::Engine(message)) => {
                    summary.failed += 1;
                    warn!("Download of {} failed: {}", item.url, message);
                    false
                }
            };

            self.finish(item.id, &result);
            self.publish_queue().await;

            if stop {
                break;
            }
            next = claim_next(&self.queue, &self.cancel);
        }

        summary.not_attempted = lock_queue(&self.queue).count(ItemStatus::Pending);
        info!(
            "Download pass finished: {} done, {} failed, {} not attempted",
            summary.done, summary.failed, summary.not_attempted
        );
        summary
    }

    async fn download(&self, index: usize, item: &QueueItem) -> Result<(), DownloadError> {
        let options = DownloadOptions {
            target_directory: self.target_directory.clone(),
            format: item.format,
            quality: item.quality.clone(),
        };

        let queue = Arc::clone(&self.queue);
        let notifier = self.notifier.clone();
        let item_id = item.id;
        let mut index = index;
        let mut on_progress = move |event: ProgressEvent| {
            if let Some(current) = lock_queue(&queue).position_of(item_id) {
                index = current;
            }
            notifier.progress(index, item_id, event);
        };

        self.engine
            .download(&item.url, &options, &mut on_progress, &self.cancel)
            .await
    }

    /// Record the outcome on the item, wherever it sits now
    fn finish(&self, item_id: u64, result: &Result<(), DownloadError>) {
        let mut store = lock_queue(&self.queue);
        let Some(index) = store.position_of(item_id) else {
            error!("Queue item {} disappeared during its download", item_id);
            return;
        };
        let outcome = match result {
            Ok(()) => store.mark_done(index),
            Err(DownloadError::Cancelled) => store.mark_error(index, CANCELLED_MESSAGE),
            Err(DownloadError::Engine(message)) => store.mark_error(index, message),
        };
        if let Err(e) = outcome {
            error!("Cannot record outcome of queue item {}: {}", item_id, e);
        }
    }

    async fn publish_queue(&self) {
        let snapshot = lock_queue(&self.queue).snapshot();
        self.notifier.publish(Notification::QueueChanged(snapshot)).await;
    }
}
