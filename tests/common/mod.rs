// tests/common/mod.rs
// Scripted MediaEngine and notification helpers shared by the async tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::Receiver;
use tubeloader::app::AppContext;
use tubeloader::cancel::CancellationFlag;
use tubeloader::engine::MediaEngine;
use tubeloader::error::{AppError, DownloadError};
use tubeloader::events::Notification;
use tubeloader::media::{DownloadOptions, Metadata, ProgressEvent, ProgressPhase};
use tubeloader::worker::CancelPolicy;

/// How a scripted download behaves
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Report two progress events, then succeed
    Succeed,
    /// Succeed after the given delay
    SucceedAfter(Duration),
    /// Fail with the given engine text
    Fail(String),
    /// Keep reporting progress until cancelled
    UntilCancelled,
}

#[derive(Default)]
pub struct MockEngine {
    downloads: Mutex<HashMap<String, Behavior>>,
    metadata: Mutex<HashMap<String, Metadata>>,
    calls: Mutex<Vec<String>>,
    metadata_calls: Mutex<Vec<String>>,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, url: &str, behavior: Behavior) {
        self.downloads
            .lock()
            .unwrap()
            .insert(url.to_string(), behavior);
    }

    pub fn add_metadata(&self, url: &str, metadata: Metadata) {
        self.metadata
            .lock()
            .unwrap()
            .insert(url.to_string(), metadata);
    }

    /// URLs passed to `download`, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn metadata_calls(&self) -> Vec<String> {
        self.metadata_calls.lock().unwrap().clone()
    }
}

fn progress_event(phase: ProgressPhase, downloaded: u64) -> ProgressEvent {
    ProgressEvent {
        phase,
        downloaded_bytes: downloaded,
        total_bytes: 100,
        speed: Some(1024.0),
        filename: Some("video.mp4".to_string()),
    }
}

#[async_trait]
impl MediaEngine for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch_metadata(&self, url: &str) -> Result<Metadata, AppError> {
        self.metadata_calls.lock().unwrap().push(url.to_string());
        let found = self.metadata.lock().unwrap().get(url).cloned();
        found.ok_or_else(|| AppError::MetadataFetch("ERROR: Video unavailable".to_string()))
    }

    async fn download(
        &self,
        url: &str,
        _options: &DownloadOptions,
        progress: &mut (dyn FnMut(ProgressEvent) + Send),
        cancel: &CancellationFlag,
    ) -> Result<(), DownloadError> {
        self.calls.lock().unwrap().push(url.to_string());
        let behavior = self
            .downloads
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or(Behavior::Succeed);

        match behavior {
            Behavior::Succeed => {
                for event in [
                    progress_event(ProgressPhase::Downloading, 50),
                    progress_event(ProgressPhase::Finished, 100),
                ] {
                    if cancel.is_cancelled() {
                        return Err(DownloadError::Cancelled);
                    }
                    progress(event);
                    tokio::task::yield_now().await;
                }
                Ok(())
            }
            Behavior::SucceedAfter(delay) => {
                tokio::time::sleep(delay).await;
                if cancel.is_cancelled() {
                    return Err(DownloadError::Cancelled);
                }
                progress(progress_event(ProgressPhase::Finished, 100));
                Ok(())
            }
            Behavior::Fail(message) => Err(DownloadError::Engine(message)),
            Behavior::UntilCancelled => {
                for step in 0..500u64 {
                    if cancel.is_cancelled() {
                        return Err(DownloadError::Cancelled);
                    }
                    progress(progress_event(ProgressPhase::Downloading, step % 100));
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                Err(DownloadError::Engine("never cancelled".to_string()))
            }
        }
    }
}

pub fn context(
    engine: &Arc<MockEngine>,
    policy: CancelPolicy,
) -> (AppContext, Receiver<Notification>) {
    let engine: Arc<dyn MediaEngine> = engine.clone();
    AppContext::new(engine, PathBuf::from("downloads"), policy, 256)
}

/// Receive notifications until one matches, failing after a few seconds
pub async fn wait_for<F>(rx: &mut Receiver<Notification>, mut matches: F) -> Notification
where
    F: FnMut(&Notification) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let next = tokio::time::timeout_at(deadline, rx.recv())
            .await
            .expect("timed out waiting for notification")
            .expect("notification channel closed");
        if matches(&next) {
            return next;
        }
    }
}

/// Receive notifications up to and including the pass summary
pub async fn collect_pass(rx: &mut Receiver<Notification>) -> Vec<Notification> {
    let mut seen = Vec::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let next = tokio::time::timeout_at(deadline, rx.recv())
            .await
            .expect("timed out waiting for pass to finish")
            .expect("notification channel closed");
        let finished = matches!(next, Notification::PassFinished(_));
        seen.push(next);
        if finished {
            return seen;
        }
    }
}

pub fn video(title: &str, url: &str) -> Metadata {
    Metadata {
        title: title.to_string(),
        channel: "Test Channel".to_string(),
        duration: 212,
        thumbnail: None,
        url: url.to_string(),
        is_playlist: false,
        entries: Vec::new(),
        playlist_count: 0,
    }
}
