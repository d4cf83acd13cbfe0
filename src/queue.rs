// src/queue.rs
// Ordered download queue with forward-only status tracking

use crate::error::AppError;
use crate::media::{MediaFormat, PlaylistEntry};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The queue as shared between command handlers and the worker
pub type SharedQueue = Arc<Mutex<QueueStore>>;

/// Lock the shared queue. A poisoned lock still yields the store: every
/// mutation is a single field update, so the data stays consistent.
pub fn lock_queue(queue: &SharedQueue) -> MutexGuard<'_, QueueStore> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Current status of a queued item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Downloading,
    Done,
    Error,
}

impl Default for ItemStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl ItemStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Downloading => "downloading",
            Self::Done => "done",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// A download request in the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Assigned by the store on enqueue; stays valid across removals
    pub id: u64,
    /// URL to download from
    pub url: String,
    /// Display title, the URL when nothing better is known
    pub title: String,
    pub format: MediaFormat,
    /// Quality key, domain depends on `format`
    pub quality: String,
    pub status: ItemStatus,
    /// Set only when `status` is `Error`
    pub error_message: Option<String>,
    /// When the item was added to the queue
    pub added_at: DateTime<Utc>,
    /// When the item reached `Done` or `Error`
    pub finished_at: Option<DateTime<Utc>>,
}

impl QueueItem {
    /// Create a pending item titled after its URL
    pub fn new(url: &str, format: MediaFormat, quality: &str) -> Self {
        Self {
            id: 0,
            url: url.to_string(),
            title: url.to_string(),
            format,
            quality: quality.to_string(),
            status: ItemStatus::Pending,
            error_message: None,
            added_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Set the title; blank titles keep the URL
    pub fn with_title(mut self, title: Option<&str>) -> Self {
        if let Some(t) = title.map(str::trim).filter(|t| !t.is_empty()) {
            self.title = t.to_string();
        }
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == ItemStatus::Pending
    }
}

/// Owns every queued item and enforces its lifecycle.
///
/// Processing order is insertion order. The store itself is not synchronized;
/// callers share it behind a single mutex.
#[derive(Debug, Default)]
pub struct QueueStore {
    items: Vec<QueueItem>,
    next_id: u64,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pending item, returning its id
    pub fn enqueue(&mut self, mut item: QueueItem) -> Result<u64, AppError> {
        if !item.is_pending() {
            return Err(AppError::InvalidState(format!(
                "cannot enqueue an item in '{}' state",
                item.status
            )));
        }
        self.next_id += 1;
        item.id = self.next_id;
        item.error_message = None;
        item.finished_at = None;
        debug!("Enqueued item {} ({})", item.id, item.url);
        self.items.push(item);
        Ok(self.next_id)
    }

    /// Append one item per playlist entry in entry order.
    /// Entries without a URL are skipped. Returns the number of items added.
    pub fn enqueue_playlist(
        &mut self,
        entries: &[PlaylistEntry],
        format: MediaFormat,
        quality: &str,
    ) -> usize {
        let mut added = 0;
        for entry in entries {
            let url = match entry.url.as_deref().map(str::trim) {
                Some(url) if !url.is_empty() => url,
                _ => {
                    debug!("Skipping playlist entry without URL: {}", entry.title);
                    continue;
                }
            };
            let item = QueueItem::new(url, format, quality).with_title(Some(&entry.title));
            // Freshly built items are always pending
            if self.enqueue(item).is_ok() {
                added += 1;
            }
        }
        added
    }

    /// Remove a pending item
    pub fn remove(&mut self, index: usize) -> Result<QueueItem, AppError> {
        let item = self.item(index)?;
        if !item.is_pending() {
            return Err(AppError::InvalidState(format!(
                "item {} is '{}' and cannot be removed",
                index, item.status
            )));
        }
        Ok(self.items.remove(index))
    }

    pub fn mark_downloading(&mut self, index: usize) -> Result<(), AppError> {
        let item = self.item_mut(index)?;
        transition(item, ItemStatus::Pending, ItemStatus::Downloading)
    }

    pub fn mark_done(&mut self, index: usize) -> Result<(), AppError> {
        let item = self.item_mut(index)?;
        transition(item, ItemStatus::Downloading, ItemStatus::Done)?;
        item.finished_at = Some(Utc::now());
        Ok(())
    }

    pub fn mark_error(&mut self, index: usize, message: &str) -> Result<(), AppError> {
        let item = self.item_mut(index)?;
        transition(item, ItemStatus::Downloading, ItemStatus::Error)?;
        item.error_message = Some(message.to_string());
        item.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Owned copy of the queue for presentation
    pub fn snapshot(&self) -> Vec<QueueItem> {
        self.items.clone()
    }

    pub fn get(&self, index: usize) -> Option<&QueueItem> {
        self.items.get(index)
    }

    /// Current position of the item with `id`
    pub fn position_of(&self, id: u64) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// First pending item in processing order, as `(index, id)`
    pub fn next_pending(&self) -> Option<(usize, u64)> {
        self.items
            .iter()
            .enumerate()
            .find(|(_, item)| item.is_pending())
            .map(|(index, item)| (index, item.id))
    }

    pub fn count(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|item| item.status == status).count()
    }

    /// Drop every `Done` and `Error` item. Must not run during a pass.
    pub fn clear_finished(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !item.status.is_terminal());
        before - self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn item(&self, index: usize) -> Result<&QueueItem, AppError> {
        self.items
            .get(index)
            .ok_or_else(|| AppError::InvalidState(format!("no queue item at index {}", index)))
    }

    fn item_mut(&mut self, index: usize) -> Result<&mut QueueItem, AppError> {
        self.items
            .get_mut(index)
            .ok_or_else(|| AppError::InvalidState(format!("no queue item at index {}", index)))
    }
}

fn transition(item: &mut QueueItem, from: ItemStatus, to: ItemStatus) -> Result<(), AppError> {
    if item.status != from {
        return Err(AppError::InvalidState(format!(
            "item {} cannot move from '{}' to '{}'",
            item.id, item.status, to
        )));
    }
    item.status = to;
    Ok(())
}
