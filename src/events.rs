// src/events.rs
// Notifications flowing from the core to the presentation layer

use crate::media::{Metadata, ProgressEvent};
use crate::queue::QueueItem;
use crate::worker::PassSummary;
use log::debug;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Everything the presentation layer is told about
#[derive(Debug, Clone)]
pub enum Notification {
    MetadataReady(Metadata),
    MetadataError(String),
    QueueChanged(Vec<QueueItem>),
    Progress {
        index: usize,
        item_id: u64,
        event: ProgressEvent,
    },
    PassFinished(PassSummary),
}

/// Create a bounded notification channel
pub fn channel(capacity: usize) -> (NotificationSender, mpsc::Receiver<Notification>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (NotificationSender { tx }, rx)
}

/// Sending half used by background tasks.
///
/// State changes wait for room in the channel. Progress is best effort and
/// dropped when the presentation layer falls behind.
#[derive(Debug, Clone)]
pub struct NotificationSender {
    tx: mpsc::Sender<Notification>,
}

impl NotificationSender {
    pub async fn publish(&self, notification: Notification) {
        if self.tx.send(notification).await.is_err() {
            debug!("Notification receiver dropped");
        }
    }

    /// Non-blocking publish for command handlers, which run on the side that
    /// drains the channel. Returns false when the notification was dropped.
    pub fn try_publish(&self, notification: Notification) -> bool {
        match self.tx.try_send(notification) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Notification channel full, dropping command notification");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    pub fn progress(&self, index: usize, item_id: u64, event: ProgressEvent) {
        match self.tx.try_send(Notification::Progress {
            index,
            item_id,
            event,
        }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                debug!("Notification channel full, dropping progress for item {}", item_id)
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Notification receiver dropped while item {} is downloading", item_id)
            }
        }
    }
}
