// src/cancel.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared "cancel the in-flight download" flag.
///
/// Clones observe the same flag. The worker clears it before each item;
/// the engine polls it while a download is running.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    inner: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_cancel(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.inner.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}
