//! Payload-free change broadcast.
//!
//! The registry and the supervisor publish here after every mutation;
//! listeners re-fetch the full view instead of diffing. Built on a
//! `tokio::sync::watch` channel carrying a generation counter, so a slow
//! listener coalesces bursts into one wake-up and never lags.

use std::sync::Arc;
use tokio::sync::watch;

/// Publisher side; clones publish to the same listeners.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: Arc<watch::Sender<u64>>,
}

impl Notifier {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Signals that data changed. Never fails, even with no listeners.
    pub fn notify(&self) {
        self.sender.send_modify(|generation| *generation += 1);
        tracing::trace!(generation = *self.sender.borrow(), "Published change notification");
    }

    /// Number of notifications published so far.
    pub fn generation(&self) -> u64 {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> ChangeListener {
        ChangeListener {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener side of a [`Notifier`].
#[derive(Debug, Clone)]
pub struct ChangeListener {
    receiver: watch::Receiver<u64>,
}

impl ChangeListener {
    /// Waits for the next change notification.
    ///
    /// Returns `false` once every [`Notifier`] has been dropped.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Whether a notification arrived since the last `changed()`.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    pub fn generation(&self) -> u64 {
        *self.receiver.borrow()
    }
}
