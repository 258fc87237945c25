//! Sync Trigger
//!
//! Lets synchronous cache code ask the background sync task for a save.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Kind of save being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncRequest {
    /// Coalesced with other requests inside the debounce window
    Debounced,
    /// Skips the debounce window
    Immediate,
}

/// Sending half of the sync request channel.
///
/// Sending never blocks and never fails loudly; a request sent after the
/// sync task has stopped is dropped.
#[derive(Debug, Clone)]
pub struct SyncTrigger {
    tx: UnboundedSender<SyncRequest>,
}

impl SyncTrigger {
    /// Creates a trigger and the receiver the sync task drains.
    pub fn channel() -> (Self, UnboundedReceiver<SyncRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn request(&self) {
        self.send(SyncRequest::Debounced);
    }

    pub fn request_now(&self) {
        self.send(SyncRequest::Immediate);
    }

    fn send(&self, request: SyncRequest) {
        if self.tx.send(request).is_err() {
            debug!("Sync task stopped, dropping {:?} request", request);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_arrive_in_order() {
        let (trigger, mut rx) = SyncTrigger::channel();

        trigger.request();
        trigger.request_now();

        assert_eq!(rx.try_recv().ok(), Some(SyncRequest::Debounced));
        assert_eq!(rx.try_recv().ok(), Some(SyncRequest::Immediate));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (trigger, rx) = SyncTrigger::channel();
        drop(rx);

        // Must not panic
        trigger.request();
    }
}
