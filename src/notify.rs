//! Fire-and-forget notification of recorded touches.
//!
//! Observers subscribe to a broadcast channel and receive a
//! [`TouchEvent`] whenever a descriptor was resolved and merged into the
//! store (not on every request). Delivery is best-effort: sending never
//! blocks the response path, events are dropped silently when nobody is
//! listening, and a lagging subscriber loses old events rather than
//! applying backpressure.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::touch::TouchRecord;

/// Payload delivered to observers when a touch is recorded.
#[derive(Debug, Clone, Serialize)]
pub struct TouchEvent {
    /// Request path the touch was recorded on.
    pub path: String,
    /// The full touch list after the merge, in first-seen order.
    pub touches: Vec<TouchRecord>,
    /// The touch that was inserted or refreshed.
    pub accepted: TouchRecord,
}

/// Broadcast fan-out for touch events.
#[derive(Debug, Clone)]
pub struct TouchNotifier {
    tx: broadcast::Sender<TouchEvent>,
}

impl TouchNotifier {
    /// Create a notifier with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to touch events. Each receiver sees every event sent
    /// after the subscription, subject to the lag policy above.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TouchEvent> {
        self.tx.subscribe()
    }

    /// Deliver an event to current subscribers. Never blocks; a send
    /// with no subscribers is a no-op.
    pub fn notify(&self, event: TouchEvent) {
        if self.tx.send(event).is_err() {
            trace!("touch event dropped: no subscribers");
        }
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for TouchNotifier {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}
