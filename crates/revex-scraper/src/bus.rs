//! Event fan-out for extraction progress.

use revex_core::ExtractionEvent;
use tokio::sync::broadcast;
use tracing::trace;

/// Broadcast fan-out for [`ExtractionEvent`]s.
///
/// Cloned handles publish into the same channel, so the coordinator, the
/// summary mirror, and any status surface all see one stream. Publishing
/// with no live subscriber drops the event.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ExtractionEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// New subscription receiving every event published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ExtractionEvent> {
        self.sender.subscribe()
    }

    /// Publishes `event` to all current subscribers.
    pub fn publish(&self, event: ExtractionEvent) {
        trace!(?event, "publishing extraction event");
        // A send error only means no subscriber is connected.
        let _ = self.sender.send(event);
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(128)
    }
}
