//! Event bus for step lifecycle events.

use step_core::ExecutionEvent;
use tokio::sync::broadcast;
use tracing::trace;

/// Default channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 1000;

/// Publishes step lifecycle events. Publishing never fails from the
/// caller's point of view.
pub trait EventBus: Send + Sync {
    fn publish(&self, event: ExecutionEvent);
}

/// Event bus backed by a tokio broadcast channel.
///
/// Subscribers that fall behind by more than the capacity miss the oldest
/// events (`RecvError::Lagged`).
#[derive(Debug, Clone)]
pub struct BroadcastEventBus {
    sender: broadcast::Sender<ExecutionEvent>,
}

impl BroadcastEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus for BroadcastEventBus {
    fn publish(&self, event: ExecutionEvent) {
        let event_type = event.event_type;
        // An error here only means nobody is subscribed.
        if self.sender.send(event).is_err() {
            trace!(event = event_type.as_str(), "no event subscribers");
        }
    }
}
