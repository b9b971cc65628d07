//! Fire-and-forget plugin notification.

use std::sync::{Mutex, PoisonError};
use step_core::Message;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Receives lifecycle messages. Delivery is best effort; nothing flows back.
pub trait PluginHandler: Send + Sync {
    fn notify_plugins(&self, message: &Message);
}

/// Fans messages out to every registered plugin channel.
///
/// Plugins whose receiver has been dropped are pruned on the next
/// notification.
#[derive(Debug, Default)]
pub struct PluginBroadcaster {
    listeners: Mutex<Vec<UnboundedSender<Message>>>,
}

impl PluginBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin and return the channel it will receive messages on.
    pub fn register(&self) -> UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub fn plugin_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl PluginHandler for PluginBroadcaster {
    fn notify_plugins(&self, message: &Message) {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|tx| match tx.send(message.clone()) {
            Ok(()) => true,
            Err(_) => {
                debug!(
                    message_type = message.message_type(),
                    "plugin channel closed, dropping listener"
                );
                false
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use step_core::ExecuteStepRequest;

    fn message() -> Message {
        Message::ExecuteStep(ExecuteStepRequest::default())
    }

    #[test]
    fn notify_reaches_every_plugin() {
        let broadcaster = PluginBroadcaster::new();
        let mut a = broadcaster.register();
        let mut b = broadcaster.register();

        broadcaster.notify_plugins(&message());

        assert!(a.try_recv().is_ok());
        assert!(b.try_recv().is_ok());
    }

    #[test]
    fn notify_without_plugins_is_noop() {
        let broadcaster = PluginBroadcaster::new();
        broadcaster.notify_plugins(&message());
        assert_eq!(broadcaster.plugin_count(), 0);
    }

    #[test]
    fn closed_plugins_are_pruned() {
        let broadcaster = PluginBroadcaster::new();
        let dropped = broadcaster.register();
        let mut kept = broadcaster.register();
        drop(dropped);

        broadcaster.notify_plugins(&message());

        assert_eq!(broadcaster.plugin_count(), 1);
        assert!(kept.try_recv().is_ok());
    }
}
