//! In-process event bus for single-node deployments.

use tokio::sync::broadcast;
use tracing::debug;

use schedule_core::events::DomainEvent;
use schedule_core::traits::EventSink;

/// Fan-out of committed schedule events to any number of subscribers.
///
/// Publishing never blocks. Subscribers that fall more than the buffer
/// size behind observe a `Lagged` error and skip ahead.
#[derive(Debug, Clone)]
pub struct BroadcastEventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl BroadcastEventBus {
    /// Create a bus buffering up to `buffer_size` events per subscriber.
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size.max(1));
        Self { sender }
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventSink for BroadcastEventBus {
    fn publish(&self, event: DomainEvent) {
        if self.sender.send(event).is_err() {
            debug!("Schedule event dropped, no subscribers");
        }
    }
}
