//! Outbound event sink trait.

use crate::events::DomainEvent;

/// Receiver of committed domain events.
///
/// `publish` must not block: the engine calls it after releasing its lock
/// and never waits for downstream acknowledgment.
pub trait EventSink: Send + Sync + 'static {
    /// Hand an event to downstream consumers.
    fn publish(&self, event: DomainEvent);
}
