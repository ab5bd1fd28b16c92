//! Core traits defined in `schedule-core` and implemented by other crates.

pub mod event_sink;
pub mod store;

pub use event_sink::EventSink;
pub use store::EntityStore;
