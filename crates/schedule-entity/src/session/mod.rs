//! Session entity and its status types.

pub mod model;
pub mod status;

pub use model::{Session, SessionFlags};
pub use status::SessionStatus;
