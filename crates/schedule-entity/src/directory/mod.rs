//! Reference entities owned by the external trainer/session-type directory.

pub mod session_type;
pub mod trainer;

pub use session_type::SessionType;
pub use trainer::Trainer;
