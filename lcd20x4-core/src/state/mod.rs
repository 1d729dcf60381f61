//! Session lifecycle state machine
//!
//! The lifecycle is explicit, finite, and deterministic. Connection state is
//! tracked separately by the display session.

pub mod events;
pub mod machine;

pub use events::LifecycleEvent;
pub use machine::LifecycleState;
