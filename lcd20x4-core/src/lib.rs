//! Session and command core of the LCD 20x4 bridge
//!
//! This crate contains the bridge logic that does not depend on a concrete
//! host platform or peripheral binding:
//!
//! - Display session (connection ownership, serialized commands, batches)
//! - Custom glyph loader
//! - Button event relay
//! - Lifecycle state machine
//! - Host collaborator trait and the error taxonomy

#![deny(unsafe_code)]

// Host critical-section implementation for the test harness
#[cfg(test)]
use critical_section as _;

pub mod error;
pub mod glyphs;
pub mod host;
pub mod relay;
pub mod session;
pub mod state;

pub use error::{ConfigurationError, ConnectionError, ErrorKind, SessionError, ValidationError};
pub use glyphs::{load_glyphs, GlyphReport, GlyphSource, GlyphSourceError};
pub use host::{parse_switch_command, ControlPoint, HostPlatform, LogLevel, BUTTON_BASE_UNIT};
pub use relay::EventRelay;
pub use session::{DisplayConfig, DisplaySession};
pub use state::{LifecycleEvent, LifecycleState};
