//! Error taxonomy
//!
//! Every operation returns one of these; the lifecycle controller turns them
//! into a single ERROR line on the host log. Nothing here is fatal to the
//! process and nothing is retried.

use lcd20x4_display::LinkError;
use lcd20x4_protocol::{GlyphError, ParseError, RangeError};
use thiserror::Error;

use crate::host::ControlPoint;

/// Missing or invalid session parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigurationError {
    #[error("bricklet UID not set, get the UID using the Brick Viewer")]
    MissingUid,
    #[error("host address not set")]
    MissingAddress,
    #[error("port 0 is not a valid port")]
    InvalidPort,
}

/// Connection could not be established or is gone
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("not connected to the master brick, check settings")]
    NotConnected,
    #[error("IP connection to {host}:{port} failed ({source}), check the settings")]
    Failed {
        host: String,
        port: u16,
        #[source]
        source: LinkError,
    },
}

/// Out-of-range or unrecognised input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Directive(#[from] RangeError),
    #[error("button index {0} not in range 0-3")]
    Button(u8),
    #[error("unknown unit {0}")]
    UnknownUnit(u8),
    #[error("unknown switch command \"{0}\", expected On or Off")]
    SwitchCommand(String),
    #[error("{0} does not accept switch commands")]
    NotASwitch(ControlPoint),
}

/// Coarse classification of a [`SessionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    Configuration,
    Connection,
    Validation,
    Parse,
    Io,
}

/// Failure of a single bridge operation
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Glyph(#[from] GlyphError),
    #[error("peripheral I/O failed: {0}")]
    Io(LinkError),
}

impl From<LinkError> for SessionError {
    fn from(error: LinkError) -> Self {
        match error {
            LinkError::NotConnected => ConnectionError::NotConnected.into(),
            other => SessionError::Io(other),
        }
    }
}

impl From<RangeError> for SessionError {
    fn from(error: RangeError) -> Self {
        ValidationError::from(error).into()
    }
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Configuration(_) => ErrorKind::Configuration,
            SessionError::Connection(_) => ErrorKind::Connection,
            SessionError::Validation(_) => ErrorKind::Validation,
            SessionError::Parse(_) => ErrorKind::Parse,
            SessionError::Glyph(GlyphError::Table(_)) => ErrorKind::Parse,
            SessionError::Glyph(_) => ErrorKind::Validation,
            SessionError::Io(_) => ErrorKind::Io,
        }
    }
}
