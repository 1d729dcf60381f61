//! Host collaborator interface
//!
//! The automation platform owns the control points and the log. The bridge
//! only sees this trait.

use core::fmt;

use lcd20x4_protocol::BUTTON_COUNT;

use crate::error::ValidationError;

/// Unit number of the first button control point
pub const BUTTON_BASE_UNIT: u8 = 5;

/// Addressable state holder exposed to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlPoint {
    /// Text control point receiving batches
    Json,
    Backlight,
    Cursor,
    Blinking,
    /// Button 0-3, written by the event relay
    Button(u8),
}

impl ControlPoint {
    /// Every control point, in unit order
    pub const ALL: [ControlPoint; 8] = [
        ControlPoint::Json,
        ControlPoint::Backlight,
        ControlPoint::Cursor,
        ControlPoint::Blinking,
        ControlPoint::Button(0),
        ControlPoint::Button(1),
        ControlPoint::Button(2),
        ControlPoint::Button(3),
    ];

    /// Host unit number
    pub fn unit(self) -> u8 {
        match self {
            ControlPoint::Json => 1,
            ControlPoint::Backlight => 2,
            ControlPoint::Cursor => 3,
            ControlPoint::Blinking => 4,
            ControlPoint::Button(index) => BUTTON_BASE_UNIT + index,
        }
    }

    pub fn from_unit(unit: u8) -> Result<Self, ValidationError> {
        match unit {
            1 => Ok(ControlPoint::Json),
            2 => Ok(ControlPoint::Backlight),
            3 => Ok(ControlPoint::Cursor),
            4 => Ok(ControlPoint::Blinking),
            u if (BUTTON_BASE_UNIT..BUTTON_BASE_UNIT + BUTTON_COUNT).contains(&u) => {
                Ok(ControlPoint::Button(u - BUTTON_BASE_UNIT))
            }
            u => Err(ValidationError::UnknownUnit(u)),
        }
    }

    /// Returns true for on/off control points
    pub fn is_switch(self) -> bool {
        !matches!(self, ControlPoint::Json)
    }

    /// State a freshly provisioned control point starts in
    pub fn default_state(self) -> bool {
        matches!(self, ControlPoint::Backlight)
    }
}

impl fmt::Display for ControlPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlPoint::Json => f.write_str("JSON"),
            ControlPoint::Backlight => f.write_str("Backlight"),
            ControlPoint::Cursor => f.write_str("Cursor"),
            ControlPoint::Blinking => f.write_str("Blinking"),
            ControlPoint::Button(index) => write!(f, "Button {}", index),
        }
    }
}

/// Host log classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogLevel {
    Ok,
    Error,
    Debug,
}

/// The host automation platform
///
/// Called from both the command path and the event relay, so every method
/// takes `&self`.
pub trait HostPlatform {
    /// Write one line to the host log
    fn log(&self, level: LogLevel, message: &str);

    /// Check whether a control point has been created
    fn control_point_exists(&self, point: ControlPoint) -> bool;

    /// Create a control point with an initial switch state
    fn create_control_point(&self, point: ControlPoint, initial: bool);

    /// Persisted on/off state of a switch control point
    fn switch_state(&self, point: ControlPoint) -> Option<bool>;

    /// Persisted text of the JSON control point
    fn text_value(&self, point: ControlPoint) -> Option<String>;

    /// Publish a new switch state
    fn update_switch(&self, point: ControlPoint, on: bool);

    fn ok(&self, message: &str) {
        self.log(LogLevel::Ok, message);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }
}

/// Parse a host switch command word
///
/// The host sends exactly `On` or `Off`.
pub fn parse_switch_command(command: &str) -> Result<bool, ValidationError> {
    match command {
        "On" => Ok(true),
        "Off" => Ok(false),
        other => Err(ValidationError::SwitchCommand(other.into())),
    }
}
