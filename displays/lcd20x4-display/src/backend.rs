//! Display peripheral trait
//!
//! Defines the interface to the LCD 20x4 as exposed by the vendor binding:
//! one connection to the controller brick, plus the bricklet's configuration,
//! text and custom-character operations.

use lcd20x4_protocol::{ButtonEvent, GlyphPattern, LCD_COLS};
use thiserror::Error;

/// A full line of spaces, used to blank a line
pub const BLANK_LINE: &str = "                    ";

const _: () = assert!(BLANK_LINE.len() == LCD_COLS as usize);

/// Peripheral link errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// No connection to the controller brick
    #[error("not connected")]
    NotConnected,
    /// The controller refused or did not answer the connection attempt
    #[error("connection refused")]
    Refused,
    /// The connection dropped during an operation
    #[error("connection lost")]
    ConnectionLost,
    /// The peripheral did not answer in time
    #[error("timeout")]
    Timeout,
    /// The peripheral rejected a parameter
    #[error("invalid parameter")]
    InvalidParameter,
}

impl LinkError {
    /// Returns true if the connection can no longer be used
    pub fn is_fatal(&self) -> bool {
        matches!(self, LinkError::NotConnected | LinkError::ConnectionLost)
    }
}

/// Where the peripheral lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Host running the brick daemon
    pub host: String,
    pub port: u16,
    /// Bricklet UID
    pub uid: String,
}

/// Combined cursor configuration
///
/// The peripheral reads and writes both flags together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CursorConfig {
    /// Underscore cursor visible
    pub cursor: bool,
    /// Cursor blinking
    pub blinking: bool,
}

/// Receiver of button callbacks
///
/// Called from the binding's callback context, which is not the context that
/// issues commands.
pub type ButtonHandler = Box<dyn Fn(ButtonEvent) + Send + Sync>;

/// LCD 20x4 peripheral
///
/// Every method is one round-trip to the peripheral. Implementations do not
/// retry.
pub trait Lcd20x4 {
    /// Open the connection to the controller brick
    fn connect(&mut self, endpoint: &Endpoint) -> Result<(), LinkError>;

    /// Close the connection
    fn disconnect(&mut self) -> Result<(), LinkError>;

    /// Check if the connection is open
    fn is_connected(&self) -> bool;

    fn backlight_on(&mut self) -> Result<(), LinkError>;

    fn backlight_off(&mut self) -> Result<(), LinkError>;

    /// Read the current cursor/blink configuration
    fn get_config(&mut self) -> Result<CursorConfig, LinkError>;

    /// Write the cursor/blink configuration
    fn set_config(&mut self, config: CursorConfig) -> Result<(), LinkError>;

    /// Write text at a cell
    ///
    /// - `line`: Line number (0-3)
    /// - `position`: Column (0-19)
    /// - `text`: Text; characters past the last column are dropped
    fn write_line(&mut self, line: u8, position: u8, text: &str) -> Result<(), LinkError>;

    /// Clear the entire display
    fn clear_display(&mut self) -> Result<(), LinkError>;

    /// Program a custom character slot (0-7)
    fn set_custom_character(&mut self, index: u8, pattern: &GlyphPattern)
        -> Result<(), LinkError>;

    /// Register the receiver for button pressed/released callbacks
    ///
    /// Replaces any previously registered handler.
    fn register_button_handler(&mut self, handler: ButtonHandler);
}

/// Operations composed from the peripheral primitives
pub trait Lcd20x4Ext: Lcd20x4 {
    /// Blank a line by overwriting it with spaces
    ///
    /// The peripheral has no native line clear.
    fn clear_line(&mut self, line: u8) -> Result<(), LinkError> {
        self.write_line(line, 0, BLANK_LINE)
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), LinkError> {
        if on {
            self.backlight_on()
        } else {
            self.backlight_off()
        }
    }
}

impl<T: Lcd20x4> Lcd20x4Ext for T {}
