//! Operations issued to the display peripheral
//!
//! Commands are divided into two categories:
//! - Configuration: backlight, cursor/blink, custom characters
//! - Content: line writes and whole-display clear

use core::fmt;

use crate::glyph::GlyphPattern;

/// A single peripheral operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LcdCommand {
    BacklightOn,
    BacklightOff,
    /// Read the combined cursor/blink configuration
    GetConfig,
    /// Write the combined cursor/blink configuration
    SetConfig { cursor: bool, blinking: bool },
    /// Write text starting at a cell
    WriteLine { line: u8, position: u8, text: String },
    /// Clear the entire display
    ClearDisplay,
    /// Program a user glyph slot
    SetCustomCharacter { index: u8, pattern: GlyphPattern },
}

impl LcdCommand {
    /// Returns true if this command changes what is shown on screen
    pub fn is_content(&self) -> bool {
        matches!(self, LcdCommand::WriteLine { .. } | LcdCommand::ClearDisplay)
    }
}

impl fmt::Display for LcdCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LcdCommand::BacklightOn => write!(f, "backlight on"),
            LcdCommand::BacklightOff => write!(f, "backlight off"),
            LcdCommand::GetConfig => write!(f, "get config"),
            LcdCommand::SetConfig { cursor, blinking } => {
                write!(f, "set config cursor={cursor} blinking={blinking}")
            }
            LcdCommand::WriteLine {
                line,
                position,
                text,
            } => write!(f, "write line={line} position={position} text={text:?}"),
            LcdCommand::ClearDisplay => write!(f, "clear display"),
            LcdCommand::SetCustomCharacter { index, pattern } => {
                write!(f, "custom character {index} {pattern:?}")
            }
        }
    }
}
