//! Line-placement batches
//!
//! A batch is the text written to the JSON control point: an ordered array of
//! directives, each placing one string on one line of the display.
//!
//! Decoding is all-or-nothing. A syntax error, a missing key or a non-integer
//! `line`/`position`/`clear` rejects the whole batch before anything reaches
//! the display. Values are kept as decoded so that range errors can be
//! reported with the offending number when the directive is executed.

use serde::Deserialize;
use thiserror::Error;

use crate::{LCD_COLS, LCD_ROWS};

/// Batch decoding errors
#[derive(Debug, Error)]
pub enum ParseError {
    /// The control point holds no text at all
    #[error("no JSON string defined")]
    Empty,
    /// Malformed JSON, missing key or wrong value type
    #[error("malformed batch: {0}")]
    Json(#[from] serde_json::Error),
}

/// What to clear before the text is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClearMode {
    /// Write over whatever is on the line
    #[default]
    None,
    /// Blank the target line first
    Line,
    /// Clear the entire display first
    Display,
}

// Wire values of the `clear` key
const CLEAR_NONE: i64 = 0;
const CLEAR_LINE: i64 = 1;
const CLEAR_DISPLAY: i64 = 2;

impl ClearMode {
    /// Map a `clear` value to a mode
    ///
    /// Values other than 0, 1 and 2 mean "no clear".
    pub fn from_code(code: i64) -> Self {
        match code {
            CLEAR_LINE => ClearMode::Line,
            CLEAR_DISPLAY => ClearMode::Display,
            _ => ClearMode::None,
        }
    }

    /// Wire value of this mode
    pub fn to_code(self) -> i64 {
        match self {
            ClearMode::None => CLEAR_NONE,
            ClearMode::Line => CLEAR_LINE,
            ClearMode::Display => CLEAR_DISPLAY,
        }
    }

    /// Returns true if `code` is one of the defined `clear` values
    pub fn is_known_code(code: i64) -> bool {
        matches!(code, CLEAR_NONE | CLEAR_LINE | CLEAR_DISPLAY)
    }
}

/// A directive whose line or position lies outside the display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RangeError {
    #[error("wrong line number: {0}, ensure 0-3")]
    Line(i64),
    #[error("wrong position number: {0}, ensure 0-19")]
    Position(i64),
}

/// One decoded placement instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDirective {
    /// Target line (valid 0-3)
    pub line: i64,
    /// Start column (valid 0-19)
    pub position: i64,
    /// Clear action applied before writing
    pub clear: ClearMode,
    /// Text to write; the peripheral truncates at the end of the line
    pub text: String,
    clear_code: i64,
}

impl LineDirective {
    pub fn new(line: i64, position: i64, clear: ClearMode, text: impl Into<String>) -> Self {
        Self {
            line,
            position,
            clear,
            text: text.into(),
            clear_code: clear.to_code(),
        }
    }

    /// Check the target cell against the display geometry
    ///
    /// The line is checked before the position.
    pub fn cell(&self) -> Result<(u8, u8), RangeError> {
        let line = u8::try_from(self.line)
            .ok()
            .filter(|l| *l < LCD_ROWS)
            .ok_or(RangeError::Line(self.line))?;
        let position = u8::try_from(self.position)
            .ok()
            .filter(|p| *p < LCD_COLS)
            .ok_or(RangeError::Position(self.position))?;
        Ok((line, position))
    }

    /// The raw `clear` value, if it was not one of 0, 1 or 2
    pub fn unknown_clear_code(&self) -> Option<i64> {
        if ClearMode::is_known_code(self.clear_code) {
            None
        } else {
            Some(self.clear_code)
        }
    }
}

#[derive(Deserialize)]
struct RawDirective {
    line: i64,
    position: i64,
    clear: i64,
    text: String,
}

impl From<RawDirective> for LineDirective {
    fn from(raw: RawDirective) -> Self {
        Self {
            line: raw.line,
            position: raw.position,
            clear: ClearMode::from_code(raw.clear),
            text: raw.text,
            clear_code: raw.clear,
        }
    }
}

/// Decode a batch into directives, preserving input order
pub fn parse_batch(input: &str) -> Result<Vec<LineDirective>, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let raw: Vec<RawDirective> = serde_json::from_str(input)?;
    Ok(raw.into_iter().map(LineDirective::from).collect())
}
