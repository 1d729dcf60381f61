//! LCD 20x4 Bridge data formats
//!
//! This crate defines everything that crosses the boundary between the host
//! automation platform, the bridge and the display peripheral:
//!
//! - The **batch format**: a JSON array of line-placement directives written
//!   to the text control point.
//! - The **glyph table**: a JSON array of custom 5x8 characters loaded into
//!   the peripheral's eight user slots.
//! - **Button events** delivered by the peripheral's callbacks.
//! - **LCD commands**, the operations the bridge issues to the peripheral.
//!
//! # Batch Format
//!
//! ```text
//! [{"line": 0-3, "position": 0-19, "clear": 0|1|2, "text": "..."}, ...]
//! ```
//!
//! Parsing only decodes; range checks on `line` and `position` are applied
//! directive by directive when the batch is executed.

#![deny(unsafe_code)]

pub mod batch;
pub mod commands;
pub mod events;
pub mod glyph;

pub use batch::{parse_batch, ClearMode, LineDirective, ParseError, RangeError};
pub use commands::LcdCommand;
pub use events::{ButtonEvent, Edge};
pub use glyph::{parse_glyph_table, GlyphDefinition, GlyphEntry, GlyphError, GlyphPattern};

/// Number of text lines on the display
pub const LCD_ROWS: u8 = 4;

/// Number of character columns per line
pub const LCD_COLS: u8 = 20;

/// Number of user-definable glyph slots
pub const GLYPH_SLOTS: u8 = 8;

/// Rows in a glyph bitmap
pub const GLYPH_ROWS: usize = 8;

/// Number of physical buttons below the display
pub const BUTTON_COUNT: u8 = 4;
