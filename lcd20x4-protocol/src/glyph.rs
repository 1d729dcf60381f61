//! Custom glyph tables
//!
//! The peripheral has eight user-definable character slots. A glyph table
//! describes their content as a JSON array:
//!
//! ```text
//! [
//!     {"id": 0, "name": "battery", "char": "14,27,17,17,17,17,17,31"},
//!     {"id": 1, "name": "clock",   "char": "31,17,10,4,14,31,31,0"}
//! ]
//! ```
//!
//! Each `char` row is a bitmask of the five pixels in that row. Once loaded, a
//! glyph is displayed by writing the character `\u0008 + id`.

use serde::Deserialize;
use thiserror::Error;

use crate::{GLYPH_ROWS, GLYPH_SLOTS};

/// Eight row bitmasks, top row first
pub type GlyphPattern = [u8; GLYPH_ROWS];

/// Glyph table errors
#[derive(Debug, Error)]
pub enum GlyphError {
    /// The table as a whole could not be decoded
    #[error("malformed glyph table: {0}")]
    Table(#[from] serde_json::Error),
    /// Entry id outside the slot range
    #[error("index {0} not in range 0-7")]
    IdOutOfRange(i64),
    /// Entry pattern is not eight row values
    #[error("index {id}: pattern \"{pattern}\" is not 8 comma-separated values 0-255")]
    InvalidPattern { id: u8, pattern: String },
}

/// One table entry as decoded, before validation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GlyphEntry {
    pub id: i64,
    pub name: String,
    #[serde(rename = "char")]
    pub pattern: String,
}

/// A validated glyph ready to be programmed into a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphDefinition {
    /// Slot index (0-7)
    pub id: u8,
    /// Label, informational only
    pub name: String,
    pub pattern: GlyphPattern,
}

impl GlyphDefinition {
    /// The character that displays this glyph once loaded
    pub fn display_char(&self) -> char {
        char::from(0x08 + self.id)
    }
}

impl GlyphEntry {
    /// Check the id and decode the row pattern
    pub fn validate(&self) -> Result<GlyphDefinition, GlyphError> {
        let id = u8::try_from(self.id)
            .ok()
            .filter(|id| *id < GLYPH_SLOTS)
            .ok_or(GlyphError::IdOutOfRange(self.id))?;

        let pattern = parse_pattern(&self.pattern).ok_or_else(|| GlyphError::InvalidPattern {
            id,
            pattern: self.pattern.clone(),
        })?;

        Ok(GlyphDefinition {
            id,
            name: self.name.clone(),
            pattern,
        })
    }
}

/// Parse "r0,r1,...,r7" into row values
fn parse_pattern(text: &str) -> Option<GlyphPattern> {
    let mut rows = [0u8; GLYPH_ROWS];
    let mut count = 0;

    for value in text.trim().split(',') {
        if count == GLYPH_ROWS {
            return None;
        }
        rows[count] = value.trim().parse().ok()?;
        count += 1;
    }

    (count == GLYPH_ROWS).then_some(rows)
}

/// Decode a glyph table
///
/// Only the table structure is checked here; ids and patterns are validated
/// per entry with [`GlyphEntry::validate`] so one bad entry does not discard
/// the others.
pub fn parse_glyph_table(input: &str) -> Result<Vec<GlyphEntry>, GlyphError> {
    Ok(serde_json::from_str(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"[
        {"id":0,"name":"battery","char":"14,27,17,17,17,17,17,31"},
        {"id":1,"name":"clock","char":" 31, 17,10,4,14,31,31,0 "}
    ]"#;

    #[test]
    fn test_parse_table() {
        let entries = parse_glyph_table(TABLE).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "battery");

        let battery = entries[0].validate().unwrap();
        assert_eq!(battery.id, 0);
        assert_eq!(battery.pattern, [14, 27, 17, 17, 17, 17, 17, 31]);

        let clock = entries[1].validate().unwrap();
        assert_eq!(clock.pattern, [31, 17, 10, 4, 14, 31, 31, 0]);
    }

    #[test]
    fn test_id_out_of_range() {
        let entry = GlyphEntry {
            id: 9,
            name: "nine".into(),
            pattern: "0,0,0,0,0,0,0,0".into(),
        };
        assert!(matches!(entry.validate(), Err(GlyphError::IdOutOfRange(9))));

        let entry = GlyphEntry { id: -1, ..entry };
        assert!(matches!(entry.validate(), Err(GlyphError::IdOutOfRange(-1))));
    }

    #[test]
    fn test_invalid_patterns() {
        for pattern in ["1,2,3", "1,2,3,4,5,6,7,8,9", "1,2,3,4,5,6,7,x", "", "1,2,3,4,5,6,7,256"] {
            let entry = GlyphEntry {
                id: 2,
                name: "bad".into(),
                pattern: pattern.into(),
            };
            assert!(
                matches!(entry.validate(), Err(GlyphError::InvalidPattern { id: 2, .. })),
                "pattern {pattern:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_malformed_table() {
        assert!(matches!(parse_glyph_table("[{"), Err(GlyphError::Table(_))));
        assert!(matches!(
            parse_glyph_table(r#"[{"id":0,"name":"x"}]"#),
            Err(GlyphError::Table(_))
        ));
    }

    #[test]
    fn test_empty_table() {
        assert!(parse_glyph_table("[]").unwrap().is_empty());
    }

    #[test]
    fn test_display_char() {
        let glyph = GlyphDefinition {
            id: 3,
            name: String::new(),
            pattern: [0; GLYPH_ROWS],
        };
        assert_eq!(glyph.display_char(), '\u{b}');
    }
}
