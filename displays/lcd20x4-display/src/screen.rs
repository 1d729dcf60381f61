//! Screen buffer
//!
//! Character-cell model of the LCD content, used by the simulated peripheral
//! and for rendering the display state on the console.

use heapless::String;
use lcd20x4_protocol::{LCD_COLS, LCD_ROWS};

/// Number of character rows
pub const SCREEN_ROWS: usize = LCD_ROWS as usize;

/// Number of character columns
pub const SCREEN_COLS: usize = LCD_COLS as usize;

/// Worst-case UTF-8 size of one line
pub const LINE_BYTES: usize = SCREEN_COLS * 4;

/// Character-cell screen buffer
///
/// Writes behave like the peripheral: text overwrites cells starting at the
/// given column and anything past the last column is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    cells: [[char; SCREEN_COLS]; SCREEN_ROWS],
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen {
    /// Create a blank screen
    pub fn new() -> Self {
        Self {
            cells: [[' '; SCREEN_COLS]; SCREEN_ROWS],
        }
    }

    /// Blank every cell
    pub fn clear(&mut self) {
        for row in &mut self.cells {
            row.fill(' ');
        }
    }

    /// Write text starting at a cell
    ///
    /// Returns the number of characters that landed on the screen.
    pub fn write(&mut self, row: usize, col: usize, text: &str) -> usize {
        let Some(cells) = self.cells.get_mut(row) else {
            return 0;
        };
        if col >= SCREEN_COLS {
            return 0;
        }

        let mut written = 0;
        for (cell, ch) in cells[col..].iter_mut().zip(text.chars()) {
            *cell = ch;
            written += 1;
        }
        written
    }

    /// Get the content of a row
    pub fn line(&self, row: usize) -> Option<String<LINE_BYTES>> {
        let cells = self.cells.get(row)?;
        let mut line = String::new();
        for &ch in cells {
            // Cannot overflow: LINE_BYTES covers 4-byte characters in every cell
            let _ = line.push(ch);
        }
        Some(line)
    }

    /// Get a single cell
    pub fn cell(&self, row: usize, col: usize) -> Option<char> {
        self.cells.get(row)?.get(col).copied()
    }

    /// Check if a row holds only spaces
    pub fn is_blank_line(&self, row: usize) -> bool {
        self.cells
            .get(row)
            .is_some_and(|cells| cells.iter().all(|&c| c == ' '))
    }

    /// Get all rows
    pub fn lines(&self) -> impl Iterator<Item = String<LINE_BYTES>> + '_ {
        (0..SCREEN_ROWS).filter_map(|row| self.line(row))
    }

    pub const fn rows(&self) -> usize {
        SCREEN_ROWS
    }

    pub const fn cols(&self) -> usize {
        SCREEN_COLS
    }
}
