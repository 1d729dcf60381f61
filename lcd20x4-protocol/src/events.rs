//! Button events from the display peripheral

use crate::BUTTON_COUNT;

/// Edge of a button transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Pressed,
    Released,
}

impl Edge {
    /// Switch state the edge maps to on the host (pressed = on)
    pub fn is_on(self) -> bool {
        matches!(self, Edge::Pressed)
    }
}

/// A single button transition reported by the peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonEvent {
    /// Button index (0-3 on a healthy peripheral)
    pub button: u8,
    pub edge: Edge,
}

impl ButtonEvent {
    pub fn pressed(button: u8) -> Self {
        Self {
            button,
            edge: Edge::Pressed,
        }
    }

    pub fn released(button: u8) -> Self {
        Self {
            button,
            edge: Edge::Released,
        }
    }

    /// Returns true if the index names one of the physical buttons
    pub fn is_valid(&self) -> bool {
        self.button < BUTTON_COUNT
    }
}
