//! Display peripheral abstraction for the LCD 20x4 bridge
//!
//! This crate provides:
//! - `Lcd20x4` trait for the peripheral as exposed by the vendor binding
//! - `Screen` character buffer mirroring the display content
//! - `SimulatedLcd`, an in-memory peripheral for tests and the console bridge
//!
//! # Architecture
//!
//! The bridge core only talks to `Lcd20x4`. A production build implements it
//! on top of the vendor's IP connection; button callbacks arrive on the
//! binding's own thread through the registered `ButtonHandler`.

#![deny(unsafe_code)]

pub mod backend;
pub mod screen;
pub mod simulated;

// Re-export key types
pub use backend::{
    ButtonHandler, CursorConfig, Endpoint, Lcd20x4, Lcd20x4Ext, LinkError, BLANK_LINE,
};
pub use screen::{Screen, SCREEN_COLS, SCREEN_ROWS};
pub use simulated::SimulatedLcd;
