//! LCD 20x4 bridge application
//!
//! Wires the core session to a host platform:
//! - `config`: session parameters from TOML
//! - `controller`: lifecycle and host callback dispatch
//! - `console`: in-memory host driven from stdin

#![deny(unsafe_code)]

// Host critical-section implementation for the embassy-sync primitives
use critical_section as _;

pub mod config;
pub mod console;
pub mod controller;

pub use config::{BridgeConfig, ConfigError, DEFAULT_CONFIG};
pub use console::{parse_command, render, CommandError, ConsoleCommand, ConsoleHost};
pub use controller::{Bridge, BridgeError};
