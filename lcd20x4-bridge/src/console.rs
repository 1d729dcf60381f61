//! Console host
//!
//! A stand-in for the automation platform: control points live in memory,
//! host log lines go to the `log` facade, and commands are typed on stdin.
//!
//! ```text
//! backlight on | cursor off | blinking on     switch commands
//! press 2 | release 2                         button edges
//! [{"line":0,"position":0,"clear":2,"text":"Hi"}]   JSON batch
//! show | quit
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use heapless::Deque;
use lcd20x4_core::{ControlPoint, HostPlatform, LogLevel};
use lcd20x4_display::Screen;
use thiserror::Error;

/// Log lines and switch updates kept for inspection
pub const HISTORY_SIZE: usize = 64;

#[derive(Default)]
struct Points {
    switches: HashMap<ControlPoint, bool>,
    texts: HashMap<ControlPoint, String>,
    log: Deque<(LogLevel, String), HISTORY_SIZE>,
    updates: Deque<(ControlPoint, bool), HISTORY_SIZE>,
}

/// In-memory host platform
#[derive(Default)]
pub struct ConsoleHost {
    points: Mutex<Points>,
}

/// Push onto a bounded history, dropping the oldest entry when full
fn remember<T, const N: usize>(history: &mut Deque<T, N>, item: T) {
    if history.is_full() {
        history.pop_front();
    }
    let _ = history.push_back(item);
}

impl ConsoleHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn points(&self) -> MutexGuard<'_, Points> {
        self.points.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store text on a control point, as the host UI would
    pub fn set_text(&self, point: ControlPoint, text: &str) {
        self.points().texts.insert(point, text.into());
    }

    /// Recent log lines of one class, oldest first
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.points()
            .log
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Recent switch updates, oldest first
    pub fn updates(&self) -> Vec<(ControlPoint, bool)> {
        self.points().updates.iter().copied().collect()
    }

    /// Forget recent log lines and updates
    pub fn clear_history(&self) {
        let mut points = self.points();
        points.log.clear();
        points.updates.clear();
    }
}

impl HostPlatform for ConsoleHost {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Ok => log::info!(target: "host", "{}", message),
            LogLevel::Error => log::error!(target: "host", "{}", message),
            LogLevel::Debug => log::debug!(target: "host", "{}", message),
        }
        remember(&mut self.points().log, (level, message.to_string()));
    }

    fn control_point_exists(&self, point: ControlPoint) -> bool {
        let points = self.points();
        points.switches.contains_key(&point) || points.texts.contains_key(&point)
    }

    fn create_control_point(&self, point: ControlPoint, initial: bool) {
        let mut points = self.points();
        if point.is_switch() {
            points.switches.insert(point, initial);
        } else {
            points.texts.insert(point, String::new());
        }
    }

    fn switch_state(&self, point: ControlPoint) -> Option<bool> {
        self.points().switches.get(&point).copied()
    }

    fn text_value(&self, point: ControlPoint) -> Option<String> {
        self.points().texts.get(&point).cloned()
    }

    fn update_switch(&self, point: ControlPoint, on: bool) {
        let mut points = self.points();
        points.switches.insert(point, on);
        remember(&mut points.updates, (point, on));
    }
}

/// One line typed on the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Switch command for a unit (`On` / `Off`)
    Switch { unit: u8, command: &'static str },
    Press(u8),
    Release(u8),
    /// JSON batch for the text control point
    Batch(String),
    Show,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command \"{0}\"")]
    Unknown(String),
    #[error("{0} needs an argument")]
    MissingArgument(&'static str),
    #[error("expected on or off, got \"{0}\"")]
    State(String),
    #[error("expected a button number, got \"{0}\"")]
    Button(String),
}

/// Parse one console line; blank lines yield `None`
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if line.starts_with('[') {
        return Ok(Some(ConsoleCommand::Batch(line.into())));
    }

    let mut words = line.split_whitespace();
    let name = words.next().unwrap_or_default();
    let argument = words.next();

    let command = match name.to_ascii_lowercase().as_str() {
        "backlight" => switch(ControlPoint::Backlight, "backlight", argument)?,
        "cursor" => switch(ControlPoint::Cursor, "cursor", argument)?,
        "blinking" | "blink" => switch(ControlPoint::Blinking, "blinking", argument)?,
        "press" => ConsoleCommand::Press(button(argument)?),
        "release" => ConsoleCommand::Release(button(argument)?),
        "show" => ConsoleCommand::Show,
        "quit" | "exit" => ConsoleCommand::Quit,
        _ => return Err(CommandError::Unknown(name.into())),
    };
    Ok(Some(command))
}

fn switch(
    point: ControlPoint,
    name: &'static str,
    argument: Option<&str>,
) -> Result<ConsoleCommand, CommandError> {
    let argument = argument.ok_or(CommandError::MissingArgument(name))?;
    let command = match argument.to_ascii_lowercase().as_str() {
        "on" => "On",
        "off" => "Off",
        _ => return Err(CommandError::State(argument.into())),
    };
    Ok(ConsoleCommand::Switch {
        unit: point.unit(),
        command,
    })
}

fn button(argument: Option<&str>) -> Result<u8, CommandError> {
    let argument = argument.ok_or(CommandError::MissingArgument("button"))?;
    argument
        .parse()
        .map_err(|_| CommandError::Button(argument.into()))
}

/// Draw the screen inside a frame
pub fn render(screen: &Screen) -> String {
    let border = format!("+{}+", "-".repeat(screen.cols()));
    let mut out = String::with_capacity((screen.cols() + 3) * (screen.rows() + 2));
    out.push_str(&border);
    out.push('\n');
    for line in screen.lines() {
        out.push('|');
        // Glyph slots render as their slot digit
        out.extend(line.chars().map(|c| match c {
            '\u{8}'..='\u{f}' => char::from(b'0' + (c as u8 - 8)),
            c if c.is_control() => '?',
            c => c,
        }));
        out.push_str("|\n");
    }
    out.push_str(&border);
    out
}
