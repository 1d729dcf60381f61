//! Simulated LCD 20x4
//!
//! An in-memory peripheral that renders into a [`Screen`] and records every
//! command it accepts. Clones share the same device, so a clone can be kept
//! to inspect the display or press buttons after the first one has been
//! handed to a session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lcd20x4_protocol::{ButtonEvent, GlyphPattern, LcdCommand, GLYPH_SLOTS, LCD_COLS, LCD_ROWS};

use crate::backend::{ButtonHandler, CursorConfig, Endpoint, Lcd20x4, LinkError};
use crate::screen::Screen;

#[derive(Default)]
struct Device {
    connected: bool,
    endpoint: Option<Endpoint>,
    backlight: bool,
    config: CursorConfig,
    screen: Screen,
    glyphs: [Option<GlyphPattern>; GLYPH_SLOTS as usize],
    /// Accepted commands, oldest first
    commands: Vec<LcdCommand>,
    refuse_connect: bool,
    /// Fail the command after this many more have succeeded
    injected_fault: Option<(usize, LinkError)>,
    /// Fail the next close
    disconnect_fault: Option<LinkError>,
    handler: Option<Arc<dyn Fn(ButtonEvent) + Send + Sync>>,
    /// Edges raised by the next accepted line write
    edges_on_write: Vec<ButtonEvent>,
}

impl Device {
    /// Gate a command on the link state and any injected fault
    fn admit(&mut self) -> Result<(), LinkError> {
        if !self.connected {
            return Err(LinkError::NotConnected);
        }
        match self.injected_fault.take() {
            Some((0, error)) => Err(error),
            Some((remaining, error)) => {
                self.injected_fault = Some((remaining - 1, error));
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// In-memory peripheral
#[derive(Clone, Default)]
pub struct SimulatedLcd {
    device: Arc<Mutex<Device>>,
}

impl SimulatedLcd {
    pub fn new() -> Self {
        Self::default()
    }

    fn device(&self) -> MutexGuard<'_, Device> {
        self.device.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make connection attempts fail with [`LinkError::Refused`]
    pub fn refuse_connections(&self, refuse: bool) {
        self.device().refuse_connect = refuse;
    }

    /// Fail a future command
    ///
    /// The next `after` commands succeed, the one after that fails with
    /// `error`. Like the vendor binding, the link still reports connected
    /// after a [`LinkError::ConnectionLost`] until it is closed.
    pub fn inject_fault(&self, after: usize, error: LinkError) {
        self.device().injected_fault = Some((after, error));
    }

    /// Make the next `disconnect` fail with `error`, leaving the link open
    pub fn fail_next_disconnect(&self, error: LinkError) {
        self.device().disconnect_fault = Some(error);
    }

    /// Simulate a button press
    pub fn press(&self, button: u8) {
        self.emit(ButtonEvent::pressed(button));
    }

    /// Simulate a button release
    pub fn release(&self, button: u8) {
        self.emit(ButtonEvent::released(button));
    }

    /// Raise a button edge while the next line write is in progress
    ///
    /// The edge reaches the handler before `write_line` returns, so from the
    /// caller's side it arrives while the command is still running.
    pub fn emit_during_next_write(&self, event: ButtonEvent) {
        self.device().edges_on_write.push(event);
    }

    fn emit(&self, event: ButtonEvent) {
        // Called without the device lock, as the binding's callback thread would
        let handler = self.device().handler.clone();
        if let Some(handler) = handler {
            handler(event);
        }
    }

    /// Current screen content
    pub fn screen(&self) -> Screen {
        self.device().screen.clone()
    }

    /// All accepted commands, oldest first
    pub fn commands(&self) -> Vec<LcdCommand> {
        self.device().commands.clone()
    }

    /// Accepted commands that changed the screen
    pub fn content_commands(&self) -> Vec<LcdCommand> {
        self.device()
            .commands
            .iter()
            .filter(|cmd| cmd.is_content())
            .cloned()
            .collect()
    }

    /// Forget the command history
    pub fn clear_commands(&self) {
        self.device().commands.clear();
    }

    pub fn backlight(&self) -> bool {
        self.device().backlight
    }

    pub fn cursor_config(&self) -> CursorConfig {
        self.device().config
    }

    /// Pattern loaded into a glyph slot
    pub fn glyph(&self, index: u8) -> Option<GlyphPattern> {
        self.device().glyphs.get(usize::from(index)).copied().flatten()
    }

    /// Endpoint of the last successful connection
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.device().endpoint.clone()
    }

    pub fn has_button_handler(&self) -> bool {
        self.device().handler.is_some()
    }
}

impl Lcd20x4 for SimulatedLcd {
    fn connect(&mut self, endpoint: &Endpoint) -> Result<(), LinkError> {
        let mut device = self.device();
        if device.refuse_connect {
            return Err(LinkError::Refused);
        }
        if endpoint.uid.trim().is_empty() {
            return Err(LinkError::InvalidParameter);
        }
        device.connected = true;
        device.endpoint = Some(endpoint.clone());
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), LinkError> {
        let mut device = self.device();
        if !device.connected {
            return Err(LinkError::NotConnected);
        }
        if let Some(error) = device.disconnect_fault.take() {
            return Err(error);
        }
        device.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.device().connected
    }

    fn backlight_on(&mut self) -> Result<(), LinkError> {
        let mut device = self.device();
        device.admit()?;
        device.backlight = true;
        device.commands.push(LcdCommand::BacklightOn);
        Ok(())
    }

    fn backlight_off(&mut self) -> Result<(), LinkError> {
        let mut device = self.device();
        device.admit()?;
        device.backlight = false;
        device.commands.push(LcdCommand::BacklightOff);
        Ok(())
    }

    fn get_config(&mut self) -> Result<CursorConfig, LinkError> {
        let mut device = self.device();
        device.admit()?;
        device.commands.push(LcdCommand::GetConfig);
        Ok(device.config)
    }

    fn set_config(&mut self, config: CursorConfig) -> Result<(), LinkError> {
        let mut device = self.device();
        device.admit()?;
        device.config = config;
        device.commands.push(LcdCommand::SetConfig {
            cursor: config.cursor,
            blinking: config.blinking,
        });
        Ok(())
    }

    fn write_line(&mut self, line: u8, position: u8, text: &str) -> Result<(), LinkError> {
        let mut device = self.device();
        device.admit()?;
        if line >= LCD_ROWS || position >= LCD_COLS {
            return Err(LinkError::InvalidParameter);
        }
        device
            .screen
            .write(usize::from(line), usize::from(position), text);
        device.commands.push(LcdCommand::WriteLine {
            line,
            position,
            text: text.into(),
        });
        let edges = std::mem::take(&mut device.edges_on_write);
        drop(device);
        for edge in edges {
            self.emit(edge);
        }
        Ok(())
    }

    fn clear_display(&mut self) -> Result<(), LinkError> {
        let mut device = self.device();
        device.admit()?;
        device.screen.clear();
        device.commands.push(LcdCommand::ClearDisplay);
        Ok(())
    }

    fn set_custom_character(
        &mut self,
        index: u8,
        pattern: &GlyphPattern,
    ) -> Result<(), LinkError> {
        let mut device = self.device();
        device.admit()?;
        let slot = device
            .glyphs
            .get_mut(usize::from(index))
            .ok_or(LinkError::InvalidParameter)?;
        *slot = Some(*pattern);
        device.commands.push(LcdCommand::SetCustomCharacter {
            index,
            pattern: *pattern,
        });
        Ok(())
    }

    fn register_button_handler(&mut self, handler: ButtonHandler) {
        self.device().handler = Some(Arc::from(handler));
    }
}
