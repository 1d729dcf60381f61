//! Session lifecycle controller
//!
//! The controller is the one place where host callbacks enter the bridge:
//! - Start: provision control points, connect, configure, register callbacks
//! - Stop and host disconnect: close the connection
//! - Switch commands and text updates: dispatch to the display session
//! - Button events: forwarded by the relay as they arrive
//!
//! Every failure is logged here, once, as an ERROR line on the host.

use lcd20x4_core::{
    load_glyphs, parse_switch_command, ControlPoint, DisplaySession, ErrorKind, EventRelay,
    HostPlatform, LifecycleEvent, LifecycleState, SessionError, ValidationError,
};
use lcd20x4_display::Lcd20x4;
use lcd20x4_protocol::parse_batch;
use thiserror::Error;

use crate::config::{BridgeConfig, ConfigError};

/// Controller errors
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("cannot {action} while {state:?}")]
    InvalidState {
        state: LifecycleState,
        action: &'static str,
    },
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Config(_) => ErrorKind::Configuration,
            BridgeError::Session(error) => error.kind(),
            BridgeError::InvalidState { .. } => ErrorKind::Validation,
        }
    }
}

impl From<ValidationError> for BridgeError {
    fn from(error: ValidationError) -> Self {
        BridgeError::Session(error.into())
    }
}

/// Bridge between one host platform and one peripheral
pub struct Bridge<L, H> {
    config: BridgeConfig,
    session: DisplaySession<L>,
    relay: EventRelay,
    host: H,
    state: LifecycleState,
}

impl<L: Lcd20x4, H: HostPlatform> Bridge<L, H> {
    pub fn new(config: BridgeConfig, lcd: L, host: H) -> Self {
        Self {
            config,
            session: DisplaySession::new(lcd),
            relay: EventRelay::new(),
            host,
            state: LifecycleState::Idle,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    fn transition(&mut self, event: LifecycleEvent) {
        let next = self.state.transition(event);
        if next != self.state {
            log::debug!("lifecycle {:?} -> {:?} on {:?}", self.state, next, event);
        }
        self.state = next;
    }

    /// Log a failed operation on the host
    fn report<T>(&self, operation: &str, result: Result<T, BridgeError>) -> Result<T, BridgeError> {
        if let Err(error) = &result {
            self.host.error(&format!("{}: {}", operation, error));
        }
        result
    }

    /// Start the bridge
    ///
    /// A missing UID or a failed connection leaves the bridge idle; there is
    /// no retry.
    pub async fn start(&mut self) -> Result<(), BridgeError> {
        if !self.state.can_start() {
            let error = BridgeError::InvalidState {
                state: self.state,
                action: "start",
            };
            return self.report("start", Err(error));
        }
        self.transition(LifecycleEvent::Start);
        self.provision_control_points();
        if self.config.debug {
            self.dump_config();
        }

        let result = self.connect().await;
        if result.is_err() {
            self.transition(LifecycleEvent::StartFailed);
            return self.report("start", result);
        }

        self.set_configuration().await;
        self.transition(LifecycleEvent::Started);
        self.host.ok(&format!(
            "LCD 20x4 {} ready on {}:{}",
            self.config.uid.trim(),
            self.config.address.trim(),
            self.config.port
        ));
        Ok(())
    }

    async fn connect(&self) -> Result<(), BridgeError> {
        self.config.validate()?;
        self.session.connect(&self.config.endpoint()).await?;
        Ok(())
    }

    /// Create any control point the host does not have yet
    fn provision_control_points(&self) {
        for point in ControlPoint::ALL {
            if !self.host.control_point_exists(point) {
                self.host
                    .create_control_point(point, point.default_state());
                log::info!("created control point {} (unit {})", point, point.unit());
            }
        }
    }

    fn dump_config(&self) {
        for (name, value) in self.config.parameters() {
            self.host
                .debug(&format!("Parameter '{}': '{}'", name, value));
        }
        for point in ControlPoint::ALL {
            let value = if point.is_switch() {
                match self.host.switch_state(point) {
                    Some(true) => "On".to_string(),
                    Some(false) => "Off".to_string(),
                    None => "-".to_string(),
                }
            } else {
                self.host.text_value(point).unwrap_or_default()
            };
            self.host.debug(&format!(
                "Device {} '{}': '{}'",
                point.unit(),
                point,
                value
            ));
        }
    }

    /// Apply the persisted switch states, load glyphs, register callbacks
    async fn set_configuration(&self) {
        let state = |point: ControlPoint| {
            self.host
                .switch_state(point)
                .unwrap_or_else(|| point.default_state())
        };
        let backlight = state(ControlPoint::Backlight);
        let cursor = state(ControlPoint::Cursor);
        let blinking = state(ControlPoint::Blinking);

        let result = self.session.set_backlight(backlight, &self.host).await;
        let _ = self.report("set_configuration", result.map_err(BridgeError::from));
        let result = self.session.set_cursor_visible(cursor, &self.host).await;
        let _ = self.report("set_configuration", result.map_err(BridgeError::from));
        let result = self.session.set_cursor_blinking(blinking, &self.host).await;
        let _ = self.report("set_configuration", result.map_err(BridgeError::from));

        let report = load_glyphs(&self.session, &self.config.glyph_source(), &self.host).await;
        log::info!("{} custom characters loaded", report.loaded);

        self.session
            .register_button_handler(self.relay.handler())
            .await;
    }

    /// Stop the bridge, closing the connection if it is open
    pub async fn stop(&mut self) -> Result<(), BridgeError> {
        self.transition(LifecycleEvent::Stop);
        let result = self.session.disconnect().await;
        self.transition(LifecycleEvent::ShutdownComplete);
        match self.report("stop", result.map_err(BridgeError::from))? {
            true => self.host.ok("LCD 20x4 disconnected"),
            false => log::debug!("stop: no open connection"),
        }
        Ok(())
    }

    /// Host lost its side of the connection
    pub async fn on_disconnect(&mut self) -> Result<(), BridgeError> {
        self.stop().await
    }

    /// Switch command from the host (`On` / `Off`)
    pub async fn on_command(&self, unit: u8, command: &str) -> Result<(), BridgeError> {
        let result = self.dispatch_command(unit, command).await;
        self.report("on_command", result)
    }

    async fn dispatch_command(&self, unit: u8, command: &str) -> Result<(), BridgeError> {
        let point = ControlPoint::from_unit(unit)?;
        let on = parse_switch_command(command)?;
        self.host
            .debug(&format!("on_command: {} -> {}", point, command));

        match point {
            ControlPoint::Backlight => self.session.set_backlight(on, &self.host).await?,
            ControlPoint::Cursor => self.session.set_cursor_visible(on, &self.host).await?,
            ControlPoint::Blinking => self.session.set_cursor_blinking(on, &self.host).await?,
            ControlPoint::Json | ControlPoint::Button(_) => {
                return Err(ValidationError::NotASwitch(point).into());
            }
        }
        Ok(())
    }

    /// New text on the JSON control point
    ///
    /// Returns the number of directives written.
    pub async fn on_text_update(&self, text: &str) -> Result<usize, BridgeError> {
        let result = self.write_lines(text).await;
        self.report("write_lines", result)
    }

    async fn write_lines(&self, text: &str) -> Result<usize, BridgeError> {
        let directives = parse_batch(text).map_err(SessionError::from)?;
        Ok(self.session.execute_batch(&directives, &self.host).await?)
    }

    /// A control point was modified on the host side
    ///
    /// Only the JSON control point reacts; its text is read from the host.
    pub async fn on_device_modified(&self, unit: u8) -> Result<(), BridgeError> {
        let point = match ControlPoint::from_unit(unit) {
            Ok(point) => point,
            Err(error) => return self.report("on_device_modified", Err(error.into())),
        };
        if point != ControlPoint::Json {
            log::debug!("ignoring modification of {}", point);
            return Ok(());
        }
        let text = self.host.text_value(point).unwrap_or_default();
        self.on_text_update(&text).await.map(|_| ())
    }

    /// Forward button edges as they arrive
    ///
    /// Runs alongside the command handlers; it never takes the session lock.
    pub async fn run_relay(&self) {
        self.relay.run(&self.host).await
    }
}
