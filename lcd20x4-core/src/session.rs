//! Display session
//!
//! Owns the single connection to the peripheral and the last applied
//! [`DisplayConfig`]. Every peripheral command goes through one async mutex,
//! so a cursor/blink read-modify-write can never interleave with a line write
//! issued from elsewhere.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use lcd20x4_display::{ButtonHandler, CursorConfig, Endpoint, Lcd20x4, Lcd20x4Ext, LinkError};
use lcd20x4_protocol::{ClearMode, GlyphDefinition, LineDirective};

use crate::error::{ConfigurationError, ConnectionError, SessionError};
use crate::host::{ControlPoint, HostPlatform};

/// Last applied backlight/cursor/blink settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayConfig {
    pub backlight: bool,
    pub cursor: bool,
    pub blinking: bool,
}

struct Link<L> {
    lcd: L,
    config: DisplayConfig,
}

impl<L: Lcd20x4> Link<L> {
    fn ensure_connected(&self) -> Result<(), SessionError> {
        if self.lcd.is_connected() {
            Ok(())
        } else {
            Err(ConnectionError::NotConnected.into())
        }
    }

    /// Convert a peripheral result, dropping the connection on fatal errors
    fn check<T>(&mut self, result: Result<T, LinkError>) -> Result<T, SessionError> {
        result.map_err(|error| {
            if error.is_fatal() && self.lcd.is_connected() {
                log::warn!("{}, closing link", error);
                if let Err(close) = self.lcd.disconnect() {
                    log::debug!("closing link after {} failed: {}", error, close);
                }
            }
            SessionError::from(error)
        })
    }
}

/// The one session with the peripheral
pub struct DisplaySession<L> {
    link: Mutex<CriticalSectionRawMutex, Link<L>>,
}

impl<L: Lcd20x4> DisplaySession<L> {
    pub fn new(lcd: L) -> Self {
        Self {
            link: Mutex::new(Link {
                lcd,
                config: DisplayConfig::default(),
            }),
        }
    }

    /// Open the connection
    ///
    /// An empty UID is rejected before any connection attempt. Connecting an
    /// already connected session does nothing.
    pub async fn connect(&self, endpoint: &Endpoint) -> Result<(), SessionError> {
        if endpoint.uid.trim().is_empty() {
            return Err(ConfigurationError::MissingUid.into());
        }
        if endpoint.host.trim().is_empty() {
            return Err(ConfigurationError::MissingAddress.into());
        }
        if endpoint.port == 0 {
            return Err(ConfigurationError::InvalidPort.into());
        }

        let mut link = self.link.lock().await;
        if link.lcd.is_connected() {
            log::debug!("already connected to {}:{}", endpoint.host, endpoint.port);
            return Ok(());
        }
        link.lcd.connect(endpoint).map_err(|source| {
            SessionError::from(ConnectionError::Failed {
                host: endpoint.host.clone(),
                port: endpoint.port,
                source,
            })
        })?;
        log::info!("connected to {}:{} uid {}", endpoint.host, endpoint.port, endpoint.uid);
        Ok(())
    }

    /// Close the connection
    ///
    /// Returns whether a connection was open. Safe to call repeatedly.
    pub async fn disconnect(&self) -> Result<bool, SessionError> {
        let mut link = self.link.lock().await;
        if !link.lcd.is_connected() {
            return Ok(false);
        }
        match link.lcd.disconnect() {
            Ok(()) | Err(LinkError::NotConnected) => {
                log::info!("disconnected");
                Ok(true)
            }
            Err(error) => Err(SessionError::Io(error)),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.link.lock().await.lcd.is_connected()
    }

    /// Last applied configuration
    pub async fn config(&self) -> DisplayConfig {
        self.link.lock().await.config
    }

    /// Switch the backlight and publish the new state
    pub async fn set_backlight<H>(&self, on: bool, host: &H) -> Result<(), SessionError>
    where
        H: HostPlatform + ?Sized,
    {
        {
            let mut link = self.link.lock().await;
            link.ensure_connected()?;
            let result = link.lcd.set_backlight(on);
            link.check(result)?;
            link.config.backlight = on;
        }
        host.update_switch(ControlPoint::Backlight, on);
        Ok(())
    }

    /// Show or hide the cursor, keeping the blink setting
    pub async fn set_cursor_visible<H>(&self, on: bool, host: &H) -> Result<(), SessionError>
    where
        H: HostPlatform + ?Sized,
    {
        self.update_cursor_config(|config| config.cursor = on).await?;
        host.update_switch(ControlPoint::Cursor, on);
        Ok(())
    }

    /// Start or stop blinking, keeping the cursor setting
    pub async fn set_cursor_blinking<H>(&self, on: bool, host: &H) -> Result<(), SessionError>
    where
        H: HostPlatform + ?Sized,
    {
        self.update_cursor_config(|config| config.blinking = on).await?;
        host.update_switch(ControlPoint::Blinking, on);
        Ok(())
    }

    /// Read-modify-write of the combined cursor configuration, under one lock
    async fn update_cursor_config(
        &self,
        modify: impl FnOnce(&mut CursorConfig),
    ) -> Result<(), SessionError> {
        let mut link = self.link.lock().await;
        link.ensure_connected()?;

        let result = link.lcd.get_config();
        let mut config = link.check(result)?;
        modify(&mut config);
        let result = link.lcd.set_config(config);
        link.check(result)?;

        link.config.cursor = config.cursor;
        link.config.blinking = config.blinking;
        Ok(())
    }

    /// Write a batch of directives in order
    ///
    /// Each write logs one OK line. The first invalid directive or failed
    /// command stops the batch; directives already written stay on the
    /// display. Returns the number of directives written.
    pub async fn execute_batch<H>(
        &self,
        directives: &[LineDirective],
        host: &H,
    ) -> Result<usize, SessionError>
    where
        H: HostPlatform + ?Sized,
    {
        let mut link = self.link.lock().await;
        link.ensure_connected()?;

        for (written, directive) in directives.iter().enumerate() {
            let (line, position) = match directive.cell() {
                Ok(cell) => cell,
                Err(error) => {
                    log::debug!("batch stopped after {} of {} directives", written, directives.len());
                    return Err(error.into());
                }
            };
            if let Some(code) = directive.unknown_clear_code() {
                host.debug(&format!("write_lines: unknown clear value {}, not clearing", code));
            }

            match directive.clear {
                ClearMode::None => {}
                ClearMode::Line => {
                    let result = link.lcd.clear_line(line);
                    link.check(result)?;
                }
                ClearMode::Display => {
                    let result = link.lcd.clear_display();
                    link.check(result)?;
                }
            }

            let result = link.lcd.write_line(line, position, &directive.text);
            link.check(result)?;
            host.ok(&format!(
                "write_lines: Line={},Position={},Text={}",
                line, position, directive.text
            ));
        }
        Ok(directives.len())
    }

    /// Program one custom character slot
    pub async fn set_custom_character(&self, glyph: &GlyphDefinition) -> Result<(), SessionError> {
        let mut link = self.link.lock().await;
        link.ensure_connected()?;
        let result = link.lcd.set_custom_character(glyph.id, &glyph.pattern);
        link.check(result)
    }

    /// Hand the button callback to the peripheral
    pub async fn register_button_handler(&self, handler: ButtonHandler) {
        self.link.lock().await.lcd.register_button_handler(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ValidationError};
    use crate::host::testing::RecordingHost;
    use embassy_futures::block_on;
    use lcd20x4_display::SimulatedLcd;
    use lcd20x4_protocol::{parse_batch, LcdCommand, RangeError};
    use proptest::prelude::*;

    fn endpoint() -> Endpoint {
        Endpoint {
            host: "127.0.0.1".into(),
            port: 4223,
            uid: "BHN".into(),
        }
    }

    fn connected() -> (DisplaySession<SimulatedLcd>, SimulatedLcd) {
        let lcd = SimulatedLcd::new();
        let session = DisplaySession::new(lcd.clone());
        block_on(session.connect(&endpoint())).unwrap();
        (session, lcd)
    }

    fn write(line: u8, position: u8, text: &str) -> LcdCommand {
        LcdCommand::WriteLine {
            line,
            position,
            text: text.into(),
        }
    }

    #[test]
    fn test_connect_requires_uid() {
        let lcd = SimulatedLcd::new();
        let session = DisplaySession::new(lcd.clone());
        let endpoint = Endpoint {
            uid: "  ".into(),
            ..endpoint()
        };

        let err = block_on(session.connect(&endpoint)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(lcd.endpoint().is_none());
    }

    #[test]
    fn test_connect_failure() {
        let lcd = SimulatedLcd::new();
        lcd.refuse_connections(true);
        let session = DisplaySession::new(lcd);

        let err = block_on(session.connect(&endpoint())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(!block_on(session.is_connected()));
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let (session, lcd) = connected();
        assert!(block_on(session.disconnect()).unwrap());
        assert!(!block_on(session.disconnect()).unwrap());
        assert!(!lcd.is_connected());
    }

    #[test]
    fn test_valid_batch_writes_in_order() {
        let (session, lcd) = connected();
        let host = RecordingHost::new();
        let batch = parse_batch(
            r#"[{"line":0,"position":0,"clear":0,"text":"one"},
                {"line":3,"position":4,"clear":0,"text":"two"},
                {"line":1,"position":19,"clear":0,"text":"three"}]"#,
        )
        .unwrap();

        assert_eq!(block_on(session.execute_batch(&batch, &host)).unwrap(), 3);
        assert_eq!(
            lcd.content_commands(),
            [write(0, 0, "one"), write(3, 4, "two"), write(1, 19, "three")]
        );
        assert_eq!(
            host.oks(),
            [
                "write_lines: Line=0,Position=0,Text=one",
                "write_lines: Line=3,Position=4,Text=two",
                "write_lines: Line=1,Position=19,Text=three",
            ]
        );
        assert!(host.errors().is_empty());
    }

    #[test]
    fn test_out_of_range_directive_stops_batch() {
        let (session, lcd) = connected();
        let host = RecordingHost::new();
        let batch = vec![
            LineDirective::new(0, 0, ClearMode::None, "a"),
            LineDirective::new(1, 0, ClearMode::None, "b"),
            LineDirective::new(4, 0, ClearMode::None, "c"),
            LineDirective::new(2, 0, ClearMode::None, "d"),
        ];

        let err = block_on(session.execute_batch(&batch, &host)).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Validation(ValidationError::Directive(RangeError::Line(4)))
        ));
        assert_eq!(lcd.content_commands(), [write(0, 0, "a"), write(1, 0, "b")]);
        assert_eq!(host.oks().len(), 2);
    }

    #[test]
    fn test_position_out_of_range() {
        let (session, lcd) = connected();
        let host = RecordingHost::new();
        let batch = vec![LineDirective::new(0, 20, ClearMode::Line, "x")];

        let err = block_on(session.execute_batch(&batch, &host)).unwrap_err();
        assert_eq!(err.to_string(), "wrong position number: 20, ensure 0-19");
        // Validation happens before the clear
        assert!(lcd.content_commands().is_empty());
    }

    #[test]
    fn test_clear_modes() {
        let (session, lcd) = connected();
        let host = RecordingHost::new();
        let batch = vec![
            LineDirective::new(1, 5, ClearMode::Line, "Hi"),
            LineDirective::new(2, 0, ClearMode::Display, "Yo"),
            LineDirective::new(3, 0, ClearMode::None, "No"),
        ];

        block_on(session.execute_batch(&batch, &host)).unwrap();
        assert_eq!(
            lcd.content_commands(),
            [
                write(1, 0, &" ".repeat(20)),
                write(1, 5, "Hi"),
                LcdCommand::ClearDisplay,
                write(2, 0, "Yo"),
                write(3, 0, "No"),
            ]
        );
        let screen = lcd.screen();
        assert!(screen.is_blank_line(1));
        assert_eq!(screen.line(2).unwrap().trim_end(), "Yo");
    }

    #[test]
    fn test_unknown_clear_value_does_not_clear() {
        let (session, lcd) = connected();
        let host = RecordingHost::new();
        let batch = parse_batch(r#"[{"line":0,"position":0,"clear":7,"text":"x"}]"#).unwrap();

        block_on(session.execute_batch(&batch, &host)).unwrap();
        assert_eq!(lcd.content_commands(), [write(0, 0, "x")]);
        assert_eq!(host.logs_at(crate::host::LogLevel::Debug).len(), 1);
    }

    #[test]
    fn test_batch_while_disconnected() {
        let lcd = SimulatedLcd::new();
        let session = DisplaySession::new(lcd.clone());
        let host = RecordingHost::new();
        let batch = parse_batch(r#"[{"line":1,"position":5,"clear":1,"text":"Hi"}]"#).unwrap();

        let err = block_on(session.execute_batch(&batch, &host)).unwrap_err();
        assert!(err.to_string().contains("not connected"));
        assert!(lcd.commands().is_empty());
        assert!(host.oks().is_empty());
    }

    #[test]
    fn test_write_failure_halts_batch() {
        let (session, lcd) = connected();
        let host = RecordingHost::new();
        lcd.inject_fault(1, LinkError::Timeout);
        let batch = vec![
            LineDirective::new(0, 0, ClearMode::None, "a"),
            LineDirective::new(1, 0, ClearMode::None, "b"),
            LineDirective::new(2, 0, ClearMode::None, "c"),
        ];

        let err = block_on(session.execute_batch(&batch, &host)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(lcd.content_commands(), [write(0, 0, "a")]);
        assert!(block_on(session.is_connected()));
    }

    #[test]
    fn test_connection_loss_disconnects() {
        let (session, lcd) = connected();
        let host = RecordingHost::new();
        lcd.inject_fault(0, LinkError::ConnectionLost);

        assert!(block_on(session.set_backlight(true, &host)).is_err());
        assert!(!block_on(session.is_connected()));

        let err = block_on(session.set_backlight(true, &host)).unwrap_err();
        assert!(err.to_string().contains("not connected"));
        assert!(host.updates().is_empty());
    }

    #[test]
    fn test_failed_close_keeps_original_error() {
        let (session, lcd) = connected();
        let host = RecordingHost::new();
        lcd.inject_fault(0, LinkError::ConnectionLost);
        lcd.fail_next_disconnect(LinkError::Timeout);

        let err = block_on(session.set_backlight(false, &host)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("connection lost"));
        assert!(host.errors().is_empty());

        // The close failed, so the next fatal error tries again
        lcd.inject_fault(0, LinkError::ConnectionLost);
        assert!(block_on(session.set_backlight(false, &host)).is_err());
        assert!(!block_on(session.is_connected()));
    }

    #[test]
    fn test_backlight_updates_host() {
        let (session, lcd) = connected();
        let host = RecordingHost::new();

        block_on(session.set_backlight(true, &host)).unwrap();
        block_on(session.set_backlight(false, &host)).unwrap();
        assert!(!lcd.backlight());
        assert!(!block_on(session.config()).backlight);
        assert_eq!(
            host.updates(),
            [(ControlPoint::Backlight, true), (ControlPoint::Backlight, false)]
        );
    }

    #[test]
    fn test_backlight_failure_keeps_state() {
        let (session, lcd) = connected();
        let host = RecordingHost::new();
        lcd.inject_fault(0, LinkError::Timeout);

        assert!(block_on(session.set_backlight(true, &host)).is_err());
        assert!(!block_on(session.config()).backlight);
        assert!(host.updates().is_empty());
    }

    #[test]
    fn test_cursor_and_blinking_are_independent() {
        let (session, lcd) = connected();
        let host = RecordingHost::new();

        block_on(session.set_cursor_blinking(true, &host)).unwrap();
        block_on(session.set_cursor_visible(true, &host)).unwrap();
        assert_eq!(
            lcd.cursor_config(),
            CursorConfig {
                cursor: true,
                blinking: true
            }
        );

        block_on(session.set_cursor_visible(false, &host)).unwrap();
        assert_eq!(
            lcd.cursor_config(),
            CursorConfig {
                cursor: false,
                blinking: true
            }
        );
        assert_eq!(
            lcd.commands()[lcd.commands().len() - 2..],
            [
                LcdCommand::GetConfig,
                LcdCommand::SetConfig {
                    cursor: false,
                    blinking: true
                }
            ]
        );
        assert_eq!(host.updates().last(), Some(&(ControlPoint::Cursor, false)));
    }

    #[test]
    fn test_custom_character() {
        let (session, lcd) = connected();
        let glyph = GlyphDefinition {
            id: 2,
            name: "bell".into(),
            pattern: [4, 14, 14, 14, 31, 0, 4, 0],
        };
        block_on(session.set_custom_character(&glyph)).unwrap();
        assert_eq!(lcd.glyph(2), Some([4, 14, 14, 14, 31, 0, 4, 0]));
    }

    proptest! {
        #[test]
        fn prop_batch_applies_prefix(lines in prop::collection::vec(0i64..6, 1..12)) {
            let (session, lcd) = connected();
            let host = RecordingHost::new();
            let batch: Vec<_> = lines
                .iter()
                .map(|&line| LineDirective::new(line, 0, ClearMode::None, "x"))
                .collect();

            let valid = lines.iter().take_while(|&&l| l < 4).count();
            let result = block_on(session.execute_batch(&batch, &host));

            prop_assert_eq!(result.is_ok(), valid == lines.len());
            prop_assert_eq!(lcd.content_commands().len(), valid);
            prop_assert_eq!(host.oks().len(), valid);
        }

        #[test]
        fn prop_toggles_preserve_other_flag(toggles in prop::collection::vec((any::<bool>(), any::<bool>()), 1..10)) {
            let (session, lcd) = connected();
            let host = RecordingHost::new();
            let mut expected = CursorConfig::default();

            for (is_cursor, on) in toggles {
                if is_cursor {
                    block_on(session.set_cursor_visible(on, &host)).unwrap();
                    expected.cursor = on;
                } else {
                    block_on(session.set_cursor_blinking(on, &host)).unwrap();
                    expected.blinking = on;
                }
                prop_assert_eq!(lcd.cursor_config(), expected);
            }
        }
    }
}
