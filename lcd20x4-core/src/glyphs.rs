//! Custom glyph loader
//!
//! Programs the glyph table into the peripheral during session configuration.
//! Nothing in here aborts the configuration: a missing table, an empty table
//! or a bad entry each produce one ERROR line and loading carries on.

use std::io;
use std::path::PathBuf;

use lcd20x4_display::Lcd20x4;
use lcd20x4_protocol::parse_glyph_table;
use thiserror::Error;

use crate::host::HostPlatform;
use crate::session::DisplaySession;

/// Where the glyph table comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlyphSource {
    File(PathBuf),
    /// Table text held in memory
    Text(String),
    /// No table configured
    Missing,
}

#[derive(Debug, Error)]
pub enum GlyphSourceError {
    #[error("no glyph file configured")]
    NotConfigured,
    #[error("cannot read glyph file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl GlyphSource {
    /// Read the table text
    pub fn read(&self) -> Result<String, GlyphSourceError> {
        match self {
            GlyphSource::File(path) => {
                std::fs::read_to_string(path).map_err(|source| GlyphSourceError::Unreadable {
                    path: path.display().to_string(),
                    source,
                })
            }
            GlyphSource::Text(text) => Ok(text.clone()),
            GlyphSource::Missing => Err(GlyphSourceError::NotConfigured),
        }
    }
}

/// Outcome of one load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphReport {
    /// Slots programmed
    pub loaded: usize,
    /// Entries skipped because of an error
    pub rejected: usize,
}

/// Load every valid glyph of the table into the peripheral
pub async fn load_glyphs<L, H>(
    session: &DisplaySession<L>,
    source: &GlyphSource,
    host: &H,
) -> GlyphReport
where
    L: Lcd20x4,
    H: HostPlatform + ?Sized,
{
    let mut report = GlyphReport::default();

    let text = match source.read() {
        Ok(text) => text,
        Err(error) => {
            host.error(&format!("Custom Characters: {}", error));
            return report;
        }
    };

    let entries = match parse_glyph_table(&text) {
        Ok(entries) => entries,
        Err(error) => {
            host.error(&format!("Custom Characters: {}", error));
            return report;
        }
    };
    if entries.is_empty() {
        host.error("Custom Characters: no characters defined");
        return report;
    }

    for entry in &entries {
        let glyph = match entry.validate() {
            Ok(glyph) => glyph,
            Err(error) => {
                host.error(&format!("Custom Character {}: {}", entry.name, error));
                report.rejected += 1;
                continue;
            }
        };
        match session.set_custom_character(&glyph).await {
            Ok(()) => {
                host.debug(&format!(
                    "Custom Character {} loaded: id={},pattern={:?},char={:?}",
                    glyph.name,
                    glyph.id,
                    glyph.pattern,
                    glyph.display_char()
                ));
                report.loaded += 1;
            }
            Err(error) => {
                host.error(&format!("Custom Character {}: {}", glyph.name, error));
                report.rejected += 1;
            }
        }
    }

    log::debug!(
        "glyph table: {} loaded, {} rejected",
        report.loaded,
        report.rejected
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::RecordingHost;
    use crate::host::LogLevel;
    use embassy_futures::block_on;
    use lcd20x4_display::{Endpoint, SimulatedLcd};

    fn connected() -> (DisplaySession<SimulatedLcd>, SimulatedLcd) {
        let lcd = SimulatedLcd::new();
        let session = DisplaySession::new(lcd.clone());
        let endpoint = Endpoint {
            host: "127.0.0.1".into(),
            port: 4223,
            uid: "BHN".into(),
        };
        block_on(session.connect(&endpoint)).unwrap();
        (session, lcd)
    }

    fn load(source: GlyphSource) -> (GlyphReport, RecordingHost, SimulatedLcd) {
        let (session, lcd) = connected();
        let host = RecordingHost::new();
        let report = block_on(load_glyphs(&session, &source, &host));
        (report, host, lcd)
    }

    #[test]
    fn test_out_of_range_id_skipped() {
        let table = r#"[
            {"id":9,"name":"nine","char":"1,1,1,1,1,1,1,1"},
            {"id":3,"name":"three","char":"0,10,31,31,14,4,0,0"}
        ]"#;
        let (report, host, lcd) = load(GlyphSource::Text(table.into()));

        assert_eq!(report, GlyphReport { loaded: 1, rejected: 1 });
        assert_eq!(lcd.glyph(3), Some([0, 10, 31, 31, 14, 4, 0, 0]));
        assert_eq!(lcd.commands().len(), 1);
        let errors = host.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("index 9 not in range 0-7"));
        assert_eq!(
            host.logs_at(LogLevel::Debug),
            ["Custom Character three loaded: id=3,pattern=[0, 10, 31, 31, 14, 4, 0, 0],char='\\u{b}'"]
        );
    }

    #[test]
    fn test_invalid_pattern_skipped() {
        let table = r#"[
            {"id":0,"name":"short","char":"1,2,3"},
            {"id":1,"name":"ok","char":"1,2,3,4,5,6,7,8"}
        ]"#;
        let (report, host, lcd) = load(GlyphSource::Text(table.into()));

        assert_eq!(report.loaded, 1);
        assert_eq!(host.errors().len(), 1);
        assert!(lcd.glyph(0).is_none());
    }

    #[test]
    fn test_empty_table() {
        let (report, host, lcd) = load(GlyphSource::Text("[]".into()));
        assert_eq!(report, GlyphReport::default());
        assert_eq!(host.errors(), ["Custom Characters: no characters defined"]);
        assert!(lcd.commands().is_empty());
    }

    #[test]
    fn test_missing_source() {
        let (report, host, _) = load(GlyphSource::Missing);
        assert_eq!(report.loaded, 0);
        assert_eq!(host.errors().len(), 1);
    }

    #[test]
    fn test_unreadable_file() {
        let path = std::env::temp_dir().join("lcd20x4-no-such-glyph-table.json");
        let (report, host, _) = load(GlyphSource::File(path));
        assert_eq!(report.loaded, 0);
        assert!(host.errors()[0].contains("cannot read glyph file"));
    }

    #[test]
    fn test_malformed_table() {
        let (report, host, _) = load(GlyphSource::Text("{not json".into()));
        assert_eq!(report.loaded, 0);
        assert!(host.errors()[0].contains("malformed glyph table"));
    }

    #[test]
    fn test_table_from_file() {
        let path = std::env::temp_dir().join(format!("lcd20x4-glyphs-{}.json", std::process::id()));
        std::fs::write(&path, r#"[{"id":7,"name":"x","char":"31,0,31,0,31,0,31,0"}]"#).unwrap();

        let (report, _, lcd) = load(GlyphSource::File(path.clone()));
        std::fs::remove_file(&path).unwrap();
        assert_eq!(report.loaded, 1);
        assert_eq!(lcd.glyph(7), Some([31, 0, 31, 0, 31, 0, 31, 0]));
    }

    #[test]
    fn test_disconnected_session_rejects_entries() {
        let session = DisplaySession::new(SimulatedLcd::new());
        let host = RecordingHost::new();
        let source = GlyphSource::Text(r#"[{"id":0,"name":"a","char":"0,0,0,0,0,0,0,0"}]"#.into());

        let report = block_on(load_glyphs(&session, &source, &host));
        assert_eq!(report, GlyphReport { loaded: 0, rejected: 1 });
        assert!(host.errors()[0].contains("not connected"));
    }
}
