//! Bridge configuration
//!
//! Session parameters are read from TOML. Every key is optional; missing keys
//! take the defaults of the brick daemon (`127.0.0.1:4223`). The UID has no
//! default and is checked when the bridge starts, not when the file is read.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lcd20x4_core::{ConfigurationError, GlyphSource};
use lcd20x4_display::Endpoint;
use serde::Deserialize;
use thiserror::Error;

/// Default configuration, compiled in
pub const DEFAULT_CONFIG: &str = include_str!("../bridge.toml");

pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4223;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("configuration error: {0}")]
    Invalid(#[from] ConfigurationError),
}

/// Session parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Host running the brick daemon
    pub address: String,
    pub port: u16,
    /// Bricklet UID
    pub uid: String,
    /// Dump parameters and control point states on start
    pub debug: bool,
    /// Custom character table
    pub glyph_file: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.into(),
            port: DEFAULT_PORT,
            uid: String::new(),
            debug: false,
            glyph_file: None,
        }
    }
}

impl BridgeConfig {
    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    ///
    /// A relative `glyph_file` is resolved against the directory of the
    /// configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;

        if let (Some(glyphs), Some(dir)) = (&config.glyph_file, path.parent()) {
            if glyphs.is_relative() {
                config.glyph_file = Some(dir.join(glyphs));
            }
        }
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Check the parameters needed to connect
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.uid.trim().is_empty() {
            return Err(ConfigurationError::MissingUid.into());
        }
        if self.address.trim().is_empty() {
            return Err(ConfigurationError::MissingAddress.into());
        }
        if self.port == 0 {
            return Err(ConfigurationError::InvalidPort.into());
        }
        Ok(())
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            host: self.address.trim().into(),
            port: self.port,
            uid: self.uid.trim().into(),
        }
    }

    pub fn glyph_source(&self) -> GlyphSource {
        match &self.glyph_file {
            Some(path) => GlyphSource::File(path.clone()),
            None => GlyphSource::Missing,
        }
    }

    /// Non-empty parameters as name/value pairs
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        let mut parameters = vec![
            ("address", self.address.clone()),
            ("port", self.port.to_string()),
            ("uid", self.uid.clone()),
            ("debug", self.debug.to_string()),
        ];
        if let Some(path) = &self.glyph_file {
            parameters.push(("glyph_file", path.display().to_string()));
        }
        parameters.retain(|(_, value)| !value.trim().is_empty());
        parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::from_toml("").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.address, "127.0.0.1");
        assert_eq!(config.port, 4223);
        assert_eq!(config.glyph_source(), GlyphSource::Missing);
    }

    #[test]
    fn test_embedded_default_config() {
        let config = BridgeConfig::from_toml(DEFAULT_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert!(config.glyph_file.is_some());
    }

    #[test]
    fn test_full_config() {
        let config = BridgeConfig::from_toml(
            r#"
            address = "10.0.0.5"
            port = 4280
            uid = " BHN "
            debug = true
            glyph_file = "/etc/lcd/glyphs.json"
            "#,
        )
        .unwrap();

        let endpoint = config.endpoint();
        assert_eq!(endpoint.host, "10.0.0.5");
        assert_eq!(endpoint.port, 4280);
        assert_eq!(endpoint.uid, "BHN");
        assert!(config.debug);
        assert_eq!(
            config.glyph_source(),
            GlyphSource::File(PathBuf::from("/etc/lcd/glyphs.json"))
        );
    }

    #[test]
    fn test_missing_uid_rejected() {
        let config = BridgeConfig::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(ConfigurationError::MissingUid)
        ));
        assert!(err.to_string().contains("Brick Viewer"));
    }

    #[test]
    fn test_port_zero_rejected() {
        let config = BridgeConfig {
            uid: "BHN".into(),
            port: 0,
            ..BridgeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ConfigurationError::InvalidPort))
        ));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            BridgeConfig::from_toml("port = \"abc\""),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            BridgeConfig::from_toml("colour = 1"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_unreadable_file() {
        let err = BridgeConfig::load(Path::new("/nonexistent/bridge.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_relative_glyph_file() {
        let dir = std::env::temp_dir().join(format!("lcd20x4-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bridge.toml");
        fs::write(&path, "uid = \"BHN\"\nglyph_file = \"glyphs.json\"\n").unwrap();

        let config = BridgeConfig::load(&path).unwrap();
        fs::remove_dir_all(&dir).unwrap();
        assert_eq!(config.glyph_file, Some(dir.join("glyphs.json")));
    }

    #[test]
    fn test_parameters_skip_empty() {
        let config = BridgeConfig::default();
        let names: Vec<_> = config.parameters().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["address", "port", "debug"]);
    }
}
