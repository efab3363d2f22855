//! Camera rig configuration.
//!
//! A rig file maps a camera key to the serial number of the physical
//! device and the exposure and gain it should run with:
//!
//! ```json
//! {
//!     "topCamera":  { "serial": "DA0123456", "exposure": "20000", "gain": "5" },
//!     "leftCamera": { "serial": "DA0123457", "exposure": "15000", "gain": "0" }
//! }
//! ```
//!
//! Values may be strings or numbers. Files ending in `.toml` are read as
//! TOML tables of the same shape.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::btree_map::{self, BTreeMap};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Settings for one camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    /// Serial number of the physical device.
    #[serde(deserialize_with = "string_or_number")]
    pub serial: String,
    /// Exposure time in microseconds.
    #[serde(deserialize_with = "float_or_string")]
    pub exposure: f32,
    /// Analog gain in dB.
    #[serde(deserialize_with = "float_or_string")]
    pub gain: f32,
}

impl CameraSettings {
    /// Creates settings for `serial`.
    pub fn new(serial: impl Into<String>, exposure: f32, gain: f32) -> Self {
        Self {
            serial: serial.into(),
            exposure,
            gain,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Float(f64),
    Text(String),
}

fn float_or_string<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    match Scalar::deserialize(deserializer)? {
        Scalar::Float(value) => Ok(value as f32),
        Scalar::Text(text) => text
            .trim()
            .parse::<f32>()
            .map_err(|e| serde::de::Error::custom(format!("invalid number {text:?}: {e}"))),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Serial {
        Integer(u64),
        Text(String),
    }

    Ok(match Serial::deserialize(deserializer)? {
        Serial::Integer(n) => n.to_string(),
        Serial::Text(text) => text,
    })
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Wrong config path {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
    #[error("config file lists no cameras")]
    Empty,
    #[error("camera {key:?}: invalid {field}: {reason}")]
    InvalidValue {
        key: String,
        field: &'static str,
        reason: String,
    },
    #[error("serial number {serial} is configured for both {first:?} and {second:?}")]
    DuplicateSerial {
        serial: String,
        first: String,
        second: String,
    },
}

/// Which parser to use for a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Picks the format from the file extension; anything but `.toml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// All cameras in the rig, keyed by camera name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RigConfig {
    cameras: BTreeMap<String, CameraSettings>,
}

impl RigConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a camera.
    pub fn with_camera(mut self, key: impl Into<String>, settings: CameraSettings) -> Self {
        self.insert(key, settings);
        self
    }

    /// Adds or replaces a camera.
    pub fn insert(&mut self, key: impl Into<String>, settings: CameraSettings) {
        self.cameras.insert(key.into(), settings);
    }

    /// Loads and validates a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config = Self::parse(&content, ConfigFormat::from_path(path))?;
        tracing::debug!(path = %path.display(), cameras = config.len(), "Loaded rig config");
        Ok(config)
    }

    /// Parses and validates configuration text.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let config: RigConfig = match format {
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?
            }
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configured values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cameras.is_empty() {
            return Err(ConfigError::Empty);
        }

        let mut seen: HashMap<&str, &str> = HashMap::new();
        for (key, settings) in &self.cameras {
            let invalid = |field, reason: &str| ConfigError::InvalidValue {
                key: key.clone(),
                field,
                reason: reason.to_string(),
            };
            if settings.serial.trim().is_empty() {
                return Err(invalid("serial", "must not be empty"));
            }
            if !settings.exposure.is_finite() || settings.exposure <= 0.0 {
                return Err(invalid("exposure", "must be a positive number of microseconds"));
            }
            if !settings.gain.is_finite() || settings.gain < 0.0 {
                return Err(invalid("gain", "must not be negative"));
            }
            if let Some(first) = seen.insert(settings.serial.as_str(), key.as_str()) {
                return Err(ConfigError::DuplicateSerial {
                    serial: settings.serial.clone(),
                    first: first.to_string(),
                    second: key.clone(),
                });
            }
        }
        Ok(())
    }

    /// Number of configured cameras.
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    /// Returns true if no cameras are configured.
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Settings for `key`.
    pub fn get(&self, key: &str) -> Option<&CameraSettings> {
        self.cameras.get(key)
    }

    /// Returns true if `key` is configured.
    pub fn contains_key(&self, key: &str) -> bool {
        self.cameras.contains_key(key)
    }

    /// Camera keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cameras.keys().map(String::as_str)
    }

    /// Iterates `(key, settings)` pairs in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, CameraSettings> {
        self.cameras.iter()
    }

    /// The camera key configured for `serial`.
    pub fn key_for_serial(&self, serial: &str) -> Option<&str> {
        self.cameras
            .iter()
            .find(|(_, settings)| settings.serial == serial)
            .map(|(key, _)| key.as_str())
    }
}

impl<'a> IntoIterator for &'a RigConfig {
    type Item = (&'a String, &'a CameraSettings);
    type IntoIter = btree_map::Iter<'a, String, CameraSettings>;

    fn into_iter(self) -> Self::IntoIter {
        self.cameras.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"{
        "topCamera":   { "serial": "DA0001", "exposure": "20000", "gain": "5" },
        "leftCamera":  { "serial": "DA0002", "exposure": "15000.5", "gain": "0" },
        "rightCamera": { "serial": 3, "exposure": 15000, "gain": 1.5 }
    }"#;

    #[test]
    fn test_parse_string_and_number_values() {
        let config = RigConfig::parse(EXAMPLE, ConfigFormat::Json).unwrap();
        assert_eq!(config.len(), 3);
        assert_eq!(
            config.get("topCamera"),
            Some(&CameraSettings::new("DA0001", 20000.0, 5.0))
        );
        assert_eq!(config.get("leftCamera").unwrap().exposure, 15000.5);
        assert_eq!(config.get("rightCamera").unwrap().serial, "3");
        assert_eq!(config.key_for_serial("DA0002"), Some("leftCamera"));
        assert_eq!(config.key_for_serial("nope"), None);
    }

    #[test]
    fn test_parse_toml() {
        let text = r#"
            [topCamera]
            serial = "DA0001"
            exposure = 20000
            gain = "2.5"
        "#;
        let config = RigConfig::parse(text, ConfigFormat::Toml).unwrap();
        assert_eq!(config.get("topCamera").unwrap().gain, 2.5);
    }

    #[test]
    fn test_bad_number_rejected() {
        let text = r#"{ "cam": { "serial": "A", "exposure": "fast", "gain": "0" } }"#;
        assert!(matches!(
            RigConfig::parse(text, ConfigFormat::Json),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_field_rejected() {
        let text = r#"{ "cam": { "serial": "A", "exposure": "100" } }"#;
        assert!(matches!(
            RigConfig::parse(text, ConfigFormat::Json),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_duplicate_serial_rejected() {
        let config = RigConfig::new()
            .with_camera("a", CameraSettings::new("S1", 100.0, 0.0))
            .with_camera("b", CameraSettings::new("S1", 100.0, 0.0));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateSerial { ref first, ref second, .. })
                if first == "a" && second == "b"
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero_exposure = RigConfig::new().with_camera("a", CameraSettings::new("S1", 0.0, 0.0));
        assert!(matches!(
            zero_exposure.validate(),
            Err(ConfigError::InvalidValue { field: "exposure", .. })
        ));

        let negative_gain = RigConfig::new().with_camera("a", CameraSettings::new("S1", 10.0, -1.0));
        assert!(matches!(
            negative_gain.validate(),
            Err(ConfigError::InvalidValue { field: "gain", .. })
        ));

        assert_eq!(RigConfig::new().validate(), Err(ConfigError::Empty));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert_eq!(
            RigConfig::from_file(&path),
            Err(ConfigError::NotFound(path.clone()))
        );
    }

    #[test]
    fn test_from_file_picks_format() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("rig.json");
        std::fs::write(&json, EXAMPLE).unwrap();
        assert_eq!(RigConfig::from_file(&json).unwrap().len(), 3);

        let toml_path = dir.path().join("rig.toml");
        std::fs::write(&toml_path, "[cam]\nserial = \"X\"\nexposure = 1\ngain = 0\n").unwrap();
        assert_eq!(RigConfig::from_file(&toml_path).unwrap().len(), 1);
    }
}
