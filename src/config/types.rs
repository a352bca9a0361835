use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::ContextError;

/// On-disk configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingSection,

    #[serde(default)]
    pub context: ContextConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub file_output: bool,
    pub json_format: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_output: false,
            json_format: false,
            log_dir: None,
        }
    }
}

/// Number of auxiliary effect sends requested from ALC_EXT_EFX.
///
/// Serialized as an integer, where `0` means "use the driver default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AuxiliarySends {
    #[default]
    DriverDefault,
    One,
    Two,
    Three,
    Four,
}

impl AuxiliarySends {
    /// The fixed send count, or `None` for the driver default
    pub fn fixed_count(self) -> Option<i32> {
        match self {
            AuxiliarySends::DriverDefault => None,
            AuxiliarySends::One => Some(1),
            AuxiliarySends::Two => Some(2),
            AuxiliarySends::Three => Some(3),
            AuxiliarySends::Four => Some(4),
        }
    }
}

impl TryFrom<u8> for AuxiliarySends {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(AuxiliarySends::DriverDefault),
            1 => Ok(AuxiliarySends::One),
            2 => Ok(AuxiliarySends::Two),
            3 => Ok(AuxiliarySends::Three),
            4 => Ok(AuxiliarySends::Four),
            other => Err(format!(
                "max_auxiliary_sends must be 0 (driver default) or 1-4, got {}",
                other
            )),
        }
    }
}

impl From<AuxiliarySends> for u8 {
    fn from(sends: AuxiliarySends) -> Self {
        sends.fixed_count().unwrap_or(0) as u8
    }
}

impl fmt::Display for AuxiliarySends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fixed_count() {
            Some(count) => write!(f, "{}", count),
            None => write!(f, "driver default"),
        }
    }
}

/// Source count meaning "let the driver decide"
pub const DRIVER_DEFAULT_SOURCES: i32 = -1;

/// Parameters requested when opening an audio context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Requested playback device; `None` or empty opens the default device
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Mixing frequency in Hz, 0 lets the driver decide
    pub frequency: i32,
    /// Refresh interval in Hz, 0 lets the driver decide
    pub refresh_rate: i32,
    pub synchronous: bool,
    /// Mono source hint, -1 lets the driver decide
    pub mono_sources: i32,
    /// Stereo source hint, -1 lets the driver decide
    pub stereo_sources: i32,
    pub enable_efx: bool,
    pub max_auxiliary_sends: AuxiliarySends,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            device: None,
            frequency: 0,
            refresh_rate: 0,
            synchronous: false,
            mono_sources: DRIVER_DEFAULT_SOURCES,
            stereo_sources: DRIVER_DEFAULT_SOURCES,
            enable_efx: false,
            max_auxiliary_sends: AuxiliarySends::DriverDefault,
        }
    }
}

impl ContextConfig {
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn with_frequency(mut self, frequency: i32) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_refresh_rate(mut self, refresh_rate: i32) -> Self {
        self.refresh_rate = refresh_rate;
        self
    }

    pub fn synchronous(mut self, synchronous: bool) -> Self {
        self.synchronous = synchronous;
        self
    }

    pub fn with_mono_sources(mut self, count: i32) -> Self {
        self.mono_sources = count;
        self
    }

    pub fn with_stereo_sources(mut self, count: i32) -> Self {
        self.stereo_sources = count;
        self
    }

    pub fn with_efx(mut self, max_auxiliary_sends: AuxiliarySends) -> Self {
        self.enable_efx = true;
        self.max_auxiliary_sends = max_auxiliary_sends;
        self
    }

    /// The requested device name, treating an empty string as "none"
    pub fn requested_device(&self) -> Option<&str> {
        self.device.as_deref().filter(|name| !name.is_empty())
    }

    /// Check the numeric parameters before anything touches the driver
    pub fn validate(&self) -> std::result::Result<(), ContextError> {
        if self.frequency < 0 {
            return Err(ContextError::InvalidArgument {
                name: "frequency",
                value: self.frequency,
                reason: "should be zero or greater",
            });
        }
        if self.refresh_rate < 0 {
            return Err(ContextError::InvalidArgument {
                name: "refresh_rate",
                value: self.refresh_rate,
                reason: "should be zero or greater",
            });
        }
        if self.mono_sources < DRIVER_DEFAULT_SOURCES {
            return Err(ContextError::InvalidArgument {
                name: "mono_sources",
                value: self.mono_sources,
                reason: "should be -1 (driver default) or greater",
            });
        }
        if self.stereo_sources < DRIVER_DEFAULT_SOURCES {
            return Err(ContextError::InvalidArgument {
                name: "stereo_sources",
                value: self.stereo_sources,
                reason: "should be -1 (driver default) or greater",
            });
        }
        Ok(())
    }
}

impl Config {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = match config_path {
            Some(path) => PathBuf::from(path),
            None => Self::default_config_path()?,
        };

        debug!("Loading configuration from: {}", path.display());

        if !path.exists() {
            info!("Configuration file not found, creating default configuration");
            return Self::create_default_config(&path);
        }

        let config_content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        Self::from_toml(&config_content)
            .with_context(|| format!("Invalid configuration file: {}", path.display()))
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse configuration")?;
        config
            .context
            .validate()
            .context("Invalid [context] section")?;
        debug!("Configuration parsed successfully");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, config_content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        info!("Configuration saved to: {}", path.display());
        Ok(())
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("audio-context-manager/config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<Self> {
        let config = Config::default();

        // Saving is best effort; an unwritable location still yields defaults
        if let Err(e) = config.save(path) {
            warn!(
                "Could not save default config to {}: {:#}. Using default config.",
                path.display(),
                e
            );
            return Ok(config);
        }

        info!("Created default configuration file: {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_default_context_config_is_valid() {
        let config = ContextConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.requested_device(), None);
        assert_eq!(config.mono_sources, DRIVER_DEFAULT_SOURCES);
    }

    #[test]
    fn test_negative_frequency_rejected() {
        let err = ContextConfig::default()
            .with_frequency(-1)
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_source_count_below_driver_default_rejected() {
        let err = ContextConfig::default()
            .with_mono_sources(-2)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ContextError::InvalidArgument {
                name: "mono_sources",
                value: -2,
                ..
            }
        ));

        let err = ContextConfig::default()
            .with_stereo_sources(-5)
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_empty_device_name_means_default() {
        let config = ContextConfig::default().with_device("");
        assert_eq!(config.requested_device(), None);
    }

    #[test]
    fn test_parse_context_section() {
        let config = Config::from_toml(
            r#"
[logging]
level = "debug"

[context]
device = "OpenAL Soft"
frequency = 48000
synchronous = true
enable_efx = true
max_auxiliary_sends = 3
"#,
        )
        .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.context.device.as_deref(), Some("OpenAL Soft"));
        assert_eq!(config.context.frequency, 48000);
        assert_eq!(config.context.refresh_rate, 0);
        assert!(config.context.synchronous);
        assert_eq!(config.context.max_auxiliary_sends, AuxiliarySends::Three);
        assert_eq!(config.context.stereo_sources, DRIVER_DEFAULT_SOURCES);
    }

    #[test]
    fn test_out_of_range_aux_sends_rejected() {
        let result = Config::from_toml("[context]\nenable_efx = true\nmax_auxiliary_sends = 7\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_numbers_rejected_at_load() {
        let result = Config::from_toml("[context]\nrefresh_rate = -10\n");
        assert!(result.is_err());
    }
}
