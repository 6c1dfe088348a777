//! Configuration key access and validation.
//!
//! Type-safe get/set of configuration values by `section.key` name, used by
//! the `config get/set/list` CLI commands.

use std::str::FromStr;
use thiserror::Error;

use super::parser::expand_tilde;
use super::settings::ConfigFile;
use super::writer::path_to_string;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    LocationUdpPort,
    LocationStaleAfterSecs,
    LocationLogIntervalSecs,
    SimulatorSpeedMps,
    SimulatorReportIntervalMs,
    RecordingDirectory,
    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "location.udp_port" => Ok(ConfigKey::LocationUdpPort),
            "location.stale_after_secs" => Ok(ConfigKey::LocationStaleAfterSecs),
            "location.log_interval_secs" => Ok(ConfigKey::LocationLogIntervalSecs),
            "simulator.speed_mps" => Ok(ConfigKey::SimulatorSpeedMps),
            "simulator.report_interval_ms" => Ok(ConfigKey::SimulatorReportIntervalMs),
            "recording.directory" => Ok(ConfigKey::RecordingDirectory),
            "logging.file" => Ok(ConfigKey::LoggingFile),
            _ => Err(ConfigKeyError::UnknownKey(s.to_string())),
        }
    }
}

impl ConfigKey {
    /// All keys in display order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::LocationUdpPort,
            ConfigKey::LocationStaleAfterSecs,
            ConfigKey::LocationLogIntervalSecs,
            ConfigKey::SimulatorSpeedMps,
            ConfigKey::SimulatorReportIntervalMs,
            ConfigKey::RecordingDirectory,
            ConfigKey::LoggingFile,
        ]
    }

    /// Get the canonical key name (e.g., "simulator.speed_mps").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::LocationUdpPort => "location.udp_port",
            ConfigKey::LocationStaleAfterSecs => "location.stale_after_secs",
            ConfigKey::LocationLogIntervalSecs => "location.log_interval_secs",
            ConfigKey::SimulatorSpeedMps => "simulator.speed_mps",
            ConfigKey::SimulatorReportIntervalMs => "simulator.report_interval_ms",
            ConfigKey::RecordingDirectory => "recording.directory",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Get the section name (e.g., "simulator").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within the section (e.g., "speed_mps").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::LocationUdpPort => config.location.udp_port.to_string(),
            ConfigKey::LocationStaleAfterSecs => config.location.stale_after_secs.to_string(),
            ConfigKey::LocationLogIntervalSecs => config.location.log_interval_secs.to_string(),
            ConfigKey::SimulatorSpeedMps => config.simulator.speed_mps.to_string(),
            ConfigKey::SimulatorReportIntervalMs => {
                config.simulator.report_interval_ms.to_string()
            }
            ConfigKey::RecordingDirectory => path_to_string(&config.recording.directory),
            ConfigKey::LoggingFile => path_to_string(&config.logging.file),
        }
    }

    /// Validate and set the value in a config file.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        let value = value.trim();
        match self {
            ConfigKey::LocationUdpPort => {
                let port: u16 = self.parse(value, "must be a port number (1-65535)")?;
                if port == 0 {
                    return Err(self.invalid("port must not be 0"));
                }
                config.location.udp_port = port;
            }
            ConfigKey::LocationStaleAfterSecs => {
                config.location.stale_after_secs =
                    self.parse(value, "must be a positive integer (seconds)")?;
            }
            ConfigKey::LocationLogIntervalSecs => {
                config.location.log_interval_secs =
                    self.parse(value, "must be a positive integer (seconds)")?;
            }
            ConfigKey::SimulatorSpeedMps => {
                let speed: f64 = self.parse(value, "must be a number (m/s)")?;
                if !(speed.is_finite() && speed > 0.0) {
                    return Err(self.invalid("must be greater than 0"));
                }
                config.simulator.speed_mps = speed;
            }
            ConfigKey::SimulatorReportIntervalMs => {
                let interval: u64 =
                    self.parse(value, "must be a positive integer (milliseconds)")?;
                if interval == 0 {
                    return Err(self.invalid("must be greater than 0"));
                }
                config.simulator.report_interval_ms = interval;
            }
            ConfigKey::RecordingDirectory => {
                if value.is_empty() {
                    return Err(self.invalid("must not be empty"));
                }
                config.recording.directory = expand_tilde(value);
            }
            ConfigKey::LoggingFile => {
                if value.is_empty() {
                    return Err(self.invalid("must not be empty"));
                }
                config.logging.file = expand_tilde(value);
            }
        }
        Ok(())
    }

    fn parse<T: FromStr>(&self, value: &str, reason: &str) -> Result<T, ConfigKeyError> {
        value.parse().map_err(|_| self.invalid(reason))
    }

    fn invalid(&self, reason: &str) -> ConfigKeyError {
        ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: reason.to_string(),
        }
    }
}
