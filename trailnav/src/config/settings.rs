//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;
use std::time::Duration;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Real location source settings
    pub location: LocationSettings,
    /// Trail path simulator settings
    pub simulator: SimulatorSettings,
    /// Track recording settings
    pub recording: RecordingSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Location source configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSettings {
    /// UDP port the GPS receiver listens on.
    pub udp_port: u16,
    /// Age in seconds after which the last fix is considered stale.
    pub stale_after_secs: u64,
    /// Interval in seconds for the periodic location logger.
    pub log_interval_secs: u64,
}

impl LocationSettings {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn log_interval(&self) -> Duration {
        Duration::from_secs(self.log_interval_secs)
    }
}

/// Simulator configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorSettings {
    /// Simulated speed in meters per second.
    pub speed_mps: f64,
    /// Interval between simulated fixes in milliseconds.
    pub report_interval_ms: u64,
}

impl SimulatorSettings {
    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }
}

/// Recording configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSettings {
    /// Directory where track logs are written.
    pub directory: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path.
    pub file: PathBuf,
}
