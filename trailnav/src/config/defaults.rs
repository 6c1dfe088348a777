//! Default values for all configuration settings.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;

/// Default UDP port for ForeFlight-format GPS datagrams.
pub const DEFAULT_UDP_PORT: u16 = 49002;

/// Default age after which the last fix is considered stale.
pub const DEFAULT_STALE_AFTER_SECS: u64 = 30;

/// Default interval for the periodic location logger.
pub const DEFAULT_LOG_INTERVAL_SECS: u64 = 20;

/// Default simulated driving speed (about 50 km/h).
pub const DEFAULT_SIMULATOR_SPEED_MPS: f64 = 14.0;

/// Default interval between simulated fixes.
pub const DEFAULT_SIMULATOR_INTERVAL_MS: u64 = 1000;

/// Default directory for recorded track logs.
pub fn default_recording_directory() -> PathBuf {
    config_directory().join("trips")
}

/// Default log file path.
pub fn default_log_file() -> PathBuf {
    config_directory().join("trailnav.log")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            location: LocationSettings {
                udp_port: DEFAULT_UDP_PORT,
                stale_after_secs: DEFAULT_STALE_AFTER_SECS,
                log_interval_secs: DEFAULT_LOG_INTERVAL_SECS,
            },
            simulator: SimulatorSettings {
                speed_mps: DEFAULT_SIMULATOR_SPEED_MPS,
                report_interval_ms: DEFAULT_SIMULATOR_INTERVAL_MS,
            },
            recording: RecordingSettings {
                directory: default_recording_directory(),
            },
            logging: LoggingSettings {
                file: default_log_file(),
            },
        }
    }
}
