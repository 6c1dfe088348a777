//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[location]
; UDP port for ForeFlight-format GPS datagrams (XGPS/XATT), default: 49002
udp_port = {}
; Seconds after which the last reported fix is considered stale (default: 30)
stale_after_secs = {}
; Seconds between periodic location log entries at DEBUG level (default: 20)
log_interval_secs = {}

[simulator]
; Simulated driving speed in meters per second (default: 14)
speed_mps = {}
; Milliseconds between simulated fixes (default: 1000)
report_interval_ms = {}

[recording]
; Directory where recorded track logs are written
directory = {}

[logging]
; Log file path
file = {}
"#,
        config.location.udp_port,
        config.location.stale_after_secs,
        config.location.log_interval_secs,
        config.simulator.speed_mps,
        config.simulator.report_interval_ms,
        path_to_string(&config.recording.directory),
        path_to_string(&config.logging.file),
    )
}

pub(crate) fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ini::Ini;

    #[test]
    fn test_output_is_valid_ini() {
        let config = ConfigFile::default();
        let text = to_config_string(&config);
        let ini = Ini::load_from_str(&text).unwrap();

        let location = ini.section(Some("location")).unwrap();
        assert_eq!(location.get("udp_port"), Some("49002"));

        let simulator = ini.section(Some("simulator")).unwrap();
        assert_eq!(simulator.get("speed_mps"), Some("14"));
    }
}
