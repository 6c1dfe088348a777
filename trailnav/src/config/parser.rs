//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [location] section
    if let Some(section) = ini.section(Some("location")) {
        if let Some(v) = section.get("udp_port") {
            config.location.udp_port =
                parse_value(v, "location", "udp_port", "must be a port number (1-65535)")?;
            if config.location.udp_port == 0 {
                return Err(invalid("location", "udp_port", v, "port must not be 0"));
            }
        }
        if let Some(v) = section.get("stale_after_secs") {
            config.location.stale_after_secs = parse_value(
                v,
                "location",
                "stale_after_secs",
                "must be a positive integer (seconds)",
            )?;
        }
        if let Some(v) = section.get("log_interval_secs") {
            config.location.log_interval_secs = parse_value(
                v,
                "location",
                "log_interval_secs",
                "must be a positive integer (seconds)",
            )?;
        }
    }

    // [simulator] section
    if let Some(section) = ini.section(Some("simulator")) {
        if let Some(v) = section.get("speed_mps") {
            let speed: f64 =
                parse_value(v, "simulator", "speed_mps", "must be a number (m/s)")?;
            if !(speed.is_finite() && speed > 0.0) {
                return Err(invalid("simulator", "speed_mps", v, "must be greater than 0"));
            }
            config.simulator.speed_mps = speed;
        }
        if let Some(v) = section.get("report_interval_ms") {
            let interval: u64 = parse_value(
                v,
                "simulator",
                "report_interval_ms",
                "must be a positive integer (milliseconds)",
            )?;
            if interval == 0 {
                return Err(invalid(
                    "simulator",
                    "report_interval_ms",
                    v,
                    "must be greater than 0",
                ));
            }
            config.simulator.report_interval_ms = interval;
        }
    }

    // [recording] section
    if let Some(section) = ini.section(Some("recording")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.recording.directory = expand_tilde(v);
            }
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn parse_value<T: FromStr>(
    value: &str,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a leading `~` to the home directory.
pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(text).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_overlays_values() {
        let config = parse(
            "[location]\nudp_port = 4000\nstale_after_secs = 5\n\n[simulator]\nspeed_mps = 7.5\nreport_interval_ms = 250\n\n[recording]\ndirectory = /tmp/trips\n",
        )
        .unwrap();

        assert_eq!(config.location.udp_port, 4000);
        assert_eq!(config.location.stale_after_secs, 5);
        assert_eq!(config.simulator.speed_mps, 7.5);
        assert_eq!(config.simulator.report_interval_ms, 250);
        assert_eq!(config.recording.directory, PathBuf::from("/tmp/trips"));
    }

    #[test]
    fn test_invalid_port() {
        let err = parse("[location]\nudp_port = banana\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue { section, key, .. } => {
                assert_eq!(section, "location");
                assert_eq!(key, "udp_port");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_speed_rejected() {
        assert!(matches!(
            parse("[simulator]\nspeed_mps = 0\n"),
            Err(ConfigFileError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(matches!(
            parse("[simulator]\nreport_interval_ms = 0\n"),
            Err(ConfigFileError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/trips"), home.join("trips"));
            assert_eq!(expand_tilde("~"), home);
        }
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }
}
