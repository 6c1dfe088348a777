//! Periodic location logging daemon.
//!
//! Logs the hub's last fix at DEBUG level on a fixed interval, which is handy
//! when reviewing a drive after the fact.
//!
//! # Output Format
//!
//! - `lat`, `lon` - Position in decimal degrees
//! - `course` - Direction of travel in degrees, or `-` when invalid
//! - `speed_kmh` - Speed in km/h
//! - `accuracy_m` - Horizontal accuracy in meters
//! - `age_s` - Seconds since the fix was measured
//! - `source` - Active producer

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::hub::LocationHub;

/// Default logging interval (20 seconds).
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(20);

/// Spawns a background task that periodically logs the last reported location.
///
/// Stops when `cancellation` is triggered. Callers should check
/// `tracing::enabled!(tracing::Level::DEBUG)` first, since nothing is logged
/// otherwise.
pub fn spawn_location_logger(
    hub: Arc<LocationHub>,
    cancellation: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    log_location(&hub);
                }
                _ = cancellation.cancelled() => {
                    tracing::debug!("Location logger stopped");
                    break;
                }
            }
        }
    })
}

fn log_location(hub: &LocationHub) {
    let source = hub
        .active_source()
        .map(|kind| kind.to_string())
        .unwrap_or_else(|| "none".to_string());

    match hub.last_reported_location() {
        Some(fix) => {
            tracing::debug!(
                lat = format!("{:.5}", fix.latitude),
                lon = format!("{:.5}", fix.longitude),
                course = %format_course(fix.course),
                speed_kmh = format!("{:.1}", fix.speed * 3.6),
                accuracy_m = format!("{:.0}", fix.horizontal_accuracy),
                age_s = fix.age().as_secs(),
                source = %source,
                "Location update"
            );
        }
        None => {
            tracing::debug!(source = %source, "Location update (no fix yet)");
        }
    }
}

/// Formats a course for display; invalid courses render as `-`.
pub fn format_course(course: f64) -> String {
    if course >= 0.0 {
        format!("{:.0}", course)
    } else {
        "-".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_course() {
        assert_eq!(format_course(271.6), "272");
        assert_eq!(format_course(0.0), "0");
        assert_eq!(format_course(-1.0), "-");
    }
}
