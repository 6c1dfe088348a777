//! ForeFlight GPS datagram parsing.
//!
//! Two text messages are understood, with or without the `2` suffix:
//! - **XGPS** - `XGPS<name>,lon,lat,alt_m,track_deg,ground_speed_m_s`
//! - **XATT** - `XATT<name>,true_heading,pitch,roll`

use tracing::trace;

use crate::trail::geo::normalize_bearing;

use super::super::state::{HeadingFix, LocationFix, INVALID_COURSE};

/// A decoded datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum Datagram {
    Location(LocationFix),
    Heading(HeadingFix),
}

/// Parse a datagram, stamping location fixes with `horizontal_accuracy`.
///
/// Returns `None` for unknown or malformed messages.
pub fn parse_datagram(data: &[u8], horizontal_accuracy: f64) -> Option<Datagram> {
    if data.starts_with(b"XGPS") {
        return parse_xgps(data, horizontal_accuracy).map(Datagram::Location);
    }
    if data.starts_with(b"XATT") {
        return parse_xatt(data).map(Datagram::Heading);
    }
    None
}

fn fields(data: &[u8], min: usize) -> Option<Vec<&str>> {
    let text = std::str::from_utf8(data).ok()?;
    let parts: Vec<&str> = text.trim_end().split(',').map(str::trim).collect();
    if parts.len() < min {
        trace!(parts = parts.len(), "Datagram too short");
        return None;
    }
    Some(parts)
}

fn parse_xgps(data: &[u8], horizontal_accuracy: f64) -> Option<LocationFix> {
    let parts = fields(data, 6)?;

    let longitude: f64 = parts[1].parse().ok()?;
    let latitude: f64 = parts[2].parse().ok()?;
    let altitude: f64 = parts[3].parse().ok()?;
    let track: f64 = parts[4].parse().ok()?;
    let speed: f64 = parts[5].parse().ok()?;

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        trace!(latitude, longitude, "XGPS coordinate out of range");
        return None;
    }

    Some(LocationFix {
        altitude,
        horizontal_accuracy,
        course: if track.is_finite() {
            normalize_bearing(track)
        } else {
            INVALID_COURSE
        },
        speed: speed.max(0.0),
        ..LocationFix::new(latitude, longitude)
    })
}

fn parse_xatt(data: &[u8]) -> Option<HeadingFix> {
    let parts = fields(data, 4)?;
    let heading: f64 = parts[1].parse().ok()?;
    if !heading.is_finite() {
        return None;
    }
    Some(HeadingFix::new(normalize_bearing(heading)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xgps() {
        let data = b"XGPSMyPhone,-105.2705,40.0150,1655.2,271.5,12.25";
        let Some(Datagram::Location(fix)) = parse_datagram(data, 10.0) else {
            panic!("expected location");
        };
        assert_eq!(fix.latitude, 40.0150);
        assert_eq!(fix.longitude, -105.2705);
        assert_eq!(fix.altitude, 1655.2);
        assert_eq!(fix.course, 271.5);
        assert_eq!(fix.speed, 12.25);
        assert_eq!(fix.horizontal_accuracy, 10.0);
    }

    #[test]
    fn test_parse_xgps2_and_negative_track() {
        let data = b"XGPS2Sim,8.5,47.4,400,-90,30\n";
        let Some(Datagram::Location(fix)) = parse_datagram(data, 10.0) else {
            panic!("expected location");
        };
        assert_eq!(fix.course, 270.0);
    }

    #[test]
    fn test_parse_xatt() {
        let data = b"XATTMyPhone,370.0,2.1,-0.5";
        let Some(Datagram::Heading(heading)) = parse_datagram(data, 10.0) else {
            panic!("expected heading");
        };
        assert_eq!(heading.true_heading, 10.0);
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(parse_datagram(b"XGPSMyPhone,1,2", 10.0), None);
        assert_eq!(parse_datagram(b"XGPSMyPhone,a,b,c,d,e", 10.0), None);
        assert_eq!(parse_datagram(b"XGPSMyPhone,1,95,0,0,0", 10.0), None);
        assert_eq!(parse_datagram(b"XATT,north,0,0", 10.0), None);
        assert_eq!(parse_datagram(b"DATA\0\0\0\0", 10.0), None);
        assert_eq!(parse_datagram(&[0xff, 0xfe], 10.0), None);
    }
}
