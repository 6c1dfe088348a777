//! Plain-text trail path files.
//!
//! One `latitude,longitude` pair per line. Blank lines and lines starting
//! with `#` are ignored, as is any trailing field (elevation, names).

use std::path::Path;

use thiserror::Error;

use super::geo::GeoCoordinate;
use super::path::{TrailPath, TrailPathError};

/// Errors produced while reading a path file.
#[derive(Debug, Error)]
pub enum PathFileError {
    /// The file could not be read.
    #[error("Failed to read path file: {0}")]
    Io(#[from] std::io::Error),

    /// A line could not be parsed as a coordinate pair.
    #[error("Line {line}: expected 'latitude,longitude', got '{content}'")]
    Parse { line: usize, content: String },

    /// The parsed coordinates do not form a valid path.
    #[error("Invalid trail path: {0}")]
    Path(#[from] TrailPathError),
}

/// Parse path text into a [`TrailPath`].
pub fn parse_path(text: &str) -> Result<TrailPath, PathFileError> {
    let mut coordinates = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parse_error = || PathFileError::Parse {
            line: index + 1,
            content: line.to_string(),
        };

        let mut fields = line.split(',').map(str::trim);
        let latitude: f64 = fields
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(parse_error)?;
        let longitude: f64 = fields
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(parse_error)?;

        coordinates.push(GeoCoordinate::new(latitude, longitude));
    }

    Ok(TrailPath::new(coordinates)?)
}

/// Read and parse a path file.
pub fn load_path(path: &Path) -> Result<TrailPath, PathFileError> {
    let text = std::fs::read_to_string(path)?;
    parse_path(&text)
}
