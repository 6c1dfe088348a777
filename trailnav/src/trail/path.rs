//! Trail path geometry.
//!
//! A [`TrailPath`] is an ordered polyline with a known total length that can
//! be sampled at any distance from its start. It is immutable once built.

use thiserror::Error;

use super::geo::{bearing_degrees, distance_meters, interpolate, GeoCoordinate, EARTH_RADIUS_M};

/// Errors produced when building a trail path.
#[derive(Debug, Error, PartialEq)]
pub enum TrailPathError {
    /// The path has no coordinates, so its length is undefined.
    #[error("Trail path has no coordinates")]
    Empty,

    /// The supplied length is absent, negative or not finite.
    #[error("Trail path length is undefined")]
    UndefinedLength,

    /// A coordinate is outside the valid latitude/longitude range.
    #[error("Invalid coordinate at index {index}: {coordinate}")]
    InvalidCoordinate {
        index: usize,
        coordinate: GeoCoordinate,
    },
}

/// Where a coordinate falls relative to a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathProjection {
    /// Distance along the path to the closest point, in path length units.
    pub distance_from_start_m: f64,
    /// Distance from the coordinate to the closest point on the path.
    pub offset_m: f64,
    /// Bearing of the segment containing the closest point, if the path has one.
    pub segment_bearing: Option<f64>,
}

/// Ordered path geometry with total length and distance-based sampling.
#[derive(Debug, Clone)]
pub struct TrailPath {
    coordinates: Vec<GeoCoordinate>,
    /// Cumulative geometric distance at each coordinate (first entry is 0).
    cumulative: Vec<f64>,
    /// Length reported for the path (geometric unless supplied externally).
    length_meters: f64,
}

impl TrailPath {
    /// Build a path from coordinates, computing its length geometrically.
    pub fn new(coordinates: Vec<GeoCoordinate>) -> Result<Self, TrailPathError> {
        let cumulative = cumulative_distances(&coordinates)?;
        let length_meters = cumulative.last().copied().unwrap_or(0.0);
        Ok(Self {
            coordinates,
            cumulative,
            length_meters,
        })
    }

    /// Build a path whose total length is supplied by the data source.
    ///
    /// Trail databases often carry a surveyed length that differs slightly from
    /// the digitized geometry. Distances passed to
    /// [`coordinate_from_start`](Self::coordinate_from_start) are then scaled
    /// onto the geometry so that `length` always maps to the final coordinate.
    pub fn with_length(
        coordinates: Vec<GeoCoordinate>,
        length: Option<f64>,
    ) -> Result<Self, TrailPathError> {
        let length_meters = match length {
            Some(l) if l.is_finite() && l >= 0.0 => l,
            _ => return Err(TrailPathError::UndefinedLength),
        };
        let cumulative = cumulative_distances(&coordinates)?;
        Ok(Self {
            coordinates,
            cumulative,
            length_meters,
        })
    }

    /// Total length of the path in meters.
    pub fn length_meters(&self) -> f64 {
        self.length_meters
    }

    /// All coordinates in path order.
    pub fn coordinates(&self) -> &[GeoCoordinate] {
        &self.coordinates
    }

    /// First coordinate of the path.
    pub fn start(&self) -> GeoCoordinate {
        self.coordinates[0]
    }

    /// Last coordinate of the path.
    pub fn end(&self) -> GeoCoordinate {
        self.coordinates[self.coordinates.len() - 1]
    }

    /// Interpolate the coordinate at `distance` meters from the start.
    ///
    /// Distances are clamped to `[0, length]`.
    pub fn coordinate_from_start(&self, distance: f64) -> GeoCoordinate {
        let geometric_length = self.cumulative[self.cumulative.len() - 1];
        if geometric_length <= 0.0 || self.length_meters <= 0.0 {
            return self.start();
        }

        let distance = distance.clamp(0.0, self.length_meters);
        let target = distance * geometric_length / self.length_meters;

        // Index of the first cumulative distance strictly beyond the target.
        let upper = self.cumulative.partition_point(|d| *d <= target);
        if upper >= self.coordinates.len() {
            return self.end();
        }
        let lower = upper - 1;

        let segment_length = self.cumulative[upper] - self.cumulative[lower];
        if segment_length <= 0.0 {
            return self.coordinates[lower];
        }
        let fraction = (target - self.cumulative[lower]) / segment_length;
        interpolate(self.coordinates[lower], self.coordinates[upper], fraction)
    }

    /// Distance from the start of each coordinate, in path length units.
    pub fn vertex_distances(&self) -> Vec<f64> {
        let scale = self.scale();
        self.cumulative.iter().map(|d| d * scale).collect()
    }

    /// Project a coordinate onto the closest point of the path.
    ///
    /// Segments are treated as straight lines in a local equirectangular
    /// frame, which is accurate for the short segments of digitized trails.
    pub fn project(&self, coordinate: GeoCoordinate) -> PathProjection {
        let mut best = PathProjection {
            distance_from_start_m: 0.0,
            offset_m: distance_meters(coordinate, self.start()),
            segment_bearing: None,
        };

        for (i, pair) in self.coordinates.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            let segment_length = self.cumulative[i + 1] - self.cumulative[i];
            if segment_length <= 0.0 {
                continue;
            }

            let (bx, by) = local_offset(a, b);
            let (px, py) = local_offset(a, coordinate);
            let len_sq = bx * bx + by * by;
            let t = if len_sq > 0.0 {
                ((px * bx + py * by) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let offset = distance_meters(coordinate, interpolate(a, b, t));

            if best.segment_bearing.is_none() || offset < best.offset_m {
                best = PathProjection {
                    distance_from_start_m: (self.cumulative[i] + t * segment_length)
                        * self.scale(),
                    offset_m: offset,
                    segment_bearing: Some(bearing_degrees(a, b)),
                };
            }
        }
        best
    }

    /// Factor mapping geometric distance onto the reported length.
    fn scale(&self) -> f64 {
        let geometric_length = self.cumulative[self.cumulative.len() - 1];
        if geometric_length > 0.0 {
            self.length_meters / geometric_length
        } else {
            0.0
        }
    }
}

/// East/north offset in meters of `to` from `origin`.
fn local_offset(origin: GeoCoordinate, to: GeoCoordinate) -> (f64, f64) {
    let meters_per_degree = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
    let x = (to.longitude - origin.longitude)
        * origin.latitude.to_radians().cos()
        * meters_per_degree;
    let y = (to.latitude - origin.latitude) * meters_per_degree;
    (x, y)
}

fn cumulative_distances(coordinates: &[GeoCoordinate]) -> Result<Vec<f64>, TrailPathError> {
    if coordinates.is_empty() {
        return Err(TrailPathError::Empty);
    }
    if let Some((index, coordinate)) = coordinates
        .iter()
        .enumerate()
        .find(|(_, c)| !c.is_valid())
    {
        return Err(TrailPathError::InvalidCoordinate {
            index,
            coordinate: *coordinate,
        });
    }

    let mut cumulative = Vec::with_capacity(coordinates.len());
    let mut total = 0.0;
    cumulative.push(total);
    for pair in coordinates.windows(2) {
        total += distance_meters(pair[0], pair[1]);
        cumulative.push(total);
    }
    Ok(cumulative)
}
