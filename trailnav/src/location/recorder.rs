//! Trip recording sink.
//!
//! The hub offers every fix to a [`RecordingSink`] while recording is
//! requested. [`TrackLogRecorder`] is the file-backed implementation: one CSV
//! row per fix, with the file held open only between `start_trip` and
//! `finish_trip`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;
use tracing::{debug, info};

use super::state::LocationFix;

/// Header row written at the top of every track log.
pub const TRACK_LOG_HEADER: &str =
    "timestamp,latitude,longitude,altitude,horizontal_accuracy,course,speed,source";

/// Errors produced by a recording sink.
#[derive(Debug, Error)]
pub enum RecordingError {
    /// A point was offered while no trip is being recorded.
    #[error("No active trip recording")]
    NoActiveTrip,

    /// A trip is already being recorded.
    #[error("Trip recording already active: {}", path.display())]
    AlreadyActive { path: PathBuf },

    /// Writing the track log failed.
    #[error("Failed to write track log: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability to persist track points.
pub trait RecordingSink: Send + Sync {
    /// Persist a single track point.
    fn log_track_point(&self, fix: &LocationFix, source_label: &str)
        -> Result<(), RecordingError>;

    /// Returns true if a trip is currently being recorded.
    fn has_active_trip_recording(&self) -> bool;
}

struct TripLog {
    writer: BufWriter<File>,
    path: PathBuf,
    points: u64,
}

/// CSV track log recorder.
#[derive(Default)]
pub struct TrackLogRecorder {
    trip: Mutex<Option<TripLog>>,
}

impl TrackLogRecorder {
    /// Create a recorder with no active trip.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new track log at `path` and write the header.
    ///
    /// Parent directories are created as needed. An existing file is truncated.
    pub fn start_trip(&self, path: &Path) -> Result<(), RecordingError> {
        let mut trip = self.trip.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(active) = trip.as_ref() {
            return Err(RecordingError::AlreadyActive {
                path: active.path.clone(),
            });
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "{}", TRACK_LOG_HEADER)?;
        writer.flush()?;

        info!(path = %path.display(), "Trip recording started");
        *trip = Some(TripLog {
            writer,
            path: path.to_path_buf(),
            points: 0,
        });
        Ok(())
    }

    /// Flush and close the active track log.
    ///
    /// Returns the number of points written, or `None` if no trip was active.
    pub fn finish_trip(&self) -> Result<Option<u64>, RecordingError> {
        let mut trip = self.trip.lock().unwrap_or_else(PoisonError::into_inner);
        match trip.take() {
            Some(mut log) => {
                log.writer.flush()?;
                info!(
                    path = %log.path.display(),
                    points = log.points,
                    "Trip recording finished"
                );
                Ok(Some(log.points))
            }
            None => Ok(None),
        }
    }

    /// Path of the active track log.
    pub fn active_path(&self) -> Option<PathBuf> {
        self.trip
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| t.path.clone())
    }
}

impl RecordingSink for TrackLogRecorder {
    fn log_track_point(
        &self,
        fix: &LocationFix,
        source_label: &str,
    ) -> Result<(), RecordingError> {
        let mut trip = self.trip.lock().unwrap_or_else(PoisonError::into_inner);
        let log = trip.as_mut().ok_or(RecordingError::NoActiveTrip)?;

        writeln!(log.writer, "{}", format_track_point(fix, source_label))?;
        // Each point hits the file before observers see the fix.
        log.writer.flush()?;
        log.points += 1;

        debug!(points = log.points, "Track point recorded");
        Ok(())
    }

    fn has_active_trip_recording(&self) -> bool {
        self.trip
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Format a fix as a track log row.
pub fn format_track_point(fix: &LocationFix, source_label: &str) -> String {
    let timestamp: DateTime<Utc> = fix.timestamp.into();
    format!(
        "{},{:.7},{:.7},{:.1},{:.1},{:.1},{:.2},{}",
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        fix.latitude,
        fix.longitude,
        fix.altitude,
        fix.horizontal_accuracy,
        fix.course,
        fix.speed,
        source_label
    )
}
