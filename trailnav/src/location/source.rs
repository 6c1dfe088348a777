//! Location source abstraction.
//!
//! A [`LocationSource`] is the start/stop contract every producer of real
//! fixes implements. Fixes themselves are not returned from these calls:
//! sources push [`SourceEvent`](super::SourceEvent)s toward the hub
//! (see [`spawn_event_pump`](super::spawn_event_pump)).
//!
//! Implementations must make every start/stop call idempotent.

use thiserror::Error;

use super::state::{AuthorizationStatus, SourceKind};

/// Failures reported by a location source.
///
/// These are transient from the pipeline's point of view: they are forwarded
/// to the hub's failure handler and never retried internally.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No fix could be obtained (e.g. GPS signal lost).
    #[error("Location signal lost")]
    SignalLost,

    /// The user or platform refused access to location data.
    #[error("Location access denied")]
    Denied,

    /// The underlying hardware or transport cannot be used.
    #[error("Location source unavailable: {reason}")]
    Unavailable { reason: String },

    /// I/O failure while reading from the source.
    #[error("Location source I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Uniform start/stop contract for a producer of location fixes.
pub trait LocationSource: Send + Sync {
    /// Which kind of producer this is.
    fn kind(&self) -> SourceKind {
        SourceKind::Real
    }

    /// Begin delivering location fixes. No-op if already started.
    fn start_updating_location(&self);

    /// Stop delivering location fixes. No-op if not started.
    fn stop_updating_location(&self);

    /// Begin delivering heading fixes. No-op if already started.
    fn start_updating_heading(&self);

    /// Stop delivering heading fixes. No-op if not started.
    fn stop_updating_heading(&self);

    /// Current platform authorization state.
    fn authorization_status(&self) -> AuthorizationStatus;
}

/// Callback invoked by the hub when the active source reports a failure.
pub type FailureHandler = Box<dyn Fn(&SourceError) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_messages() {
        assert_eq!(SourceError::SignalLost.to_string(), "Location signal lost");
        assert_eq!(
            SourceError::Unavailable {
                reason: "port in use".into()
            }
            .to_string(),
            "Location source unavailable: port in use"
        );
    }
}
