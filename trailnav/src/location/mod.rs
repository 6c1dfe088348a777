//! Location pipeline.
//!
//! One active producer feeds one [`LocationHub`], which records and fans out
//! every fix:
//!
//! ```text
//! UdpLocationSource ──mpsc──► spawn_event_pump ──┐
//!                                                ├──► LocationHub ──► RecordingSink
//! TrailPathSimulator ──delegate callback─────────┘         │
//!                                                           ├──► LocationObserver (weak)
//!                                                           └──► broadcast::Receiver<LocationEvent>
//! ```
//!
//! Only one producer is active at a time: enabling real updates detaches the
//! simulator, and attaching a simulator stops real updates.

mod hub;
mod logger;
mod observer;
mod pump;
mod recorder;
mod simulator;
mod source;
mod state;
mod udp;

pub use hub::{
    HubError, LocationHub, LocationHubConfig, RECORDING_FLAG_KEY, SIMULATOR_SOURCE_LABEL,
};
pub use logger::{format_course, spawn_location_logger, DEFAULT_LOG_INTERVAL};
pub use observer::LocationObserver;
pub use pump::spawn_event_pump;
pub use recorder::{
    format_track_point, RecordingError, RecordingSink, TrackLogRecorder, TRACK_LOG_HEADER,
};
pub use simulator::{SimulatorConfig, SimulatorError, TrailPathSimulator};
pub use source::{FailureHandler, LocationSource, SourceError};
pub use state::{
    AuthorizationStatus, HeadingFix, LocationEvent, LocationFix, SourceEvent, SourceKind,
    INVALID_COURSE,
};
pub use udp::{parse_datagram, Datagram, UdpLocationSource, UdpSourceConfig};
