//! Location hub - multiplexes the active producer into recording and observers.
//!
//! The hub receives fixes from whichever producer is active (the real source
//! through [`spawn_event_pump`](super::spawn_event_pump), or a
//! [`TrailPathSimulator`] through its delegate callback), then for each fix:
//!
//! 1. stores it as the last reported location
//! 2. offers it to the [`RecordingSink`] if recording was requested
//! 3. calls every live [`LocationObserver`]
//! 4. publishes a [`LocationEvent`] on the broadcast channel
//!
//! A delivery mutex is held across all four steps, so fixes never overlap and
//! the recording write always happens before any observer sees the fix.
//!
//! # Usage
//!
//! ```ignore
//! let hub = Arc::new(LocationHub::new(source, recorder, store, LocationHubConfig::default()));
//! hub.add_location_update_observer(&observer);
//! hub.set_requesting_location_updates(true);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::{KeyValueStore, StoreError};

use super::observer::{LocationObserver, ObserverRegistry};
use super::recorder::RecordingSink;
use super::simulator::TrailPathSimulator;
use super::source::{FailureHandler, LocationSource, SourceError};
use super::state::{AuthorizationStatus, HeadingFix, LocationEvent, LocationFix, SourceKind};

/// Store key for the persisted recording request.
pub const RECORDING_FLAG_KEY: &str = "requesting_location_recording";

/// Label attached to track points produced by the simulator.
pub const SIMULATOR_SOURCE_LABEL: &str = "simulator";

/// Errors returned by hub operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// The recording flag could not be persisted.
    #[error("Failed to persist recording flag: {0}")]
    Store(#[from] StoreError),
}

/// Configuration for the location hub.
#[derive(Debug, Clone)]
pub struct LocationHubConfig {
    /// Label attached to track points from the real source.
    pub source_label: String,

    /// Capacity of the broadcast channel.
    pub channel_capacity: usize,
}

impl Default for LocationHubConfig {
    fn default() -> Self {
        Self {
            source_label: "gps".to_string(),
            channel_capacity: 64,
        }
    }
}

/// Mutable hub state. Never held while calling out to observers or sources.
#[derive(Default)]
struct HubState {
    last_location: Option<LocationFix>,
    last_heading: Option<HeadingFix>,
    location_observers: ObserverRegistry,
    heading_observers: ObserverRegistry,
    requesting_updates: bool,
    updating_heading: bool,
    simulator: Option<Arc<TrailPathSimulator>>,
}

/// Process-wide location pipeline.
///
/// Construct once and share as `Arc<LocationHub>`.
pub struct LocationHub {
    state: RwLock<HubState>,

    /// Serializes fix processing (record, observers, channel).
    delivery: Mutex<()>,

    /// Serializes source switching so start/stop calls are never duplicated.
    control: Mutex<()>,

    /// Cached copy of the persisted recording flag.
    recording: AtomicBool,

    real_source: Arc<dyn LocationSource>,
    recorder: Arc<dyn RecordingSink>,
    store: Arc<dyn KeyValueStore>,
    failure_handler: RwLock<Option<FailureHandler>>,
    broadcast_tx: broadcast::Sender<LocationEvent>,
    config: LocationHubConfig,
}

impl LocationHub {
    /// Create a hub bound to a real source, a recording sink and a flag store.
    ///
    /// The recording flag is read back from `store`, so a request made before
    /// a restart is still in effect.
    pub fn new(
        real_source: Arc<dyn LocationSource>,
        recorder: Arc<dyn RecordingSink>,
        store: Arc<dyn KeyValueStore>,
        config: LocationHubConfig,
    ) -> Self {
        let recording = store.get_bool(RECORDING_FLAG_KEY).unwrap_or(false);
        let (broadcast_tx, _) = broadcast::channel(config.channel_capacity.max(1));

        tracing::debug!(
            recording,
            source_label = %config.source_label,
            "Location hub created"
        );

        Self {
            state: RwLock::new(HubState::default()),
            delivery: Mutex::new(()),
            control: Mutex::new(()),
            recording: AtomicBool::new(recording),
            real_source,
            recorder,
            store,
            failure_handler: RwLock::new(None),
            broadcast_tx,
            config,
        }
    }

    /// Weak handle to this hub for use as a simulator's delegate.
    pub fn as_delegate(self: &Arc<Self>) -> Weak<dyn LocationObserver> {
        let observer: Arc<dyn LocationObserver> = Arc::clone(self) as Arc<dyn LocationObserver>;
        Arc::downgrade(&observer)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Source control
    // ─────────────────────────────────────────────────────────────────────────

    /// Start or stop the real source.
    ///
    /// Setting the current value again does nothing. Enabling real updates
    /// stops an attached simulation first.
    pub fn set_requesting_location_updates(&self, requesting: bool) {
        let _control = self.control.lock().unwrap_or_else(PoisonError::into_inner);

        if self.read_state().requesting_updates == requesting {
            return;
        }

        // The flag flips before the source is touched, so fixes still queued
        // from a stopped source are dropped by `receive_location`.
        let simulator = {
            let mut state = self.write_state();
            state.requesting_updates = requesting;
            if requesting {
                state.simulator.take()
            } else {
                None
            }
        };

        if requesting {
            if let Some(simulator) = simulator {
                tracing::info!("Stopping simulated source before starting real updates");
                simulator.stop();
            }
            self.real_source.start_updating_location();
        } else {
            self.real_source.stop_updating_location();
        }

        tracing::info!(requesting, "Real location updates toggled");
    }

    /// Returns true if the real source has been asked to deliver fixes.
    pub fn requesting_location_updates(&self) -> bool {
        self.read_state().requesting_updates
    }

    /// Start heading updates on the real source. No-op if already started.
    pub fn start_updating_heading(&self) {
        let _control = self.control.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.read_state().updating_heading {
            self.real_source.start_updating_heading();
            self.write_state().updating_heading = true;
            tracing::debug!("Heading updates started");
        }
    }

    /// Stop heading updates on the real source. No-op if not started.
    pub fn stop_updating_heading(&self) {
        let _control = self.control.lock().unwrap_or_else(PoisonError::into_inner);
        if self.read_state().updating_heading {
            self.write_state().updating_heading = false;
            self.real_source.stop_updating_heading();
            tracing::debug!("Heading updates stopped");
        }
    }

    /// Switch to a simulated source.
    ///
    /// Stops real updates and any previously attached simulation, then starts
    /// `simulator`. Its delegate should be this hub.
    pub fn use_simulated_source(&self, simulator: Arc<TrailPathSimulator>) {
        let _control = self.control.lock().unwrap_or_else(PoisonError::into_inner);

        let (was_requesting, previous) = {
            let mut state = self.write_state();
            let was_requesting = std::mem::replace(&mut state.requesting_updates, false);
            (was_requesting, state.simulator.take())
        };

        if was_requesting {
            self.real_source.stop_updating_location();
            tracing::info!("Real location updates stopped for simulation");
        }
        if let Some(previous) = previous {
            previous.stop();
        }

        self.write_state().simulator = Some(Arc::clone(&simulator));
        simulator.start();

        tracing::info!(
            samples = simulator.waypoint_series().len(),
            "Simulated source attached"
        );
    }

    /// Stop and detach the simulated source. No-op if none is attached.
    pub fn stop_simulated_source(&self) {
        let _control = self.control.lock().unwrap_or_else(PoisonError::into_inner);
        let simulator = self.write_state().simulator.take();
        if let Some(simulator) = simulator {
            simulator.stop();
            tracing::info!(
                delivered = simulator.delivered_count(),
                "Simulated source detached"
            );
        }
    }

    /// The producer currently feeding the hub, if any.
    pub fn active_source(&self) -> Option<SourceKind> {
        // Simulator queries happen after the state lock is released.
        let (simulator, requesting) = {
            let state = self.read_state();
            (state.simulator.clone(), state.requesting_updates)
        };
        match simulator {
            Some(simulator) if !simulator.is_finished() => Some(SourceKind::Simulated),
            _ if requesting => Some(self.real_source.kind()),
            _ => None,
        }
    }

    /// Authorization state of the real source.
    pub fn authorization_status(&self) -> AuthorizationStatus {
        self.real_source.authorization_status()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Recording
    // ─────────────────────────────────────────────────────────────────────────

    /// Persist whether incoming fixes should be recorded.
    ///
    /// The flag is written to the store before this returns; on failure the
    /// previous value stays in effect.
    pub fn set_requesting_location_recording(&self, requesting: bool) -> Result<(), HubError> {
        self.store.set_bool(RECORDING_FLAG_KEY, requesting)?;
        self.recording.store(requesting, Ordering::SeqCst);
        tracing::info!(requesting, "Location recording request updated");
        Ok(())
    }

    /// Returns true if incoming fixes are offered to the recording sink.
    pub fn requesting_location_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Observers
    // ─────────────────────────────────────────────────────────────────────────

    /// Register for location fixes. Adding the same observer twice is a no-op.
    pub fn add_location_update_observer(&self, observer: &Arc<dyn LocationObserver>) {
        self.write_state().location_observers.add(observer);
    }

    /// Unregister from location fixes. Unknown observers are ignored.
    pub fn remove_location_update_observer(&self, observer: &Arc<dyn LocationObserver>) {
        self.write_state().location_observers.remove(observer);
    }

    /// Register for heading fixes. Adding the same observer twice is a no-op.
    pub fn add_heading_update_observer(&self, observer: &Arc<dyn LocationObserver>) {
        self.write_state().heading_observers.add(observer);
    }

    /// Unregister from heading fixes. Unknown observers are ignored.
    pub fn remove_heading_update_observer(&self, observer: &Arc<dyn LocationObserver>) {
        self.write_state().heading_observers.remove(observer);
    }

    /// Subscribe to the typed event channel.
    pub fn subscribe(&self) -> broadcast::Receiver<LocationEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Install the handler called when the real source reports a failure.
    pub fn set_failure_handler(&self, handler: FailureHandler) {
        *self
            .failure_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Delivery
    // ─────────────────────────────────────────────────────────────────────────

    /// Receive a fix from the real source.
    ///
    /// Dropped unless real updates are requested and no simulation is
    /// attached.
    pub fn receive_location(&self, fix: LocationFix) {
        let _delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
        {
            let state = self.read_state();
            if !state.requesting_updates || state.simulator.is_some() {
                tracing::trace!("Dropping real fix, real updates are not active");
                return;
            }
        }
        self.deliver_location(fix, &self.config.source_label);
    }

    /// Receive a heading from the real source.
    ///
    /// Dropped unless heading updates are started.
    pub fn receive_heading(&self, heading: HeadingFix) {
        let _delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);

        let observers = {
            let mut state = self.write_state();
            if !state.updating_heading {
                tracing::trace!("Dropping heading, heading updates are stopped");
                return;
            }
            state.last_heading = Some(heading.clone());
            state.heading_observers.live()
        };

        for observer in &observers {
            observer.on_heading_updated(&heading);
        }
        let _ = self.broadcast_tx.send(LocationEvent::Heading(heading));
    }

    /// Forward a source failure to the failure handler.
    ///
    /// The pipeline keeps running and resumes on the next good fix.
    pub fn receive_failure(&self, error: SourceError) {
        tracing::warn!(error = %error, "Location source reported a failure");
        let handler = self
            .failure_handler
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handler) = handler.as_ref() {
            handler(&error);
        }
    }

    /// Record and fan out one fix. The caller holds the delivery lock.
    fn deliver_location(&self, fix: LocationFix, source_label: &str) {
        let observers = {
            let mut state = self.write_state();
            state.last_location = Some(fix.clone());
            state.location_observers.live()
        };

        if self.requesting_location_recording() {
            self.record(&fix, source_label);
        }

        for observer in &observers {
            observer.on_location_updated(&fix);
        }
        let _ = self.broadcast_tx.send(LocationEvent::Location(fix));
    }

    fn record(&self, fix: &LocationFix, source_label: &str) {
        if !self.recorder.has_active_trip_recording() {
            tracing::trace!("Recording requested but no trip is active");
            return;
        }
        if let Err(e) = self.recorder.log_track_point(fix, source_label) {
            tracing::warn!(error = %e, source = source_label, "Failed to record track point");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Snapshot of the most recent location fix.
    pub fn last_reported_location(&self) -> Option<LocationFix> {
        self.read_state().last_location.clone()
    }

    /// Snapshot of the most recent heading fix.
    pub fn last_reported_heading(&self) -> Option<HeadingFix> {
        self.read_state().last_heading.clone()
    }

    /// Returns true if no fix was ever received or the last one is older than `max_age`.
    pub fn last_reported_location_older_than(&self, max_age: Duration) -> bool {
        match &self.read_state().last_location {
            Some(fix) => fix.age() > max_age,
            None => true,
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, HubState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, HubState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The hub is the delegate of the simulator it drives.
impl LocationObserver for LocationHub {
    fn on_location_updated(&self, fix: &LocationFix) {
        let _delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
        {
            let state = self.read_state();
            if state.requesting_updates || state.simulator.is_none() {
                tracing::trace!("Dropping simulated fix, simulator is not the active source");
                return;
            }
        }
        self.deliver_location(fix.clone(), SIMULATOR_SOURCE_LABEL);
    }
}
