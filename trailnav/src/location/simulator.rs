//! Trail path simulator.
//!
//! Walks a [`TrailPath`] at constant speed and reports one synthetic fix per
//! interval to a delegate. The full series of fixes is computed at
//! construction; a run delivers it once and cannot be restarted.
//!
//! # Sampling
//!
//! Samples are taken every `speed × interval` meters from the start while the
//! distance is below the path length, then the path's final coordinate is
//! appended. A 100 m path at 14 m/s and 1 s yields samples at 0, 14, ..., 98 m
//! plus the endpoint: 9 fixes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, SystemTime};

use thiserror::Error;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigFile, DEFAULT_SIMULATOR_INTERVAL_MS, DEFAULT_SIMULATOR_SPEED_MPS};
use crate::trail::{bearing_degrees, GeoCoordinate, TrailPath};

use super::observer::LocationObserver;
use super::state::{LocationFix, INVALID_COURSE};

/// Errors raised when constructing a simulator.
#[derive(Debug, Error, PartialEq)]
pub enum SimulatorError {
    /// The path length is missing, negative or not finite.
    #[error("Trail path length is undefined")]
    UndefinedPathLength,

    /// Speed must be positive and finite.
    #[error("Invalid simulated speed: {0} m/s")]
    InvalidSpeed(f64),

    /// Report interval must be non-zero.
    #[error("Invalid report interval: {0:?}")]
    InvalidInterval(Duration),

    /// The step is so short that the series would not fit in memory.
    #[error("Path needs {samples:.0} samples at this speed and interval (limit {limit})")]
    TooManySamples { samples: f64, limit: usize },
}

/// Upper bound on the number of samples in one series.
pub const MAX_SERIES_SAMPLES: usize = 1_000_000;

/// Simulator configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Simulated speed in meters per second.
    pub speed_mps: f64,

    /// Time between reported fixes.
    pub report_interval: Duration,

    /// Horizontal accuracy stamped on every synthetic fix.
    pub horizontal_accuracy: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            speed_mps: DEFAULT_SIMULATOR_SPEED_MPS,
            report_interval: Duration::from_millis(DEFAULT_SIMULATOR_INTERVAL_MS),
            horizontal_accuracy: 1.0,
        }
    }
}

impl From<&ConfigFile> for SimulatorConfig {
    fn from(config: &ConfigFile) -> Self {
        Self {
            speed_mps: config.simulator.speed_mps,
            report_interval: config.simulator.report_interval(),
            ..Self::default()
        }
    }
}

impl SimulatorConfig {
    /// Distance between consecutive samples in meters.
    pub fn step_meters(&self) -> f64 {
        self.speed_mps * self.report_interval.as_secs_f64()
    }

    fn validate(&self) -> Result<(), SimulatorError> {
        if !(self.speed_mps.is_finite() && self.speed_mps > 0.0) {
            return Err(SimulatorError::InvalidSpeed(self.speed_mps));
        }
        if self.report_interval.is_zero() {
            return Err(SimulatorError::InvalidInterval(self.report_interval));
        }
        Ok(())
    }
}

struct SimulatorInner {
    series: Vec<LocationFix>,
    delegate: Weak<dyn LocationObserver>,
    config: SimulatorConfig,
    /// Index of the next sample to deliver.
    next_index: AtomicUsize,
    /// Token of the active run. Never held while calling the delegate.
    cancel: Mutex<Option<CancellationToken>>,
}

/// Generates evenly time-spaced fixes along a trail path.
///
/// The delegate is called without any simulator lock held, so it may query
/// or stop the simulator from inside its callback.
pub struct TrailPathSimulator {
    inner: Arc<SimulatorInner>,
}

impl TrailPathSimulator {
    /// Build a simulator and its full waypoint series.
    pub fn new(
        path: &TrailPath,
        delegate: Weak<dyn LocationObserver>,
        config: SimulatorConfig,
    ) -> Result<Self, SimulatorError> {
        config.validate()?;
        let length = path.length_meters();
        if !(length.is_finite() && length >= 0.0) {
            return Err(SimulatorError::UndefinedPathLength);
        }
        let samples = (length / config.step_meters()).ceil() + 1.0;
        if !(samples <= MAX_SERIES_SAMPLES as f64) {
            return Err(SimulatorError::TooManySamples {
                samples,
                limit: MAX_SERIES_SAMPLES,
            });
        }

        let series = build_series(path, &config);
        tracing::debug!(
            length_m = format!("{:.1}", length),
            step_m = format!("{:.1}", config.step_meters()),
            samples = series.len(),
            "Simulated waypoint series built"
        );

        Ok(Self {
            inner: Arc::new(SimulatorInner {
                series,
                delegate,
                config,
                next_index: AtomicUsize::new(0),
                cancel: Mutex::new(None),
            }),
        })
    }

    /// The precomputed fixes, in delivery order.
    ///
    /// Timestamps are replaced with the delivery time when reported.
    pub fn waypoint_series(&self) -> &[LocationFix] {
        &self.inner.series
    }

    /// Simulator configuration.
    pub fn config(&self) -> &SimulatorConfig {
        &self.inner.config
    }

    /// Start reporting fixes, one per interval, beginning one interval from now.
    ///
    /// No-op while running or once the series is exhausted. Must be called
    /// from within a tokio runtime.
    pub fn start(&self) {
        let mut cancel = self.inner.lock_cancel();
        if cancel.is_some() {
            return;
        }
        let next_index = self.inner.delivered();
        if next_index >= self.inner.series.len() {
            tracing::debug!("Simulation already finished, not restarting");
            return;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot start simulation outside a tokio runtime");
                return;
            }
        };

        let token = CancellationToken::new();
        *cancel = Some(token.clone());
        handle.spawn(run_simulation(Arc::clone(&self.inner), token));

        tracing::info!(
            remaining = self.inner.series.len() - next_index,
            interval_ms = self.inner.config.report_interval.as_millis() as u64,
            "Simulation started"
        );
    }

    /// Stop reporting fixes. No-op if not running.
    ///
    /// A delivery already under way completes; no new one starts after this
    /// returns. Safe to call from the delegate's callback.
    pub fn stop(&self) {
        if let Some(token) = self.inner.lock_cancel().take() {
            token.cancel();
            tracing::info!(delivered = self.inner.delivered(), "Simulation stopped");
        }
    }

    /// Returns true while the timer task is active.
    pub fn is_running(&self) -> bool {
        self.inner.lock_cancel().is_some()
    }

    /// Returns true once every sample has been delivered.
    pub fn is_finished(&self) -> bool {
        self.inner.delivered() >= self.inner.series.len()
    }

    /// Number of fixes delivered so far.
    pub fn delivered_count(&self) -> usize {
        self.inner.delivered()
    }
}

impl Drop for TrailPathSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}

impl SimulatorInner {
    fn lock_cancel(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.cancel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn delivered(&self) -> usize {
        self.next_index.load(Ordering::SeqCst)
    }

    /// Deliver the next sample. Returns false when the run is over.
    fn deliver_next(&self, token: &CancellationToken) -> bool {
        // Claim the sample under the cancel lock so `stop` cannot slip in
        // between the check and the claim.
        let (fix, delegate) = {
            let mut cancel = self.lock_cancel();
            if token.is_cancelled() {
                return false;
            }

            let index = self.delivered();
            let Some(sample) = self.series.get(index) else {
                *cancel = None;
                return false;
            };
            let Some(delegate) = self.delegate.upgrade() else {
                tracing::info!("Simulation delegate dropped, stopping");
                *cancel = None;
                return false;
            };
            self.next_index.store(index + 1, Ordering::SeqCst);
            (sample.clone().with_timestamp(SystemTime::now()), delegate)
        };

        let delivered = self.delivered();
        tracing::trace!(
            index = delivered,
            lat = format!("{:.6}", fix.latitude),
            lon = format!("{:.6}", fix.longitude),
            "Simulated fix"
        );
        delegate.on_location_updated(&fix);
        // The delegate may own this simulator; release it before touching
        // the cancel lock again.
        drop(delegate);

        if delivered >= self.series.len() {
            tracing::info!(delivered, "Simulation finished");
            let mut cancel = self.lock_cancel();
            if !token.is_cancelled() {
                *cancel = None;
            }
            return false;
        }
        true
    }
}

async fn run_simulation(inner: Arc<SimulatorInner>, token: CancellationToken) {
    let period = inner.config.report_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !inner.deliver_next(&token) {
                    break;
                }
            }
            _ = token.cancelled() => {
                break;
            }
        }
    }
}

/// Sample `path` every `speed × interval` meters, always ending on its last coordinate.
fn build_series(path: &TrailPath, config: &SimulatorConfig) -> Vec<LocationFix> {
    let step = config.step_meters();
    let length = path.length_meters();

    let mut coordinates: Vec<GeoCoordinate> = Vec::new();
    let mut index = 0usize;
    loop {
        let distance = index as f64 * step;
        if distance >= length {
            break;
        }
        coordinates.push(path.coordinate_from_start(distance));
        index += 1;
    }
    coordinates.push(path.end());

    let now = SystemTime::now();
    coordinates
        .iter()
        .enumerate()
        .map(|(i, coordinate)| {
            let course = match coordinates.get(i + 1) {
                Some(next) => bearing_degrees(*coordinate, *next),
                None => INVALID_COURSE,
            };
            LocationFix {
                horizontal_accuracy: config.horizontal_accuracy,
                course,
                speed: config.speed_mps,
                ..LocationFix::new(coordinate.latitude, coordinate.longitude)
            }
            .with_timestamp(now)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trail::distance_meters;

    #[derive(Default)]
    struct Collector(Mutex<Vec<LocationFix>>);

    impl LocationObserver for Collector {
        fn on_location_updated(&self, fix: &LocationFix) {
            self.0.lock().unwrap().push(fix.clone());
        }
    }

    impl Collector {
        fn fixes(&self) -> Vec<LocationFix> {
            self.0.lock().unwrap().clone()
        }
    }

    /// Two points ~111 m apart, declared as `length` meters long.
    fn path_of_length(length: f64) -> TrailPath {
        TrailPath::with_length(
            vec![
                GeoCoordinate::new(40.0, -105.0),
                GeoCoordinate::new(40.001, -105.0),
            ],
            Some(length),
        )
        .unwrap()
    }

    fn simulator(path: &TrailPath, collector: &Arc<Collector>) -> TrailPathSimulator {
        let collector: Arc<dyn LocationObserver> = collector.clone();
        TrailPathSimulator::new(path, Arc::downgrade(&collector), SimulatorConfig::default())
            .unwrap()
    }

    #[test]
    fn test_series_length_and_terminal_sample() {
        let path = path_of_length(100.0);
        let collector = Arc::new(Collector::default());
        let sim = simulator(&path, &collector);

        let series = sim.waypoint_series();
        assert_eq!(series.len(), 9);
        assert_eq!(series[0].coordinate(), path.start());
        assert_eq!(series[8].coordinate(), path.end());

        // Regular spacing up to 98 m, then a short final segment.
        let d78 = distance_meters(series[7].coordinate(), series[8].coordinate());
        let d01 = distance_meters(series[0].coordinate(), series[1].coordinate());
        assert!(d78 < d01);
    }

    #[test]
    fn test_series_fields() {
        let path = path_of_length(100.0);
        let collector = Arc::new(Collector::default());
        let sim = simulator(&path, &collector);
        let series = sim.waypoint_series();

        for fix in &series[..series.len() - 1] {
            assert!(fix.has_valid_course());
            assert!(fix.course < 1.0 || fix.course > 359.0, "northbound");
            assert_eq!(fix.speed, 14.0);
            assert_eq!(fix.horizontal_accuracy, 1.0);
        }
        assert_eq!(series[series.len() - 1].course, INVALID_COURSE);
    }

    #[test]
    fn test_zero_length_path_yields_single_sample() {
        let only = GeoCoordinate::new(40.0, -105.0);
        let path = TrailPath::new(vec![only]).unwrap();
        let collector = Arc::new(Collector::default());
        let sim = simulator(&path, &collector);

        assert_eq!(sim.waypoint_series().len(), 1);
        assert_eq!(sim.waypoint_series()[0].coordinate(), only);
        assert_eq!(sim.waypoint_series()[0].course, INVALID_COURSE);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let path = path_of_length(100.0);
        let collector: Arc<dyn LocationObserver> = Arc::new(Collector::default());

        let config = SimulatorConfig {
            speed_mps: 0.0,
            ..SimulatorConfig::default()
        };
        let err = TrailPathSimulator::new(&path, Arc::downgrade(&collector), config);
        assert!(matches!(err, Err(SimulatorError::InvalidSpeed(_))));

        let config = SimulatorConfig {
            report_interval: Duration::ZERO,
            ..SimulatorConfig::default()
        };
        let err = TrailPathSimulator::new(&path, Arc::downgrade(&collector), config);
        assert!(matches!(err, Err(SimulatorError::InvalidInterval(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_fix_scenario() {
        let path = path_of_length(28.0);
        let collector = Arc::new(Collector::default());
        let sim = simulator(&path, &collector);

        sim.start();
        assert!(sim.is_running());

        // Nothing is reported before the first interval elapses.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(collector.fixes().is_empty());

        tokio::time::sleep(Duration::from_secs(5)).await;
        let fixes = collector.fixes();
        assert_eq!(fixes.len(), 3);
        assert!(fixes[0].has_valid_course());
        assert!(fixes[1].has_valid_course());
        assert_eq!(fixes[2].course, INVALID_COURSE);
        assert_eq!(fixes[2].coordinate(), path.end());

        assert!(sim.is_finished());
        assert!(!sim.is_running());
        assert_eq!(sim.delivered_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_simulation_cannot_restart() {
        let path = path_of_length(28.0);
        let collector = Arc::new(Collector::default());
        let sim = simulator(&path, &collector);

        sim.start();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(collector.fixes().len(), 3);

        sim.start();
        assert!(!sim.is_running());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(collector.fixes().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_delivery_and_is_idempotent() {
        let path = path_of_length(100.0);
        let collector = Arc::new(Collector::default());
        let sim = simulator(&path, &collector);

        sim.stop();
        sim.start();
        sim.start();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(collector.fixes().len(), 2);

        sim.stop();
        sim.stop();
        assert!(!sim.is_running());
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(collector.fixes().len(), 2);
        assert!(!sim.is_finished());
    }

    #[test]
    fn test_oversized_series_rejected() {
        let path = path_of_length(100.0);
        let collector: Arc<dyn LocationObserver> = Arc::new(Collector::default());

        let config = SimulatorConfig {
            speed_mps: 0.001,
            report_interval: Duration::from_millis(1),
            ..SimulatorConfig::default()
        };
        let err = TrailPathSimulator::new(&path, Arc::downgrade(&collector), config);
        assert!(matches!(
            err,
            Err(SimulatorError::TooManySamples { limit: MAX_SERIES_SAMPLES, .. })
        ));
    }

    /// Stops its own simulator after `stop_after` fixes.
    struct SelfStopping {
        simulator: std::sync::OnceLock<Arc<TrailPathSimulator>>,
        stop_after: usize,
        seen: Mutex<Vec<bool>>,
    }

    impl LocationObserver for SelfStopping {
        fn on_location_updated(&self, _fix: &LocationFix) {
            let Some(sim) = self.simulator.get() else {
                return;
            };
            let mut seen = self.seen.lock().unwrap();
            seen.push(sim.is_running());
            if seen.len() == self.stop_after {
                sim.stop();
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delegate_can_stop_from_callback() {
        let path = path_of_length(100.0);
        let observer = Arc::new(SelfStopping {
            simulator: std::sync::OnceLock::new(),
            stop_after: 2,
            seen: Mutex::new(Vec::new()),
        });
        let delegate: Arc<dyn LocationObserver> = observer.clone();
        let sim = Arc::new(
            TrailPathSimulator::new(&path, Arc::downgrade(&delegate), SimulatorConfig::default())
                .unwrap(),
        );
        let _ = observer.simulator.set(Arc::clone(&sim));

        sim.start();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(*observer.seen.lock().unwrap(), vec![true, true]);
        assert!(!sim.is_running());
        assert_eq!(sim.delivered_count(), 2);
        assert!(!sim.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_delegate_ends_run() {
        let path = path_of_length(100.0);
        let collector = Arc::new(Collector::default());
        let sim = simulator(&path, &collector);
        drop(collector);

        sim.start();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!sim.is_running());
        assert_eq!(sim.delivered_count(), 0);
    }
}
