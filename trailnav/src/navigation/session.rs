//! Navigation session.
//!
//! Binds a drive to an evaluator and feeds it fixes, either directly through
//! [`NavigationSession::evaluate`] or by registering the session as a
//! location observer on the hub.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::watch;

use crate::location::{LocationFix, LocationObserver};
use crate::trail::TrailDrive;

use super::machine::{NavigationStatusMachine, StagedTransitions};
use super::navigator::{NavigationError, TrailNavigator};
use super::status::{NavigatorStatus, StatusDisplay};

struct Binding {
    drive: TrailDrive,
    navigator: Arc<dyn TrailNavigator>,
}

/// One navigation mode session, starting in `NotReady`.
#[derive(Default)]
pub struct NavigationSession {
    machine: NavigationStatusMachine,
    binding: RwLock<Option<Binding>>,
    last_error: Mutex<Option<NavigationError>>,
    /// Serializes evaluations so transitions apply in fix order.
    evaluating: Mutex<()>,
}

impl NavigationSession {
    /// Create an unbound session in `NotReady`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a drive and its evaluator, replacing any previous binding.
    pub fn bind(&self, drive: TrailDrive, navigator: Arc<dyn TrailNavigator>) {
        tracing::info!(
            drive_id = drive.id,
            drive = %drive.name,
            waypoints = drive.waypoints.len(),
            "Navigation bound to trail drive"
        );
        *self.binding.write().unwrap_or_else(PoisonError::into_inner) =
            Some(Binding { drive, navigator });
    }

    /// Returns true if a drive and evaluator are attached.
    pub fn is_bound(&self) -> bool {
        self.binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The bound drive, if any.
    pub fn drive(&self) -> Option<TrailDrive> {
        self.binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|b| b.drive.clone())
    }

    /// Drop the binding and return to `NotReady`.
    pub fn reset(&self) {
        let _evaluating = self.evaluating.lock().unwrap_or_else(PoisonError::into_inner);
        *self.binding.write().unwrap_or_else(PoisonError::into_inner) = None;
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.machine.reset();
    }

    /// Current status.
    pub fn status(&self) -> NavigatorStatus {
        self.machine.status()
    }

    /// UI-facing fields for the current status.
    pub fn display(&self) -> StatusDisplay {
        self.machine.status().display()
    }

    /// Watch status changes.
    pub fn subscribe(&self) -> watch::Receiver<NavigatorStatus> {
        self.machine.subscribe()
    }

    /// The error from the most recent observer-driven evaluation, if it failed.
    pub fn last_error(&self) -> Option<NavigationError> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run one evaluation pass and return the resulting status.
    ///
    /// On error the status is left unchanged, even if the evaluator reported
    /// callbacks before failing.
    pub fn evaluate(&self, fix: &LocationFix) -> Result<NavigatorStatus, NavigationError> {
        let _evaluating = self.evaluating.lock().unwrap_or_else(PoisonError::into_inner);

        let navigator = self
            .binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|b| Arc::clone(&b.navigator))
            .ok_or(NavigationError::NotBound)?;

        let staged = StagedTransitions::default();
        navigator.evaluate_location(fix, &staged)?;

        self.machine.commit(staged);
        Ok(self.machine.status())
    }
}

impl LocationObserver for NavigationSession {
    fn on_location_updated(&self, fix: &LocationFix) {
        if !self.is_bound() {
            return;
        }
        let result = self.evaluate(fix);
        let mut last_error = self.last_error.lock().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(_) => *last_error = None,
            Err(e) => {
                tracing::warn!(error = %e, "Navigation evaluation failed");
                *last_error = Some(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{NavigationSituation, NavigatorListener};
    use crate::trail::{WaypointDirection, WaypointInfo};

    /// Evaluator scripted by latitude: 1 = lost, 2 = change, 3 = end, 4 = fail after change.
    struct ScriptedNavigator;

    fn situation() -> NavigationSituation {
        NavigationSituation {
            next_waypoint: WaypointInfo {
                waypoint_id: 9,
                name: "Summit".to_string(),
                direction: WaypointDirection::Forward,
                distance_meters: Some(1500.0),
            },
        }
    }

    impl TrailNavigator for ScriptedNavigator {
        fn evaluate_location(
            &self,
            fix: &LocationFix,
            listener: &dyn NavigatorListener,
        ) -> Result<(), NavigationError> {
            match fix.latitude as i64 {
                1 => listener.on_trail_lost(fix),
                2 => listener.on_change(fix, &situation()),
                3 => listener.on_trail_end_reached(fix, &situation()),
                4 => {
                    listener.on_wrong_direction(fix);
                    return Err(NavigationError::Evaluator("malformed geometry".into()));
                }
                _ => listener.on_location_ignored(fix),
            }
            Ok(())
        }
    }

    fn bound_session() -> NavigationSession {
        let session = NavigationSession::new();
        session.bind(TrailDrive::new(1, "Hermit Pass", vec![]), Arc::new(ScriptedNavigator));
        session
    }

    #[test]
    fn test_unbound_session() {
        let session = NavigationSession::new();
        assert_eq!(session.status(), NavigatorStatus::NotReady);
        assert_eq!(
            session.evaluate(&LocationFix::new(2.0, 0.0)),
            Err(NavigationError::NotBound)
        );

        // The observer path ignores fixes until bound.
        session.on_location_updated(&LocationFix::new(2.0, 0.0));
        assert_eq!(session.last_error(), None);
    }

    #[test]
    fn test_evaluate_follows_callbacks() {
        let session = bound_session();

        assert_eq!(
            session.evaluate(&LocationFix::new(1.0, 0.0)).unwrap(),
            NavigatorStatus::TrailLost
        );
        let status = session.evaluate(&LocationFix::new(2.0, 0.0)).unwrap();
        assert!(matches!(status, NavigatorStatus::Navigating { .. }));
        assert_eq!(session.display().distance_text, "1.5 km");

        // Ignored fixes leave the status alone.
        let status = session.evaluate(&LocationFix::new(0.0, 0.0)).unwrap();
        assert!(matches!(status, NavigatorStatus::Navigating { .. }));

        let status = session.evaluate(&LocationFix::new(3.0, 0.0)).unwrap();
        assert_eq!(status.display().title, "Finished: Summit");
    }

    #[test]
    fn test_error_leaves_status_unchanged() {
        let session = bound_session();
        session.evaluate(&LocationFix::new(2.0, 0.0)).unwrap();

        let err = session.evaluate(&LocationFix::new(4.0, 0.0)).unwrap_err();
        assert_eq!(err, NavigationError::Evaluator("malformed geometry".into()));
        assert!(matches!(session.status(), NavigatorStatus::Navigating { .. }));
    }

    #[test]
    fn test_observer_path_records_errors() {
        let session = bound_session();
        session.on_location_updated(&LocationFix::new(4.0, 0.0));
        assert!(matches!(
            session.last_error(),
            Some(NavigationError::Evaluator(_))
        ));

        session.on_location_updated(&LocationFix::new(1.0, 0.0));
        assert_eq!(session.last_error(), None);
        assert_eq!(session.status(), NavigatorStatus::TrailLost);
    }

    #[test]
    fn test_reset_returns_to_not_ready() {
        let session = bound_session();
        session.evaluate(&LocationFix::new(1.0, 0.0)).unwrap();
        assert_eq!(session.drive().unwrap().name, "Hermit Pass");

        session.reset();
        assert_eq!(session.status(), NavigatorStatus::NotReady);
        assert!(!session.is_bound());
    }
}
