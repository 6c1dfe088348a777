//! Navigation status state machine.
//!
//! A pure reducer over evaluator callbacks: every callback replaces the
//! current [`NavigatorStatus`] wholesale, and nothing from the previous value
//! is carried over. Callbacks are collected in [`StagedTransitions`] and
//! committed once the evaluation pass succeeds. The current value is
//! published on a `watch` channel.

use std::cell::RefCell;

use tokio::sync::watch;

use crate::location::LocationFix;

use super::navigator::{NavigationSituation, NavigatorListener};
use super::status::NavigatorStatus;

/// Holds the most recently reported navigation status.
pub struct NavigationStatusMachine {
    status_tx: watch::Sender<NavigatorStatus>,
}

impl Default for NavigationStatusMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationStatusMachine {
    /// Create a machine in `NotReady`.
    pub fn new() -> Self {
        let (status_tx, _) = watch::channel(NavigatorStatus::NotReady);
        Self { status_tx }
    }

    /// Snapshot of the current status.
    pub fn status(&self) -> NavigatorStatus {
        self.status_tx.borrow().clone()
    }

    /// Watch status changes.
    pub fn subscribe(&self) -> watch::Receiver<NavigatorStatus> {
        self.status_tx.subscribe()
    }

    /// Replace the current status.
    pub fn apply(&self, status: NavigatorStatus) {
        let shown = status.display();
        tracing::debug!(
            status = status.name(),
            title = %shown.title,
            distance = %shown.distance_text,
            "Navigation status changed"
        );
        self.status_tx.send_replace(status);
    }

    /// Apply every staged transition in order. The last one wins.
    pub fn commit(&self, staged: StagedTransitions) {
        for status in staged.into_inner() {
            self.apply(status);
        }
    }

    /// Return to `NotReady`.
    pub fn reset(&self) {
        self.apply(NavigatorStatus::NotReady);
    }
}

/// Transitions reported by one evaluation pass, not yet applied.
///
/// This is the only place evaluator callbacks are mapped to statuses.
#[derive(Default)]
pub struct StagedTransitions(RefCell<Vec<NavigatorStatus>>);

impl StagedTransitions {
    /// Staged statuses in callback order.
    pub fn into_inner(self) -> Vec<NavigatorStatus> {
        self.0.into_inner()
    }

    fn push(&self, status: NavigatorStatus) {
        self.0.borrow_mut().push(status);
    }
}

impl NavigatorListener for StagedTransitions {
    fn on_change(&self, _fix: &LocationFix, situation: &NavigationSituation) {
        self.push(NavigatorStatus::Navigating {
            next_waypoint: situation.next_waypoint.clone(),
        });
    }

    fn on_trail_end_reached(&self, _fix: &LocationFix, situation: &NavigationSituation) {
        self.push(NavigatorStatus::Finished {
            waypoint: situation.next_waypoint.clone(),
        });
    }

    fn on_trail_lost(&self, _fix: &LocationFix) {
        self.push(NavigatorStatus::TrailLost);
    }

    fn on_wrong_direction(&self, _fix: &LocationFix) {
        self.push(NavigatorStatus::WrongDirection);
    }

    fn on_location_ignored(&self, fix: &LocationFix) {
        tracing::trace!(
            lat = format!("{:.6}", fix.latitude),
            lon = format!("{:.6}", fix.longitude),
            "Fix ignored by evaluator"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trail::{WaypointDirection, WaypointInfo};

    fn situation(name: &str) -> NavigationSituation {
        NavigationSituation {
            next_waypoint: WaypointInfo {
                waypoint_id: 2,
                name: name.to_string(),
                direction: WaypointDirection::Forward,
                distance_meters: Some(250.0),
            },
        }
    }

    #[test]
    fn test_starts_not_ready() {
        assert_eq!(NavigationStatusMachine::new().status(), NavigatorStatus::NotReady);
    }

    #[test]
    fn test_last_callback_wins() {
        let machine = NavigationStatusMachine::new();
        let fix = LocationFix::new(40.0, -105.0);

        let staged = StagedTransitions::default();
        staged.on_trail_lost(&fix);
        staged.on_change(&fix, &situation("Lake"));
        machine.commit(staged);
        assert_eq!(
            machine.status(),
            NavigatorStatus::Navigating {
                next_waypoint: situation("Lake").next_waypoint
            }
        );

        let staged = StagedTransitions::default();
        staged.on_wrong_direction(&fix);
        machine.commit(staged);
        assert_eq!(machine.status(), NavigatorStatus::WrongDirection);

        let staged = StagedTransitions::default();
        staged.on_trail_end_reached(&fix, &situation("Summit"));
        staged.on_trail_lost(&fix);
        machine.commit(staged);
        assert_eq!(machine.status(), NavigatorStatus::TrailLost);
    }

    #[test]
    fn test_callbacks_map_to_statuses() {
        let fix = LocationFix::new(40.0, -105.0);
        let staged = StagedTransitions::default();
        staged.on_change(&fix, &situation("Lake"));
        staged.on_location_ignored(&fix);
        staged.on_trail_end_reached(&fix, &situation("Summit"));
        staged.on_wrong_direction(&fix);
        staged.on_trail_lost(&fix);

        assert_eq!(
            staged.into_inner(),
            vec![
                NavigatorStatus::Navigating {
                    next_waypoint: situation("Lake").next_waypoint
                },
                NavigatorStatus::Finished {
                    waypoint: situation("Summit").next_waypoint
                },
                NavigatorStatus::WrongDirection,
                NavigatorStatus::TrailLost,
            ]
        );
    }

    #[test]
    fn test_apply_publishes_status() {
        let machine = NavigationStatusMachine::new();
        machine.apply(NavigatorStatus::Navigating {
            next_waypoint: situation("Lake").next_waypoint,
        });
        assert_eq!(machine.status().display().title, "Lake");
    }

    #[test]
    fn test_empty_commit_keeps_status() {
        let machine = NavigationStatusMachine::new();
        machine.apply(NavigatorStatus::WrongDirection);
        machine.commit(StagedTransitions::default());
        assert_eq!(machine.status(), NavigatorStatus::WrongDirection);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let machine = NavigationStatusMachine::new();
        let mut rx = machine.subscribe();

        machine.apply(NavigatorStatus::TrailLost);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), NavigatorStatus::TrailLost);

        machine.reset();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), NavigatorStatus::NotReady);
    }
}
