//! Navigation status along a trail drive.
//!
//! - [`TrailNavigator`] - Evaluator contract mapping fixes onto a drive
//! - [`NavigationStatusMachine`] - Reducer holding the current [`NavigatorStatus`]
//! - [`NavigationSession`] - Binds a drive and evaluator, observes the hub
//! - [`ProximityNavigator`] - Path-projection evaluator used by the CLI

mod machine;
mod navigator;
mod proximity;
mod session;
mod status;

pub use machine::{NavigationStatusMachine, StagedTransitions};
pub use navigator::{NavigationError, NavigationSituation, NavigatorListener, TrailNavigator};
pub use proximity::{ProximityConfig, ProximityNavigator};
pub use session::NavigationSession;
pub use status::{direction_glyph, format_distance, NavigatorStatus, StatusDisplay};
