//! trailnav - Location pipeline and trail navigation status.
//!
//! The library wires one active location producer (a UDP GPS receiver or a
//! trail path simulator) into a hub that records fixes and fans them out to
//! observers, and classifies progress along a trail drive from those fixes.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use trailnav::location::{LocationHub, LocationHubConfig, TrailPathSimulator, SimulatorConfig};
//!
//! let hub = Arc::new(LocationHub::new(source, recorder, store, LocationHubConfig::default()));
//! let simulator = TrailPathSimulator::new(&path, hub.as_delegate(), SimulatorConfig::default())?;
//! hub.use_simulated_source(Arc::new(simulator));
//! ```

pub mod config;
pub mod location;
pub mod logging;
pub mod navigation;
pub mod trail;

/// Version of the trailnav library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
