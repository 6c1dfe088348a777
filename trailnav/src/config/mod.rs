//! Configuration for trailnav.
//!
//! - [`ConfigFile`] - User settings loaded from `~/.trailnav/config.ini`
//! - [`ConfigKey`] - Typed `section.key` access for the CLI
//! - [`KeyValueStore`] - Persisted flags (`~/.trailnav/state.ini`)
//!
//! # Example
//!
//! ```no_run
//! use trailnav::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! println!("Simulated speed: {} m/s", config.simulator.speed_mps);
//! # Ok::<(), trailnav::config::ConfigFileError>(())
//! ```

mod defaults;
mod file;
mod keys;
mod parser;
mod settings;
mod store;
mod writer;

pub use defaults::*;
pub use file::{
    config_directory, config_file_path, state_file_path, ConfigFile, ConfigFileError,
};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{LocationSettings, LoggingSettings, RecordingSettings, SimulatorSettings};
pub use store::{IniKeyValueStore, KeyValueStore, MemoryKeyValueStore, StoreError};
