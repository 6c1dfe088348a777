//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use trailnav::config::{ConfigFileError, StoreError};
use trailnav::location::{HubError, RecordingError, SimulatorError};
use trailnav::navigation::NavigationError;
use trailnav::trail::PathFileError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Failed to load a trail path file
    PathFile(PathFileError),
    /// Invalid simulator input
    Simulator(SimulatorError),
    /// Navigation could not be set up
    Navigation(NavigationError),
    /// Track log could not be opened or written
    Recording(RecordingError),
    /// Persisted state could not be read or written
    State(StoreError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::PathFile(PathFileError::Parse { .. }) => {
                eprintln!();
                eprintln!("Path files hold one 'latitude,longitude' pair per line.");
                eprintln!("Blank lines and lines starting with '#' are ignored.");
            }
            CliError::State(_) => {
                eprintln!();
                eprintln!(
                    "Check that {} is writable.",
                    trailnav::config::state_file_path().display()
                );
            }
            CliError::Recording(RecordingError::Io(_)) => {
                eprintln!();
                eprintln!("Set another directory with:");
                eprintln!("  trailnav config set recording.directory <path>");
            }
            CliError::Simulator(SimulatorError::TooManySamples { .. }) => {
                eprintln!();
                eprintln!("Raise --speed or --interval-ms to take fewer samples.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::PathFile(e) => write!(f, "Failed to load trail path: {}", e),
            CliError::Simulator(e) => write!(f, "Cannot simulate this path: {}", e),
            CliError::Navigation(e) => write!(f, "Cannot navigate this path: {}", e),
            CliError::Recording(e) => write!(f, "Recording error: {}", e),
            CliError::State(e) => write!(f, "State error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Runtime(e) => Some(e),
            CliError::PathFile(e) => Some(e),
            CliError::Simulator(e) => Some(e),
            CliError::Navigation(e) => Some(e),
            CliError::Recording(e) => Some(e),
            CliError::State(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<PathFileError> for CliError {
    fn from(e: PathFileError) -> Self {
        CliError::PathFile(e)
    }
}

impl From<SimulatorError> for CliError {
    fn from(e: SimulatorError) -> Self {
        CliError::Simulator(e)
    }
}

impl From<NavigationError> for CliError {
    fn from(e: NavigationError) -> Self {
        CliError::Navigation(e)
    }
}

impl From<RecordingError> for CliError {
    fn from(e: RecordingError) -> Self {
        CliError::Recording(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::State(e)
    }
}

impl From<HubError> for CliError {
    fn from(e: HubError) -> Self {
        match e {
            HubError::Store(e) => CliError::State(e),
        }
    }
}
