//! Recording command - toggle the persisted recording request.
//!
//! The flag lives in the state file and is read by every command that
//! receives fixes, so it survives restarts.

use clap::Subcommand;
use trailnav::config::{state_file_path, IniKeyValueStore, KeyValueStore};
use trailnav::location::RECORDING_FLAG_KEY;

use crate::error::CliError;

/// Recording subcommands.
#[derive(Debug, Subcommand)]
pub enum RecordingCommands {
    /// Record track points while receiving fixes
    On,

    /// Stop recording track points
    Off,

    /// Show whether recording is requested
    Status,
}

/// Run a recording subcommand.
pub fn run(command: RecordingCommands) -> Result<(), CliError> {
    let store = IniKeyValueStore::open_default();
    match command {
        RecordingCommands::On => set_flag(&store, true),
        RecordingCommands::Off => set_flag(&store, false),
        RecordingCommands::Status => {
            print_status(&store);
            Ok(())
        }
    }
}

fn set_flag(store: &dyn KeyValueStore, requesting: bool) -> Result<(), CliError> {
    store.set_bool(RECORDING_FLAG_KEY, requesting)?;
    print_status(store);
    Ok(())
}

fn print_status(store: &dyn KeyValueStore) {
    let requesting = store.get_bool(RECORDING_FLAG_KEY).unwrap_or(false);
    println!("Recording: {}", if requesting { "on" } else { "off" });
    println!("State file: {}", state_file_path().display());
}
