//! TrailNav CLI - drive trail paths with the simulator, listen for GPS
//! fixes, and manage recording and configuration.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::listen::ListenArgs;
use commands::recording::RecordingCommands;
use commands::simulate::SimulateArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "trailnav")]
#[command(about = "Location pipeline and trail navigation", long_about = None)]
#[command(version = trailnav::VERSION)]
struct Cli {
    /// Enable debug logging (also logs to stdout)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a trail path with the simulator and navigate it
    Simulate(SimulateArgs),

    /// Receive fixes from the UDP GPS source
    Listen(ListenArgs),

    /// Turn track recording on or off
    Recording {
        #[command(subcommand)]
        command: RecordingCommands,
    },

    /// View or modify configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Simulate(args) => commands::simulate::run(args, cli.debug),
        Commands::Listen(args) => commands::listen::run(args, cli.debug),
        Commands::Recording { command } => commands::recording::run(command),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simulate() {
        let cli = Cli::try_parse_from([
            "trailnav",
            "simulate",
            "--path",
            "lake.txt",
            "--speed",
            "8.5",
            "--interval-ms",
            "500",
        ])
        .unwrap();
        assert!(!cli.debug);
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.path.to_str(), Some("lake.txt"));
                assert_eq!(args.speed, Some(8.5));
                assert_eq!(args.interval_ms, Some(500));
                assert!(args.record.is_none());
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn test_parse_listen_with_global_debug() {
        let cli = Cli::try_parse_from(["trailnav", "listen", "--port", "4000", "--heading", "--debug"])
            .unwrap();
        assert!(cli.debug);
        match cli.command {
            Commands::Listen(args) => {
                assert_eq!(args.port, Some(4000));
                assert!(args.heading);
                assert!(args.seconds.is_none());
            }
            _ => panic!("expected listen"),
        }
    }

    #[test]
    fn test_parse_recording_and_config() {
        let cli = Cli::try_parse_from(["trailnav", "recording", "on"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Recording {
                command: RecordingCommands::On
            }
        ));

        let cli =
            Cli::try_parse_from(["trailnav", "config", "set", "location.udp_port", "4000"]).unwrap();
        match cli.command {
            Commands::Config {
                command: ConfigCommands::Set { key, value },
            } => {
                assert_eq!(key, "location.udp_port");
                assert_eq!(value, "4000");
            }
            _ => panic!("expected config set"),
        }
    }

    #[test]
    fn test_simulate_requires_path() {
        assert!(Cli::try_parse_from(["trailnav", "simulate"]).is_err());
    }
}
