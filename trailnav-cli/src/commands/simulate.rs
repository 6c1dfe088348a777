//! Simulate command - drive a trail path and navigate it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tracing::info;
use trailnav::location::{LocationObserver, SimulatorConfig, TrailPathSimulator};
use trailnav::navigation::{NavigationSession, ProximityConfig, ProximityNavigator};
use trailnav::trail::load_path;

use crate::error::CliError;
use crate::runner::CliRunner;

/// How often the command checks whether the simulation has finished.
const FINISH_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Arguments for the simulate command.
#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Trail path file with one 'latitude,longitude' pair per line
    #[arg(long)]
    pub path: PathBuf,

    /// Simulated speed in meters per second (default: from config)
    #[arg(long)]
    pub speed: Option<f64>,

    /// Interval between fixes in milliseconds (default: from config)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Track log file, used when recording is on
    #[arg(long)]
    pub record: Option<PathBuf>,
}

/// Run the simulate command.
pub fn run(args: SimulateArgs, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug)?;
    runner.log_startup("simulate");

    let path = load_path(&args.path)?;
    let name = args
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Trail".to_string());

    let mut simulator_config = SimulatorConfig::from(runner.config());
    if let Some(speed) = args.speed {
        simulator_config.speed_mps = speed;
    }
    if let Some(interval_ms) = args.interval_ms {
        simulator_config.report_interval = Duration::from_millis(interval_ms);
    }

    let navigator = ProximityNavigator::for_path(path.clone(), &name, ProximityConfig::default())?;
    println!(
        "Trail '{}': {:.0} m, {} waypoints",
        name,
        path.length_meters(),
        navigator.drive().waypoints.len()
    );

    let runtime = runner.runtime()?;
    runtime.block_on(async {
        let pipeline = runner.build_pipeline(None);
        if let Some(trip) = runner.open_trip(&pipeline, args.record)? {
            println!("Recording to {}", trip.display());
        }

        let session = Arc::new(NavigationSession::new());
        session.bind(navigator.drive().clone(), Arc::new(navigator));
        let observer: Arc<dyn LocationObserver> = session.clone();
        pipeline.hub.add_location_update_observer(&observer);

        let simulator = Arc::new(TrailPathSimulator::new(
            &path,
            pipeline.hub.as_delegate(),
            simulator_config,
        )?);
        println!(
            "Simulating {} fixes at {:.1} m/s (Ctrl+C to stop)",
            simulator.waypoint_series().len(),
            simulator.config().speed_mps
        );
        pipeline.hub.use_simulated_source(simulator.clone());

        let mut status_rx = session.subscribe();
        let mut ticker = tokio::time::interval(FINISH_POLL_INTERVAL);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let interrupted = loop {
            tokio::select! {
                changed = status_rx.changed() => {
                    if changed.is_err() {
                        break false;
                    }
                    println!("{}", *status_rx.borrow_and_update());
                }
                _ = ticker.tick() => {
                    if simulator.is_finished() {
                        break false;
                    }
                }
                _ = &mut ctrl_c => {
                    break true;
                }
            }
        };

        if interrupted {
            println!("Interrupted after {} fixes", simulator.delivered_count());
        }
        if let Some(error) = session.last_error() {
            println!("Last navigation error: {}", error);
        }
        println!("Final status: {}", session.status());

        pipeline.hub.remove_location_update_observer(&observer);
        if let Some(points) = pipeline.shutdown()? {
            println!("Recorded {} track points", points);
        }
        info!("Simulation complete");
        Ok::<(), CliError>(())
    })
}
