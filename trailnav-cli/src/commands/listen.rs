//! Listen command - receive fixes from the UDP GPS source.
//!
//! Point a phone GPS app or a simulator at this machine's UDP port and
//! watch fixes arrive.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use trailnav::location::{format_course, LocationEvent, LocationFix, LocationSource, SourceError};

use crate::error::CliError;
use crate::runner::CliRunner;

/// How often the command checks for a stale fix.
const STALE_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Arguments for the listen command.
#[derive(Debug, Args)]
pub struct ListenArgs {
    /// UDP port to listen on (default: from config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Also print heading updates
    #[arg(long)]
    pub heading: bool,

    /// Track log file, used when recording is on
    #[arg(long)]
    pub record: Option<PathBuf>,

    /// Stop after this many seconds (default: run until Ctrl+C)
    #[arg(long)]
    pub seconds: Option<u64>,
}

/// Run the listen command.
pub fn run(args: ListenArgs, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug)?;
    runner.log_startup("listen");
    let stale_after = runner.config().location.stale_after();

    let runtime = runner.runtime()?;
    runtime.block_on(async {
        let pipeline = runner.build_pipeline(args.port);
        if let Some(trip) = runner.open_trip(&pipeline, args.record)? {
            println!("Recording to {}", trip.display());
        }

        pipeline.hub.set_failure_handler(Box::new(|error: &SourceError| {
            eprintln!("Location source error: {}", error);
        }));
        let mut events = pipeline.hub.subscribe();

        pipeline.hub.set_requesting_location_updates(true);
        if args.heading {
            pipeline.hub.start_updating_heading();
        }
        println!(
            "Listening for GPS datagrams on UDP port {} (Ctrl+C to stop)",
            pipeline.source.port()
        );

        let deadline = async {
            match args.seconds {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let mut stale_ticker = tokio::time::interval(STALE_CHECK_INTERVAL);
        let mut fixes: u64 = 0;
        let mut stale_reported = false;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(LocationEvent::Location(fix)) => {
                        fixes += 1;
                        stale_reported = false;
                        println!("{}", describe_fix(&fix));
                    }
                    Ok(LocationEvent::Heading(heading)) => {
                        println!("heading {:.0}°", heading.true_heading);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Display fell behind the location stream");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = stale_ticker.tick() => {
                    if fixes > 0
                        && !stale_reported
                        && pipeline.hub.last_reported_location_older_than(stale_after)
                    {
                        stale_reported = true;
                        println!("No fix for {} s", stale_after.as_secs());
                    }
                }
                _ = &mut deadline => break,
                _ = &mut ctrl_c => break,
            }
        }

        println!(
            "Received {} fixes (source {})",
            fixes,
            pipeline.source.authorization_status()
        );
        if let Some(points) = pipeline.shutdown()? {
            println!("Recorded {} track points", points);
        }
        info!(fixes, "Listening stopped");
        Ok::<(), CliError>(())
    })
}

/// One-line summary of a fix.
fn describe_fix(fix: &LocationFix) -> String {
    format!(
        "{:.5}, {:.5}  course {}  {:.1} km/h  ±{:.0} m",
        fix.latitude,
        fix.longitude,
        format_course(fix.course),
        fix.speed * 3.6,
        fix.horizontal_accuracy
    )
}
