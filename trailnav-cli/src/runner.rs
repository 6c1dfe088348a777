//! CLI runner for common setup and operations.
//!
//! Encapsulates logging initialization, runtime creation, and hub wiring
//! to reduce duplication across command handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;
use trailnav::config::{ConfigFile, IniKeyValueStore};
use trailnav::location::{
    spawn_event_pump, spawn_location_logger, LocationHub, LocationHubConfig, TrackLogRecorder,
    UdpLocationSource, UdpSourceConfig,
};
use trailnav::logging::{default_log_file, init_logging, LoggingGuard};

use crate::error::CliError;

/// Capacity of the channel between the UDP receiver and the hub.
const SOURCE_CHANNEL_CAPACITY: usize = 64;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

/// Everything a command needs to receive fixes.
pub struct Pipeline {
    pub hub: Arc<LocationHub>,
    pub source: Arc<UdpLocationSource>,
    pub recorder: Arc<TrackLogRecorder>,
    pump: JoinHandle<()>,
    logger_cancel: CancellationToken,
}

impl Pipeline {
    /// Stop every producer, close the trip, and stop background tasks.
    ///
    /// Returns the number of points recorded, if a trip was open.
    pub fn shutdown(self) -> Result<Option<u64>, CliError> {
        self.hub.stop_simulated_source();
        self.hub.set_requesting_location_updates(false);
        self.logger_cancel.cancel();
        self.pump.abort();
        Ok(self.recorder.finish_trip()?)
    }
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// Logs go to the configured file; stdout logging is only enabled in
    /// debug mode so regular output stays readable.
    pub fn new(debug_mode: bool) -> Result<Self, CliError> {
        // Load config file (or use defaults if not present)
        let config = ConfigFile::load()?;

        let log_path = &config.logging.file;
        let log_dir = log_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| default_log_file().to_string());

        let logging_guard = init_logging(&log_dir, &log_file, debug_mode, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("TrailNav v{}", trailnav::VERSION);
        info!("TrailNav CLI: {} command", command);
    }

    /// Build the multi-threaded runtime commands run on.
    pub fn runtime(&self) -> Result<Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)
    }

    /// Wire a hub to the UDP source, the track recorder, and the persisted
    /// state file. Must be called inside the runtime.
    ///
    /// The source is created but not started.
    pub fn build_pipeline(&self, port: Option<u16>) -> Pipeline {
        let mut source_config = UdpSourceConfig::from(&self.config);
        if let Some(port) = port {
            source_config.port = port;
        }

        let (event_tx, event_rx) = mpsc::channel(SOURCE_CHANNEL_CAPACITY);
        let source = Arc::new(UdpLocationSource::new(source_config, event_tx));
        let recorder = Arc::new(TrackLogRecorder::new());
        let store = Arc::new(IniKeyValueStore::open_default());

        let hub = Arc::new(LocationHub::new(
            source.clone(),
            recorder.clone(),
            store,
            LocationHubConfig::default(),
        ));
        let pump = spawn_event_pump(hub.clone(), event_rx);

        let logger_cancel = CancellationToken::new();
        if tracing::enabled!(tracing::Level::DEBUG) {
            spawn_location_logger(
                hub.clone(),
                logger_cancel.clone(),
                self.config.location.log_interval(),
            );
        }

        Pipeline {
            hub,
            source,
            recorder,
            pump,
            logger_cancel,
        }
    }

    /// Open a trip if recording is requested.
    ///
    /// Uses `explicit` when given, otherwise a timestamped file in the
    /// configured recording directory. Returns the trip path when one was
    /// opened.
    pub fn open_trip(
        &self,
        pipeline: &Pipeline,
        explicit: Option<PathBuf>,
    ) -> Result<Option<PathBuf>, CliError> {
        if !pipeline.hub.requesting_location_recording() {
            if let Some(path) = explicit {
                println!(
                    "Recording is off; {} will not be written. Enable it with 'trailnav recording on'.",
                    path.display()
                );
            }
            return Ok(None);
        }

        let path = explicit.unwrap_or_else(|| {
            let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
            self.config
                .recording
                .directory
                .join(format!("trip-{}.csv", stamp))
        });
        pipeline.recorder.start_trip(&path)?;
        info!(path = %path.display(), "Recording trip");
        Ok(Some(path))
    }
}
