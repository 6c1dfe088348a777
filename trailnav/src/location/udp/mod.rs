//! UDP GPS receiver - the real location source.
//!
//! Listens for ForeFlight-format GPS datagrams (sent by phone GPS apps and
//! flight/driving simulators) and turns them into [`SourceEvent`]s on an mpsc
//! channel. Bridge the channel into a hub with
//! [`spawn_event_pump`](super::spawn_event_pump).
//!
//! # Example
//!
//! ```ignore
//! let (tx, rx) = mpsc::channel(32);
//! let source = Arc::new(UdpLocationSource::new(UdpSourceConfig::default(), tx));
//! spawn_event_pump(hub.clone(), rx);
//! source.start_updating_location();
//! ```

mod protocol;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::{ConfigFile, DEFAULT_UDP_PORT};

use super::source::{LocationSource, SourceError};
use super::state::{AuthorizationStatus, SourceEvent};

pub use protocol::{parse_datagram, Datagram};

/// Maximum datagram size we expect.
const MAX_DATAGRAM_SIZE: usize = 1024;

/// UDP source configuration.
#[derive(Debug, Clone)]
pub struct UdpSourceConfig {
    /// Address to bind (default: all interfaces).
    pub bind_address: String,

    /// UDP port to listen on (default: 49002). Zero picks an ephemeral port.
    pub port: u16,

    /// Horizontal accuracy stamped on received fixes, in meters.
    pub horizontal_accuracy: f64,

    /// Silence after which a `SignalLost` failure is reported.
    pub signal_timeout: Duration,
}

impl Default for UdpSourceConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: DEFAULT_UDP_PORT,
            horizontal_accuracy: 10.0,
            signal_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&ConfigFile> for UdpSourceConfig {
    fn from(config: &ConfigFile) -> Self {
        Self {
            port: config.location.udp_port,
            ..Self::default()
        }
    }
}

/// State shared with the receiver task.
struct Shared {
    heading_enabled: AtomicBool,
    status: Mutex<AuthorizationStatus>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl Shared {
    fn set_status(&self, status: AuthorizationStatus) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }
}

/// Real location source fed by UDP datagrams.
pub struct UdpLocationSource {
    config: UdpSourceConfig,
    event_tx: mpsc::Sender<SourceEvent>,
    shared: Arc<Shared>,
    cancel: Mutex<Option<CancellationToken>>,
    /// Most recent receiver task. A restart waits on it before binding.
    task: Mutex<Option<JoinHandle<()>>>,
}

impl UdpLocationSource {
    /// Create a source that emits events on `event_tx`. Nothing is bound until started.
    pub fn new(config: UdpSourceConfig, event_tx: mpsc::Sender<SourceEvent>) -> Self {
        Self {
            config,
            event_tx,
            shared: Arc::new(Shared {
                heading_enabled: AtomicBool::new(false),
                status: Mutex::new(AuthorizationStatus::NotDetermined),
                local_addr: Mutex::new(None),
            }),
            cancel: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    /// Get the configured port.
    pub fn port(&self) -> u16 {
        self.config.port
    }

    /// Address the socket is bound to, once the receiver is listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self
            .shared
            .local_addr
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns true while the receiver task is active.
    pub fn is_running(&self) -> bool {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl LocationSource for UdpLocationSource {
    fn start_updating_location(&self) {
        let mut cancel = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        if cancel.is_some() {
            return;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "Cannot start UDP receiver outside a tokio runtime");
                return;
            }
        };

        let token = CancellationToken::new();
        *cancel = Some(token.clone());
        let receiver = Receiver {
            config: self.config.clone(),
            event_tx: self.event_tx.clone(),
            shared: Arc::clone(&self.shared),
            token,
        };

        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = task.take();
        *task = Some(handle.spawn(async move {
            // The stopped receiver still owns the port until its task ends.
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            receiver.run().await;
        }));
    }

    fn stop_updating_location(&self) {
        if let Some(token) = self
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            token.cancel();
            debug!(port = self.config.port, "UDP receiver stop requested");
        }
    }

    fn start_updating_heading(&self) {
        self.shared.heading_enabled.store(true, Ordering::SeqCst);
    }

    fn stop_updating_heading(&self) {
        self.shared.heading_enabled.store(false, Ordering::SeqCst);
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        *self
            .shared
            .status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for UdpLocationSource {
    fn drop(&mut self) {
        self.stop_updating_location();
    }
}

/// One run of the receive loop.
struct Receiver {
    config: UdpSourceConfig,
    event_tx: mpsc::Sender<SourceEvent>,
    shared: Arc<Shared>,
    token: CancellationToken,
}

impl Receiver {
    async fn run(self) {
        let address = format!("{}:{}", self.config.bind_address, self.config.port);
        let socket = match UdpSocket::bind(&address).await {
            Ok(socket) => socket,
            Err(e) => {
                warn!(address = %address, error = %e, "Failed to bind UDP socket");
                self.shared.set_status(AuthorizationStatus::Denied);
                let failure = SourceError::Unavailable {
                    reason: format!("failed to bind {}: {}", address, e),
                };
                let _ = self.event_tx.send(SourceEvent::Failed(failure)).await;
                return;
            }
        };

        let local_addr = socket.local_addr().ok();
        *self
            .shared
            .local_addr
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = local_addr;
        self.shared.set_status(AuthorizationStatus::AuthorizedWhenInUse);
        info!(local_addr = ?local_addr, "UDP location receiver started");

        let mut buffer = [0u8; MAX_DATAGRAM_SIZE];
        let mut datagrams: u64 = 0;
        let mut fixes: u64 = 0;
        let mut signal_lost_reported = false;

        loop {
            let received = tokio::select! {
                _ = self.token.cancelled() => break,
                received = tokio::time::timeout(self.config.signal_timeout, socket.recv(&mut buffer)) => received,
            };

            let event = match received {
                Ok(Ok(len)) => {
                    datagrams += 1;
                    match parse_datagram(&buffer[..len], self.config.horizontal_accuracy) {
                        Some(Datagram::Location(fix)) => {
                            fixes += 1;
                            signal_lost_reported = false;
                            if fixes == 1 {
                                info!(
                                    lat = format!("{:.5}", fix.latitude),
                                    lon = format!("{:.5}", fix.longitude),
                                    "First GPS fix received"
                                );
                            }
                            SourceEvent::Location(fix)
                        }
                        Some(Datagram::Heading(heading)) => {
                            if !self.shared.heading_enabled.load(Ordering::SeqCst) {
                                continue;
                            }
                            SourceEvent::Heading(heading)
                        }
                        None => {
                            let preview = String::from_utf8_lossy(&buffer[..len.min(40)]);
                            trace!(preview = %preview, "Dropping unparseable datagram");
                            continue;
                        }
                    }
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "UDP receive error");
                    SourceEvent::Failed(SourceError::Io(e))
                }
                Err(_) => {
                    // Only report silence after fixes have been flowing.
                    if fixes == 0 || signal_lost_reported {
                        continue;
                    }
                    signal_lost_reported = true;
                    SourceEvent::Failed(SourceError::SignalLost)
                }
            };

            let sent = tokio::select! {
                _ = self.token.cancelled() => break,
                sent = self.event_tx.send(event) => sent,
            };
            if sent.is_err() {
                debug!("Location event channel closed, stopping receiver");
                break;
            }
        }

        *self
            .shared
            .local_addr
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        info!(datagrams, fixes, "UDP location receiver stopped");
    }
}
