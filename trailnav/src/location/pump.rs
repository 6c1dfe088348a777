//! Bridge from a source's event channel into the hub.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::hub::LocationHub;
use super::state::SourceEvent;

/// Spawn a task that forwards every [`SourceEvent`] to `hub` in arrival order.
///
/// The task ends when every sender of the channel has been dropped.
pub fn spawn_event_pump(
    hub: Arc<LocationHub>,
    mut events: mpsc::Receiver<SourceEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut forwarded: u64 = 0;
        while let Some(event) = events.recv().await {
            forwarded += 1;
            match event {
                SourceEvent::Location(fix) => hub.receive_location(fix),
                SourceEvent::Heading(heading) => hub.receive_heading(heading),
                SourceEvent::Failed(error) => hub.receive_failure(error),
            }
        }
        tracing::debug!(forwarded, "Location event pump stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryKeyValueStore;
    use crate::location::{
        AuthorizationStatus, HeadingFix, LocationFix, LocationHubConfig, LocationSource,
        SourceError, TrackLogRecorder,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct IdleSource;

    impl LocationSource for IdleSource {
        fn start_updating_location(&self) {}
        fn stop_updating_location(&self) {}
        fn start_updating_heading(&self) {}
        fn stop_updating_heading(&self) {}
        fn authorization_status(&self) -> AuthorizationStatus {
            AuthorizationStatus::AuthorizedAlways
        }
    }

    #[tokio::test]
    async fn test_pump_forwards_events_in_order() {
        let hub = Arc::new(LocationHub::new(
            Arc::new(IdleSource),
            Arc::new(TrackLogRecorder::new()),
            Arc::new(MemoryKeyValueStore::new()),
            LocationHubConfig::default(),
        ));
        hub.set_requesting_location_updates(true);
        hub.start_updating_heading();
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failures);
        hub.set_failure_handler(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let (tx, rx) = mpsc::channel(8);
        let pump = spawn_event_pump(Arc::clone(&hub), rx);

        tx.send(SourceEvent::Location(LocationFix::new(1.0, 1.0)))
            .await
            .unwrap();
        tx.send(SourceEvent::Failed(SourceError::SignalLost))
            .await
            .unwrap();
        tx.send(SourceEvent::Location(LocationFix::new(2.0, 2.0)))
            .await
            .unwrap();
        tx.send(SourceEvent::Heading(HeadingFix::new(180.0)))
            .await
            .unwrap();
        drop(tx);
        pump.await.unwrap();

        assert_eq!(hub.last_reported_location().unwrap().latitude, 2.0);
        assert_eq!(hub.last_reported_heading().unwrap().true_heading, 180.0);
        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }
}
