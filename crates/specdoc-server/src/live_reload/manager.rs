//! Live reload broadcaster.

use std::path::Path;

use serde::Serialize;
use specdoc_watch::{ChangeEvent, ChangeStream, WatchError};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Buffered events per client before a slow client starts lagging.
const CHANNEL_CAPACITY: usize = 100;

/// Event sent to connected WebSocket clients when an output file changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReloadEvent {
    /// Absolute path of the changed file.
    pub path: String,
}

/// Fans out reload events to connected clients.
pub(crate) struct LiveReload {
    broadcaster: broadcast::Sender<ReloadEvent>,
}

impl LiveReload {
    pub(crate) fn new() -> Self {
        let (broadcaster, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { broadcaster }
    }

    /// Get a receiver for reload events.
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.broadcaster.subscribe()
    }

    /// Forward changes from `changes` to all subscribers.
    ///
    /// The task ends with the watch error if the watch fails, or `None` if the
    /// stream closes.
    pub(crate) fn spawn(&self, mut changes: ChangeStream) -> JoinHandle<Option<WatchError>> {
        let broadcaster = self.broadcaster.clone();
        tokio::spawn(async move {
            while let Some(batch) = changes.next_batch().await {
                let batch = match batch {
                    Ok(batch) => batch,
                    Err(e) => return Some(e),
                };
                for event in reload_events(changes.root(), &batch) {
                    tracing::info!(path = %event.path, "Live reload");
                    // No connected clients is fine.
                    let _ = broadcaster.send(event);
                }
            }
            None
        })
    }
}

/// One reload event per changed file, carrying its absolute path.
fn reload_events(root: &Path, batch: &[ChangeEvent]) -> Vec<ReloadEvent> {
    batch
        .iter()
        .map(|change| ReloadEvent {
            path: root.join(&change.path).display().to_string(),
        })
        .collect()
}
