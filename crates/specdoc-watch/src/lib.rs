//! Debounced filesystem watching.
//!
//! [`Watcher`] observes a directory tree with `notify`, keeps the events whose
//! relative path matches one of its glob patterns and delivers them to a
//! single consumer as batches over a [`ChangeStream`].
//!
//! With a non-zero debounce duration, events are coalesced per path and
//! released as one batch once the tree has been quiet for that long. With a
//! zero duration every raw event is its own batch.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use specdoc_watch::Watcher;
//!
//! # async fn run() -> Result<(), specdoc_watch::WatchError> {
//! let watcher = Watcher::new("src", &["**/*.html".to_owned()], Duration::from_millis(100))?;
//! let mut changes = watcher.start()?;
//! while let Some(batch) = changes.next_batch().await {
//!     for event in batch? {
//!         tracing::info!(path = %event.path.display(), kind = ?event.kind, "Changed");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod debouncer;
mod event;

use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;
use std::time::Duration;

use glob::Pattern;
use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecursiveMode, Watcher as _};
use tokio::sync::mpsc as async_mpsc;

use crate::debouncer::EventDebouncer;
pub use crate::event::{ChangeEvent, ChangeKind};

/// Interval at which the drain thread checks for a finished quiet period.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Error raised while setting up or running a watch.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// A watch pattern is not a valid glob.
    #[error("Invalid watch pattern \"{pattern}\": {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// The watched root cannot be resolved.
    #[error("Cannot watch {}: {source}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The watched root was removed while watching.
    #[error("Watched directory was removed: {}", path.display())]
    RootRemoved { path: PathBuf },

    /// The platform watcher reported an error.
    #[error("Watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// One delivery on a [`ChangeStream`].
pub type ChangeBatch = Result<Vec<ChangeEvent>, WatchError>;

/// Configured, not yet started, directory watch.
#[derive(Debug)]
pub struct Watcher {
    root: PathBuf,
    patterns: Vec<Pattern>,
    debounce: Duration,
}

impl Watcher {
    /// Create a watcher for `root`.
    ///
    /// An empty pattern list matches every path.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Pattern`] if a pattern is not a valid glob.
    pub fn new(
        root: impl Into<PathBuf>,
        patterns: &[String],
        debounce: Duration,
    ) -> Result<Self, WatchError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|source| WatchError::Pattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            root: root.into(),
            patterns,
            debounce,
        })
    }

    /// Start watching.
    ///
    /// The root must exist. Watching stops when the returned stream is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Root`] if the root cannot be resolved, or
    /// [`WatchError::Notify`] if the platform watcher cannot be installed.
    pub fn start(self) -> Result<ChangeStream, WatchError> {
        let root = self.root.canonicalize().map_err(|source| WatchError::Root {
            path: self.root.clone(),
            source,
        })?;

        let (event_tx, event_rx) = async_mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let immediate = self.debounce.is_zero();
        let debouncer = Arc::new(EventDebouncer::new(self.debounce));

        let filter = PathFilter {
            root: root.clone(),
            patterns: self.patterns,
        };
        let debouncer_for_watcher = Arc::clone(&debouncer);
        let tx_for_watcher = event_tx.clone();

        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        let _ = tx_for_watcher.send(Err(WatchError::Notify(e)));
                        return;
                    }
                };
                for (path, kind) in classify(&event) {
                    if kind == ChangeKind::Removed && path == filter.root {
                        let _ = tx_for_watcher.send(Err(WatchError::RootRemoved { path }));
                        return;
                    }
                    let Some(relative) = filter.relative(&path) else {
                        continue;
                    };
                    tracing::debug!(path = %relative.display(), ?kind, "Filesystem event");
                    if immediate {
                        let _ = tx_for_watcher.send(Ok(vec![ChangeEvent {
                            path: relative,
                            kind,
                        }]));
                    } else {
                        debouncer_for_watcher.record(relative, kind);
                    }
                }
            })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        tracing::debug!(root = %root.display(), "Watching directory");

        let drain = std::thread::spawn(move || {
            // Keep the watcher alive for as long as this thread runs.
            let _watcher = watcher;

            loop {
                match shutdown_rx.recv_timeout(POLL_INTERVAL) {
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                }

                let batch: Vec<ChangeEvent> = debouncer
                    .drain_ready()
                    .into_iter()
                    .map(|(path, kind)| ChangeEvent { path, kind })
                    .collect();
                if batch.is_empty() {
                    continue;
                }
                if event_tx.send(Ok(batch)).is_err() {
                    // Consumer dropped
                    return;
                }
            }
        });

        Ok(ChangeStream {
            root,
            rx: event_rx,
            shutdown: shutdown_tx,
            drain: Some(drain),
        })
    }
}

/// Receiving end of a running watch.
///
/// Dropping the stream stops the watch and releases the platform watcher
/// before `drop` returns.
pub struct ChangeStream {
    root: PathBuf,
    rx: async_mpsc::UnboundedReceiver<ChangeBatch>,
    shutdown: mpsc::Sender<()>,
    drain: Option<JoinHandle<()>>,
}

impl Drop for ChangeStream {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(drain) = self.drain.take()
            && drain.join().is_err()
        {
            tracing::error!(root = %self.root.display(), "Watch thread panicked");
        }
    }
}

impl ChangeStream {
    /// Canonical path of the watched root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Wait for the next batch of changes.
    ///
    /// Returns `None` once the watch has stopped.
    pub async fn next_batch(&mut self) -> Option<ChangeBatch> {
        self.rx.recv().await
    }
}

struct PathFilter {
    root: PathBuf,
    patterns: Vec<Pattern>,
}

impl PathFilter {
    /// Path relative to the root if it matches the patterns.
    fn relative(&self, path: &Path) -> Option<PathBuf> {
        let relative = path.strip_prefix(&self.root).ok()?;
        if relative.as_os_str().is_empty() {
            return None;
        }
        let matches = self.patterns.is_empty()
            || self.patterns.iter().any(|p| p.matches_path(relative));
        matches.then(|| relative.to_path_buf())
    }
}

/// Map a notify event to per-path change kinds.
///
/// Renames become a removal of the old path and a creation of the new one.
/// Access and other non-mutating events are ignored.
fn classify(event: &notify::Event) -> Vec<(PathBuf, ChangeKind)> {
    let single = |kind: ChangeKind| -> Vec<(PathBuf, ChangeKind)> {
        event.paths.iter().map(|p| (p.clone(), kind)).collect()
    };
    match event.kind {
        EventKind::Create(_) => single(ChangeKind::Created),
        EventKind::Remove(_) => single(ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => single(ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => single(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [from, to] => vec![
                (from.clone(), ChangeKind::Removed),
                (to.clone(), ChangeKind::Created),
            ],
            _ => single(ChangeKind::Modified),
        },
        EventKind::Modify(_) => single(ChangeKind::Modified),
        _ => Vec::new(),
    }
}
