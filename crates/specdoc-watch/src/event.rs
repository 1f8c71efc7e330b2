//! Change event types.

use std::path::PathBuf;

/// Kind of filesystem change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChangeKind {
    /// File was created.
    Created,
    /// File was modified.
    Modified,
    /// File was removed.
    Removed,
}

/// A filesystem change below the watched root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Path relative to the watched root (e.g., "index.html", "parts/intro.html").
    pub path: PathBuf,
    /// Kind of change.
    pub kind: ChangeKind,
}
