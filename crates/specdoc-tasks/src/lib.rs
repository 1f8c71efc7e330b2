//! Task graph and runner.
//!
//! specdoc's commands are named tasks in an explicit [`TaskGraph`]. A
//! [`TaskRunner`] executes a task by name, resolving aliases and running
//! composite steps in series or in parallel, and records a [`TaskState`] for
//! every task it visits. The leaf actions (clean, build, watch, serve) come
//! from an [`Actions`] implementation; [`DocActions`] performs them for real.

mod actions;
mod graph;
mod runner;

pub use actions::{Actions, DocActions, rebuild_on_change};
pub use graph::{Action, DEFAULT_TASK, Step, Task, TaskBody, TaskGraph};
pub use runner::{TaskRunner, TaskState};

use specdoc_build::BuildError;
use specdoc_server::ServerError;
use specdoc_watch::WatchError;

/// Error raised while validating or running tasks.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// No task with this name exists.
    #[error("Unknown task \"{0}\"")]
    UnknownTask(String),

    /// Two tasks share a name.
    #[error("Task \"{0}\" is defined more than once")]
    DuplicateTask(String),

    /// A task refers to a task that does not exist.
    #[error("Task \"{task}\" refers to unknown task \"{reference}\"")]
    UnknownReference { task: String, reference: String },

    /// Tasks refer to each other in a loop.
    #[error("Task cycle: {}", chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error(transparent)]
    Server(#[from] ServerError),

    /// A task panicked or was cancelled.
    #[error("Task \"{task}\" did not complete: {message}")]
    Aborted { task: String, message: String },
}
