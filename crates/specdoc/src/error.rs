//! CLI error types.

use specdoc_config::ConfigError;
use specdoc_tasks::TaskError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Task(#[from] TaskError),
}
