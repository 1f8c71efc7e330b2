//! Output cleaning and document building.
//!
//! [`clean_output`] empties the output directory. [`Builder`] renders the
//! entry document with `specdoc-render` and writes the result, serializing
//! all writes to the output directory.

mod builder;
mod clean;

use std::path::PathBuf;

pub use builder::{BuildReport, Builder};
pub use clean::clean_output;
pub use specdoc_render::RenderError;

/// Error returned by clean and build operations.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// An entry of the output directory could not be removed.
    #[error("Failed to clean {}: {source}", path.display())]
    Clean {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document could not be rendered.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// A rendered file could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
