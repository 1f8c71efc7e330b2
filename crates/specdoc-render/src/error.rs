//! Render error types.

use std::path::PathBuf;

use crate::tree::Span;

/// Error returned when a document cannot be rendered.
///
/// Every variant aborts the render; no partial output is produced.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A source file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The markup is not well formed or uses a construct incorrectly.
    #[error("{}:{line}:{column}: {message}", file.display())]
    Markup {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// An `<emu-import>` chain refers back to a file already being imported.
    #[error("Import cycle: {}", format_chain(chain))]
    ImportCycle { chain: Vec<PathBuf> },

    /// Two elements share the same `id`.
    #[error("{}:{line}:{column}: duplicate id \"{id}\"", file.display())]
    DuplicateId {
        id: String,
        file: PathBuf,
        line: usize,
        column: usize,
    },

    /// An `<emu-xref>` points at an id that does not exist.
    #[error("{}:{line}:{column}: unresolved reference \"#{id}\"", file.display())]
    UnknownReference {
        id: String,
        file: PathBuf,
        line: usize,
        column: usize,
    },

    /// The `<pre class="metadata">` block is not valid YAML.
    #[error("{}: invalid metadata: {message}", file.display())]
    Metadata { file: PathBuf, message: String },
}

impl RenderError {
    pub(crate) fn markup(span: &Span, message: impl Into<String>) -> Self {
        Self::Markup {
            file: span.file.to_path_buf(),
            line: span.line,
            column: span.column,
            message: message.into(),
        }
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_error_display_has_position() {
        let err = RenderError::Markup {
            file: PathBuf::from("src/index.html"),
            line: 3,
            column: 7,
            message: "unclosed <emu-clause>".to_owned(),
        };
        assert_eq!(err.to_string(), "src/index.html:3:7: unclosed <emu-clause>");
    }

    #[test]
    fn test_import_cycle_display() {
        let err = RenderError::ImportCycle {
            chain: vec![PathBuf::from("a.html"), PathBuf::from("b.html"), PathBuf::from("a.html")],
        };
        assert_eq!(err.to_string(), "Import cycle: a.html -> b.html -> a.html");
    }
}
