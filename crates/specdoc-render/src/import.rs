//! `<emu-import>` resolution.
//!
//! Loads a document and splices the contents of every imported file into
//! its `<emu-import>` element, transitively. Paths are resolved relative to
//! the importing file.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::RenderError;
use crate::tree::{self, Node};

/// Loads a document tree and tracks every file it reads.
#[derive(Default)]
pub(crate) struct Importer {
    /// Files currently being loaded, outermost first.
    stack: Vec<PathBuf>,
    /// Every file read so far.
    pub dependencies: BTreeSet<PathBuf>,
}

impl Importer {
    pub(crate) fn load(&mut self, path: &Path) -> Result<Vec<Node>, RenderError> {
        let src = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let canonical = path.canonicalize().map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if self.stack.contains(&canonical) {
            let mut chain = self.stack.clone();
            chain.push(canonical);
            return Err(RenderError::ImportCycle { chain });
        }

        tracing::debug!(path = %path.display(), "Loading document");
        self.dependencies.insert(canonical.clone());
        self.stack.push(canonical);

        let file: Arc<Path> = Arc::from(path);
        let mut nodes = tree::parse(&src, &file)?;
        let base = path.parent().unwrap_or(Path::new("."));
        self.resolve_imports(&mut nodes, base)?;

        self.stack.pop();
        Ok(nodes)
    }

    fn resolve_imports(&mut self, nodes: &mut [Node], base: &Path) -> Result<(), RenderError> {
        for node in nodes {
            let Node::Element(element) = node else {
                continue;
            };
            if element.is("emu-import") {
                let href = element
                    .attr("href")
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| {
                        RenderError::markup(&element.span, "<emu-import> requires an href attribute")
                    })?;
                let target = base.join(href);
                if !target.is_file() {
                    return Err(RenderError::markup(
                        &element.span,
                        format!("imported file not found: {}", target.display()),
                    ));
                }
                element.children = self.load(&target)?;
            } else {
                self.resolve_imports(&mut element.children, base)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn to_html(nodes: &[Node]) -> String {
        let mut out = String::new();
        tree::serialize(nodes, &mut out);
        out
    }

    #[test]
    fn test_imports_are_spliced_transitively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("parts")).unwrap();
        std::fs::write(
            dir.path().join("index.html"),
            "<emu-import href=\"parts/a.html\"></emu-import>",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("parts/a.html"),
            "<p>A</p><emu-import href=\"b.html\"></emu-import>",
        )
        .unwrap();
        std::fs::write(dir.path().join("parts/b.html"), "<p>B</p>").unwrap();

        let mut importer = Importer::default();
        let nodes = importer.load(&dir.path().join("index.html")).unwrap();

        assert_eq!(
            to_html(&nodes),
            "<emu-import href=\"parts/a.html\"><p>A</p><emu-import href=\"b.html\"><p>B</p></emu-import></emu-import>"
        );
        assert_eq!(importer.dependencies.len(), 3);
    }

    #[test]
    fn test_missing_import_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("index.html"),
            "<emu-import href=\"nope.html\"></emu-import>",
        )
        .unwrap();

        let err = Importer::default()
            .load(&dir.path().join("index.html"))
            .unwrap_err();
        assert!(err.to_string().contains("imported file not found"));
    }

    #[test]
    fn test_import_cycle_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.html"),
            "<emu-import href=\"b.html\"></emu-import>",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.html"),
            "<emu-import href=\"a.html\"></emu-import>",
        )
        .unwrap();

        let err = Importer::default()
            .load(&dir.path().join("a.html"))
            .unwrap_err();
        let RenderError::ImportCycle { chain } = err else {
            panic!("expected import cycle, got {err:?}");
        };
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.first(), chain.last());
    }

    #[test]
    fn test_same_file_imported_twice_is_not_a_cycle() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("index.html"),
            "<emu-import href=\"a.html\"></emu-import><emu-import href=\"a.html\"></emu-import>",
        )
        .unwrap();
        std::fs::write(dir.path().join("a.html"), "<p>A</p>").unwrap();

        let nodes = Importer::default()
            .load(&dir.path().join("index.html"))
            .unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_import_without_href() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<emu-import></emu-import>").unwrap();

        let err = Importer::default()
            .load(&dir.path().join("index.html"))
            .unwrap_err();
        assert!(err.to_string().contains("requires an href"));
    }
}
