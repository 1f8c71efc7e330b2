//! Specification document renderer.
//!
//! Turns an HTML-based specification source into a complete static page:
//!
//! - `<emu-import href>` splices other source files in place
//! - `<pre class="metadata">` supplies the title, status and other front matter
//! - `<emu-clause>`, `<emu-annex>` and `<emu-intro>` are numbered and listed
//!   in a table of contents
//! - `<emu-xref href="#id">` becomes a link labelled with the target's number
//! - `<emu-note>` gets a "Note" label
//! - `<emu-alg>` bodies are Markdown step lists with `_var_`, `*value*` and
//!   `~const~` shorthands
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use specdoc_render::{RenderOptions, Renderer};
//!
//! let renderer = Renderer::new(RenderOptions::default());
//! let output = renderer.render(Path::new("src/index.html")).unwrap();
//! for file in &output.files {
//!     println!("{}", file.path.display());
//! }
//! ```
//!
//! Rendering is a pure function of the source files and options: the same
//! inputs always produce byte-identical output.

mod algorithm;
mod assets;
mod error;
mod import;
mod metadata;
mod notes;
mod options;
mod page;
mod sections;
mod tokenizer;
mod tree;
mod util;
mod xref;

use std::path::{Path, PathBuf};

pub use assets::{SCRIPT, STYLESHEET};
pub use error::RenderError;
pub use metadata::Metadata;
pub use options::{AssetMode, RenderOptions};
pub use sections::{Section, SectionKind};
pub use util::{escape_html, slugify};

use import::Importer;
use page::Page;

/// Page file name used when the entry path has no file name.
const DEFAULT_PAGE_NAME: &str = "index.html";

/// A file produced by a render, relative to the output directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

/// Result of rendering one entry document.
#[derive(Debug)]
pub struct RenderOutput {
    /// Output files sorted by path.
    pub files: Vec<OutputFile>,
    /// Canonical paths of every source file read, sorted.
    pub dependencies: Vec<PathBuf>,
    /// Document metadata.
    pub metadata: Metadata,
    /// Section outline.
    pub outline: Vec<Section>,
}

/// Renders specification documents with fixed options.
#[derive(Clone, Debug, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    #[must_use]
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render the document at `entry` and everything it imports.
    ///
    /// Nothing is written to disk; the caller decides where the returned
    /// files go.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if a source file cannot be read, the markup is
    /// malformed, an import chain is cyclic, ids collide, a reference is
    /// unresolved or the metadata block is invalid.
    pub fn render(&self, entry: &Path) -> Result<RenderOutput, RenderError> {
        let mut importer = Importer::default();
        let nodes = importer.load(entry)?;

        let (head, mut body) = page::split_head(nodes);
        let metadata = metadata::extract(&mut body)?;
        let outline = sections::number_sections(&mut body)?;
        let targets = sections::collect_targets(&body, &outline)?;
        xref::resolve(&mut body, &targets)?;
        notes::label_notes(&mut body);
        algorithm::render_algorithms(&mut body);

        let page_name = entry
            .file_name()
            .map_or_else(|| PathBuf::from(DEFAULT_PAGE_NAME), PathBuf::from);
        let fallback_title = entry
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("index");

        let html = Page {
            head: &head,
            body: &body,
            metadata: &metadata,
            outline: &outline,
            options: &self.options,
            fallback_title,
        }
        .render();

        let mut files = vec![OutputFile {
            path: page_name,
            contents: html.into_bytes(),
        }];
        files.extend(self.asset_files());
        files.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::debug!(
            entry = %entry.display(),
            files = files.len(),
            dependencies = importer.dependencies.len(),
            "Rendered document"
        );

        Ok(RenderOutput {
            files,
            dependencies: importer.dependencies.into_iter().collect(),
            metadata,
            outline,
        })
    }

    /// Asset files written next to the page.
    fn asset_files(&self) -> Vec<OutputFile> {
        if self.options.assets == AssetMode::Inline {
            return Vec::new();
        }
        let css = self.options.css.as_ref().map(|name| OutputFile {
            path: PathBuf::from(name),
            contents: STYLESHEET.as_bytes().to_vec(),
        });
        let js = self.options.js.as_ref().map(|name| OutputFile {
            path: PathBuf::from(name),
            contents: SCRIPT.as_bytes().to_vec(),
        });
        css.into_iter().chain(js).collect()
    }
}
