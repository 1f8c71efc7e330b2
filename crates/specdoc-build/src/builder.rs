//! Document builder.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use specdoc_config::{AssetsMode, Config};
use specdoc_render::{AssetMode, RenderOptions, Renderer};

use crate::BuildError;
use crate::clean::clean_output;

/// Summary of a successful build.
#[derive(Debug)]
pub struct BuildReport {
    /// Written files, relative to the output directory, sorted.
    pub files: Vec<PathBuf>,
    /// Source files the document was rendered from.
    pub dependencies: Vec<PathBuf>,
    pub duration: Duration,
}

/// Renders the entry document into the output directory.
///
/// All writes to the output directory go through one lock, so concurrent
/// `build` and `clean` calls on the same builder run one at a time.
pub struct Builder {
    renderer: Renderer,
    entry: PathBuf,
    output_dir: PathBuf,
    lock: Mutex<()>,
}

impl Builder {
    #[must_use]
    pub fn new(renderer: Renderer, entry: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            renderer,
            entry,
            output_dir,
            lock: Mutex::new(()),
        }
    }

    /// Create a builder for the entry point, output directory and render
    /// options of `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let options = RenderOptions {
            js: config.render.js_name().map(str::to_owned),
            css: config.render.css_name().map(str::to_owned),
            assets: match config.render.assets {
                AssetsMode::None => AssetMode::None,
                AssetsMode::External => AssetMode::External,
                AssetsMode::Inline => AssetMode::Inline,
            },
        };
        Self::new(
            Renderer::new(options),
            config.paths.entry.clone(),
            config.paths.output_dir.clone(),
        )
    }

    #[must_use]
    pub fn entry(&self) -> &Path {
        &self.entry
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render the entry document and write the result.
    ///
    /// Rendering completes in memory before anything is written, so a render
    /// error leaves the output directory untouched. The output directory is
    /// not cleaned first.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Render`] if the document cannot be rendered and
    /// [`BuildError::Write`] if an output file cannot be written. After a
    /// write error the output directory may be incomplete.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let start = Instant::now();

        let output = self.renderer.render(&self.entry)?;

        let mut files = Vec::with_capacity(output.files.len());
        for file in output.files {
            let target = self.output_dir.join(&file.path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|source| BuildError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&target, &file.contents).map_err(|source| BuildError::Write {
                path: target.clone(),
                source,
            })?;
            files.push(file.path);
        }

        let duration = start.elapsed();
        tracing::info!(
            entry = %self.entry.display(),
            output = %self.output_dir.display(),
            files = files.len(),
            elapsed_ms = duration.as_millis(),
            "Build complete"
        );

        Ok(BuildReport {
            files,
            dependencies: output.dependencies,
            duration,
        })
    }

    /// Empty the output directory while holding the build lock.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Clean`] if an entry cannot be removed.
    pub fn clean(&self) -> Result<(), BuildError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        clean_output(&self.output_dir)
    }
}
