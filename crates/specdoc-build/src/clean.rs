//! Output directory cleaning.

use std::fs;
use std::io;
use std::path::Path;

use crate::BuildError;

/// Delete everything below `dir`, leaving the directory itself in place.
///
/// A missing or empty directory is a successful no-op.
///
/// # Errors
///
/// Returns [`BuildError::Clean`] for the first entry that cannot be read or
/// removed. Entries removed before the failure stay removed.
pub fn clean_output(dir: &Path) -> Result<(), BuildError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(source) => return Err(clean_error(dir, source)),
    };

    let mut removed = 0usize;
    for entry in entries {
        let entry = entry.map_err(|source| clean_error(dir, source))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|source| clean_error(&path, source))?;
        let result = if file_type.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|source| clean_error(&path, source))?;
        removed += 1;
    }

    tracing::info!(dir = %dir.display(), removed, "Cleaned output directory");
    Ok(())
}

fn clean_error(path: &Path, source: io::Error) -> BuildError {
    BuildError::Clean {
        path: path.to_path_buf(),
        source,
    }
}
