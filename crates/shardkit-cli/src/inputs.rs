//! Input path expansion.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Inputs after expanding directories
#[derive(Debug, Default)]
pub struct Inputs {
    /// Regular files, in argument order; directory contents sorted by name
    pub files: Vec<PathBuf>,
    /// Arguments that were neither a file nor a directory
    pub skipped: Vec<PathBuf>,
}

/// Expand each argument: files pass through, directories contribute their
/// immediate regular files, anything else is skipped
///
/// # Errors
///
/// Returns an error if a directory cannot be listed.
pub fn expand(paths: &[PathBuf]) -> io::Result<Inputs> {
    let mut inputs = Inputs::default();

    for path in paths {
        if path.is_dir() {
            let mut entries = list_files(path)?;
            tracing::debug!("{} expands to {} files", path.display(), entries.len());
            inputs.files.append(&mut entries);
        } else if path.is_file() {
            inputs.files.push(path.clone());
        } else {
            inputs.skipped.push(path.clone());
        }
    }

    Ok(inputs)
}

fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    // Chunk artifacts sort lexically into index order
    files.sort();
    Ok(files)
}
