//! File placement with conflict handling.
//!
//! Given the destination a file *should* land at, [`transfer`] decides where
//! it *does* land and performs the copy or move:
//!
//! | Destination free? | Policy | Effect |
//! |---|---|---|
//! | yes | any | place at destination |
//! | no | `Skip` | fail with [`OperationError::FileSkipped`] |
//! | no | `Overwrite` | delete existing file, place at destination |
//! | no | `Rename` | place at first free `name_1.ext`, `name_2.ext`, … |
//!
//! Moves try `rename` first and fall back to copy + delete when the
//! destination is on another filesystem.

use crate::types::ConflictResolution;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum OperationError {
    #[error("File skipped, destination already exists: {0}")]
    FileSkipped(PathBuf),
    #[error("Cannot create directory {path}: {source}")]
    CannotCreateDirectory {
        path: PathBuf,
        source: Arc<io::Error>,
    },
    #[error("File operation failed for {path}: {source}")]
    FileOperationFailed {
        path: PathBuf,
        source: Arc<io::Error>,
    },
}

impl OperationError {
    pub(crate) fn failed(path: &Path, error: io::Error) -> Self {
        Self::FileOperationFailed {
            path: path.to_path_buf(),
            source: Arc::new(error),
        }
    }
}

/// The filesystem effect of a non-dry run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Copy,
    Move,
}

/// Create `dir` and any missing parents.
pub fn ensure_directory(dir: &Path) -> Result<(), OperationError> {
    fs::create_dir_all(dir).map_err(|e| OperationError::CannotCreateDirectory {
        path: dir.to_path_buf(),
        source: Arc::new(e),
    })
}

/// Place `source` at `desired` (or a renamed sibling) and return the path
/// actually used.
pub fn transfer(
    source: &Path,
    desired: &Path,
    operation: FileOperation,
    policy: ConflictResolution,
) -> Result<PathBuf, OperationError> {
    if policy == ConflictResolution::Overwrite && is_same_file(source, desired) {
        return Err(OperationError::failed(
            source,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "source and destination are the same file",
            ),
        ));
    }
    let destination = resolve_destination(desired, policy)?;
    perform(source, &destination, operation)?;
    log::debug!(
        "{:?} {} -> {}",
        operation,
        source.display(),
        destination.display()
    );
    Ok(destination)
}

/// Apply the conflict policy to `desired` and return the effective path.
///
/// `Overwrite` removes the existing file here, before the operation runs.
pub fn resolve_destination(
    desired: &Path,
    policy: ConflictResolution,
) -> Result<PathBuf, OperationError> {
    if !path_exists(desired) {
        return Ok(desired.to_path_buf());
    }
    match policy {
        ConflictResolution::Skip => Err(OperationError::FileSkipped(desired.to_path_buf())),
        ConflictResolution::Overwrite => {
            fs::remove_file(desired).map_err(|e| OperationError::failed(desired, e))?;
            Ok(desired.to_path_buf())
        }
        ConflictResolution::Rename => Ok(next_available_path(desired)),
    }
}

/// First `stem_N.ext` (N = 1, 2, …) beside `path` that does not exist.
pub fn next_available_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("file"));
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    (1..)
        .map(|index| {
            let name = match &extension {
                Some(ext) => format!("{stem}_{index}.{ext}"),
                None => format!("{stem}_{index}"),
            };
            parent.join(name)
        })
        .find(|candidate| !path_exists(candidate))
        .unwrap_or_else(|| path.to_path_buf())
}

fn perform(source: &Path, destination: &Path, operation: FileOperation) -> Result<(), OperationError> {
    match operation {
        FileOperation::Copy => fs::copy(source, destination)
            .map(|_| ())
            .map_err(|e| OperationError::failed(source, e)),
        FileOperation::Move => move_file(source, destination),
    }
}

fn move_file(source: &Path, destination: &Path) -> Result<(), OperationError> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!(
                "{} is on another filesystem, copying instead",
                destination.display()
            );
            copy_then_remove(source, destination)
        }
        Err(e) => Err(OperationError::failed(source, e)),
    }
}

/// Move by copy + delete. Either step failing leaves only the source; a file
/// already at `destination` before the copy is never removed here.
fn copy_then_remove(source: &Path, destination: &Path) -> Result<(), OperationError> {
    let preexisting = path_exists(destination);
    let discard_partial = || {
        if !preexisting {
            let _ = fs::remove_file(destination);
        }
    };
    fs::copy(source, destination).map_err(|e| {
        discard_partial();
        OperationError::failed(source, e)
    })?;
    fs::remove_file(source).map_err(|e| {
        discard_partial();
        OperationError::failed(source, e)
    })
}

/// Dangling symlinks count as existing so they are never clobbered silently.
fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
