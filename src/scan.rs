//! Folder scanning.
//!
//! Produces the ordered file list the engine classifies. Only regular files
//! whose extension marks them as an image or video are kept; hidden entries
//! (leading `.`) are skipped, as are their contents when recursing.
//!
//! ```text
//! root/
//! ├── a.jpg            ✓
//! ├── notes.txt        ✗ not media
//! ├── .thumb.jpg       ✗ hidden
//! └── trip/
//!     └── b.mov        ✓ only with include_subfolders
//! ```
//!
//! Results are sorted by file name, with the full path as tie-breaker, so the
//! processing order is stable across platforms.

use crate::media::is_media_file;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Access denied: {0}")]
    AccessDenied(PathBuf),
    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),
}

/// List media files under `root`, recursing only when `include_subfolders`.
pub fn scan(root: &Path, include_subfolders: bool) -> Result<Vec<PathBuf>, ScanError> {
    check_root(root)?;

    let max_depth = if include_subfolders { usize::MAX } else { 1 };
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_media_file(entry.path()))
        .map(DirEntry::into_path)
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));
    log::info!("Found {} media files in {}", files.len(), root.display());
    Ok(files)
}

fn check_root(root: &Path) -> Result<(), ScanError> {
    if root.as_os_str().is_empty() {
        return Err(ScanError::InvalidPath(root.to_path_buf()));
    }
    let metadata = fs::metadata(root).map_err(|e| classify_io(root, &e))?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    fs::read_dir(root).map_err(|e| classify_io(root, &e))?;
    Ok(())
}

fn classify_io(root: &Path, error: &io::Error) -> ScanError {
    match error.kind() {
        io::ErrorKind::PermissionDenied => ScanError::AccessDenied(root.to_path_buf()),
        io::ErrorKind::NotADirectory => ScanError::NotADirectory(root.to_path_buf()),
        _ => ScanError::InvalidPath(root.to_path_buf()),
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}
