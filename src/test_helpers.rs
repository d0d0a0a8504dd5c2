//! Shared test utilities.
//!
//! Filesystem fixtures (empty media files, real PNGs with chosen dimensions),
//! directory listings for assertions, and a [`RecordingSink`] that captures
//! engine events and can run a hook per processed file (handy for pausing or
//! cancelling mid-run).
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let files = touch_files(tmp.path(), &["a.jpg", "b.mp4"]);
//! let sink = RecordingSink::new().on_file(|index| println!("{index}"));
//! ```

use crate::events::{ClassificationEvent, EventSink};
use crate::types::{ClassificationResult, ClassificationSummary};
use image::{ImageBuffer, Rgb};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// =========================================================================
// Fixture setup
// =========================================================================

/// Create empty files named `names` inside `dir` (created if missing) and
/// return their paths in the given order.
pub fn touch_files(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    fs::create_dir_all(dir).unwrap();
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, b"").unwrap();
            path
        })
        .collect()
}

/// Write a solid-colour PNG of the given size.
pub fn write_png(path: &Path, width: u32, height: u32) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let img = ImageBuffer::from_pixel(width, height, Rgb([90u8, 140, 200]));
    img.save(path).unwrap();
    path.to_path_buf()
}

// =========================================================================
// Listings
// =========================================================================

/// Sorted entry names directly inside `dir`; empty if `dir` is missing.
pub fn listing(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Sorted relative paths of every file under `dir`.
pub fn tree(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(dir)
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    files.sort();
    files
}

// =========================================================================
// Event capture
// =========================================================================

type FileHook = Box<dyn Fn(usize) + Send + Sync>;

/// Records every event it receives. An optional hook runs after each
/// processed file with that file's 1-based index.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ClassificationEvent>>,
    hook: Option<FileHook>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_file(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn events(&self) -> Vec<ClassificationEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn on_start(&self, total_files: usize) {
        self.events
            .lock()
            .unwrap()
            .push(ClassificationEvent::Started { total_files });
    }

    fn on_file_processed(&self, index: usize, total: usize, result: &ClassificationResult) {
        self.events
            .lock()
            .unwrap()
            .push(ClassificationEvent::FileProcessed {
                index,
                total,
                result: result.clone(),
            });
        if let Some(hook) = &self.hook {
            hook(index);
        }
    }

    fn on_completed(&self, summary: &ClassificationSummary) {
        self.events
            .lock()
            .unwrap()
            .push(ClassificationEvent::Completed {
                summary: summary.clone(),
            });
    }
}
