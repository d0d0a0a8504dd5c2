//! Media kind detection by file extension.
//!
//! The scanner uses this to pick candidate files and the probe uses it to
//! choose between the image and video readers. Matching is case-insensitive.
//! HEIC/HEIF are listed so they show up in a run's failures instead of being
//! silently left behind; the native probe cannot measure them.

use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp", "heic", "heif", "avif",
];

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "mov", "avi", "mkv", "webm", "3gp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Kind of the file at `path`, or `None` when it is not an image or video.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else {
            None
        }
    }
}

pub fn is_media_file(path: &Path) -> bool {
    MediaKind::from_path(path).is_some()
}
