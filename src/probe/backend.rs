//! Metadata probe trait and shared types.
//!
//! The [`MediaProbe`] trait is the single operation the engine needs from the
//! outside world: pixel dimensions for a file, already corrected for
//! rotation metadata. The production implementation is
//! [`NativeProbe`](super::native::NativeProbe).

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    #[error("Unsupported media type: {0}")]
    UnsupportedType(PathBuf),
    #[error("Cannot read file {path}: {reason}")]
    UnreadableFile { path: PathBuf, reason: String },
    #[error("Cannot read metadata of {path}: {reason}")]
    UnreadableMetadata { path: PathBuf, reason: String },
    #[error("Cannot determine dimensions of {0}")]
    UnreadableDimensions(PathBuf),
    #[error("No video track in {0}")]
    NoVisualTrack(PathBuf),
}

/// Display dimensions of a media file, both strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaDimensions {
    pub width: f64,
    pub height: f64,
}

impl MediaDimensions {
    /// `None` unless both sides are finite and positive.
    pub fn new(width: f64, height: f64) -> Option<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        (valid(width) && valid(height)).then_some(Self { width, height })
    }

    pub fn is_valid(&self) -> bool {
        Self::new(self.width, self.height).is_some()
    }

    /// Width and height exchanged, for quarter-turn orientations.
    pub fn rotated(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// Source of media dimensions.
///
/// `Sync` so a probe can be shared with a worker thread behind a reference.
pub trait MediaProbe: Sync {
    fn probe(&self, path: &Path) -> Result<MediaDimensions, ProbeError>;
}

impl<P: MediaProbe + ?Sized> MediaProbe for &P {
    fn probe(&self, path: &Path) -> Result<MediaDimensions, ProbeError> {
        (**self).probe(path)
    }
}
