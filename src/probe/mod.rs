//! Media dimension probing.
//!
//! - **Backend**: [`MediaProbe`] trait, [`MediaDimensions`], [`ProbeError`]
//! - **Native**: [`NativeProbe`], the production implementation
//! - **ffprobe**: video stream parsing used by the native probe

pub mod backend;
mod ffprobe;
pub mod native;

pub use backend::{MediaDimensions, MediaProbe, ProbeError};
pub use native::NativeProbe;
