//! Native probe: `image` + `kamadak-exif` for stills, `ffprobe` for video.
//!
//! | Kind | Dimensions | Rotation |
//! |---|---|---|
//! | Image | `image::ImageReader::into_dimensions` (header only) | EXIF `Orientation` 5–8 |
//! | AVIF | `avif-parse` primary item sequence header | EXIF `Orientation` 5–8 |
//! | Video | `ffprobe` stream width/height | `rotate` tag / display matrix |
//!
//! Image formats are recognised by their magic bytes first and by extension
//! second, so a PNG saved as `.jpg` still measures. Containers `image` cannot
//! identify at all (HEIC/HEIF) are reported as unsupported.

use super::backend::{MediaDimensions, MediaProbe, ProbeError};
use super::ffprobe;
use crate::media::MediaKind;
use image::{ImageFormat, ImageReader};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeProbe;

impl NativeProbe {
    pub fn new() -> Self {
        Self
    }
}

impl MediaProbe for NativeProbe {
    fn probe(&self, path: &Path) -> Result<MediaDimensions, ProbeError> {
        let dims = match MediaKind::from_path(path) {
            Some(MediaKind::Image) => probe_image(path),
            Some(MediaKind::Video) => ffprobe::probe_video(path),
            None => Err(ProbeError::UnsupportedType(path.to_path_buf())),
        };
        match &dims {
            Ok(d) => log::debug!("{}: {}x{}", path.display(), d.width, d.height),
            Err(e) => log::debug!("probe failed: {e}"),
        }
        dims
    }
}

fn probe_image(path: &Path) -> Result<MediaDimensions, ProbeError> {
    let unreadable = |e: std::io::Error| ProbeError::UnreadableFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    let reader = ImageReader::open(path)
        .map_err(unreadable)?
        .with_guessed_format()
        .map_err(unreadable)?;

    let (width, height) = match reader.format() {
        Some(ImageFormat::Avif) => avif_dimensions(path)?,
        Some(_) => reader
            .into_dimensions()
            .map_err(|_| ProbeError::UnreadableDimensions(path.to_path_buf()))?,
        None => return Err(ProbeError::UnsupportedType(path.to_path_buf())),
    };
    let dims = MediaDimensions::new(width as f64, height as f64)
        .ok_or_else(|| ProbeError::UnreadableDimensions(path.to_path_buf()))?;

    Ok(match read_orientation(path) {
        Some(orientation) if is_quarter_turn(orientation) => dims.rotated(),
        _ => dims,
    })
}

/// AVIF size from the primary item's AV1 sequence header; nothing is decoded.
fn avif_dimensions(path: &Path) -> Result<(u32, u32), ProbeError> {
    let data = std::fs::read(path).map_err(|e| ProbeError::UnreadableFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let avif = avif_parse::read_avif(&mut Cursor::new(&data)).map_err(|e| {
        log::debug!("{}: not a readable AVIF: {e:?}", path.display());
        ProbeError::UnreadableDimensions(path.to_path_buf())
    })?;
    let meta = avif.primary_item_metadata().map_err(|e| {
        log::debug!("{}: no AV1 sequence header: {e:?}", path.display());
        ProbeError::UnreadableDimensions(path.to_path_buf())
    })?;
    Ok((meta.max_frame_width.get(), meta.max_frame_height.get()))
}

/// EXIF orientation tag, if the file carries one.
fn read_orientation(path: &Path) -> Option<u32> {
    let file = File::open(path).ok()?;
    let exif = exif::Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .ok()?;
    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?
        .value
        .get_uint(0)
}

/// Orientations 5–8 are transposes or 90°/270° rotations.
fn is_quarter_turn(orientation: u32) -> bool {
    matches!(orientation, 5..=8)
}
