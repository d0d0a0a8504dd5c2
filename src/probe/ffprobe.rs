//! Video dimensions via `ffprobe`.
//!
//! Runs `ffprobe -show_streams -of json` and reads the first real video
//! stream (cover-art streams flagged `attached_pic` are ignored). Rotation
//! comes from either the legacy `rotate` tag or the display-matrix side data;
//! a quarter turn swaps width and height.

use super::backend::{MediaDimensions, ProbeError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

const FFPROBE: &str = "ffprobe";

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<Stream>,
}

#[derive(Debug, Deserialize)]
struct Stream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    side_data_list: Vec<SideData>,
    #[serde(default)]
    disposition: HashMap<String, i64>,
}

#[derive(Debug, Deserialize)]
struct SideData {
    rotation: Option<f64>,
}

impl Stream {
    fn is_video(&self) -> bool {
        self.codec_type.as_deref() == Some("video")
            && self.disposition.get("attached_pic").copied().unwrap_or(0) == 0
    }

    fn rotation(&self) -> f64 {
        self.side_data_list
            .iter()
            .find_map(|side| side.rotation)
            .or_else(|| self.tags.get("rotate").and_then(|r| r.trim().parse().ok()))
            .unwrap_or(0.0)
    }
}

/// Probe a video file by running `ffprobe`.
pub fn probe_video(path: &Path) -> Result<MediaDimensions, ProbeError> {
    if !path.is_file() {
        return Err(ProbeError::UnreadableFile {
            path: path.to_path_buf(),
            reason: "not a readable file".to_string(),
        });
    }
    let output = Command::new(FFPROBE)
        .args(["-v", "error", "-show_streams", "-of", "json"])
        .arg(path)
        .output()
        .map_err(|e| ProbeError::UnreadableMetadata {
            path: path.to_path_buf(),
            reason: format!("failed to run {FFPROBE}: {e}"),
        })?;
    if !output.status.success() {
        return Err(ProbeError::UnreadableMetadata {
            path: path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    parse_probe_output(path, &String::from_utf8_lossy(&output.stdout))
}

/// Turn ffprobe's JSON into display dimensions.
pub(crate) fn parse_probe_output(path: &Path, json: &str) -> Result<MediaDimensions, ProbeError> {
    let parsed: ProbeOutput =
        serde_json::from_str(json).map_err(|e| ProbeError::UnreadableMetadata {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let stream = parsed
        .streams
        .iter()
        .find(|s| s.is_video())
        .ok_or_else(|| ProbeError::NoVisualTrack(path.to_path_buf()))?;

    let dims = match (stream.width, stream.height) {
        (Some(w), Some(h)) => MediaDimensions::new(w as f64, h as f64),
        _ => None,
    }
    .ok_or_else(|| ProbeError::UnreadableDimensions(path.to_path_buf()))?;

    Ok(if is_quarter_turn(stream.rotation()) {
        dims.rotated()
    } else {
        dims
    })
}

fn is_quarter_turn(degrees: f64) -> bool {
    (degrees.round() as i64).rem_euclid(180) == 90
}
