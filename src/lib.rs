//! # aspect-sort
//!
//! Sorts photos and videos into folders by aspect ratio. Each file's
//! dimensions are read from its metadata (never its pixels), turned into a
//! width/height ratio, and matched against an ordered rule table. The first
//! matching rule names the destination folder; unmatched files go to a
//! default folder.
//!
//! # Pipeline
//!
//! ```text
//! scan   source/  →  [files]                    (walkdir, media extensions)
//! probe  file     →  width × height             (image header / EXIF / ffprobe)
//! match  ratio    →  rule or default folder     (first match, tolerance)
//! place  file     →  dest/<folder>/<name>       (copy, move or dry run)
//! ```
//!
//! Files are processed one at a time, in order. A failure affects only its
//! own file; the run continues and reports it in the summary.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`ratio`] | `AspectRatio` value, tolerance matching, `16:9`-style labels |
//! | [`rules`] | `Rule` / `RuleSet`, the default table, first-match lookup |
//! | [`media`] | Image / video detection by extension |
//! | [`probe`] | The `MediaProbe` seam and the native image + ffprobe implementation |
//! | [`scan`] | Source directory walk producing the ordered file list |
//! | [`operations`] | Copy / move with skip, rename and overwrite conflict policies |
//! | [`types`] | Run options, per-file results, run summary |
//! | [`events`] | `EventSink` progress callbacks and the channel-friendly event enum |
//! | [`control`] | Pause / resume / cancel handle shared with a running engine |
//! | [`engine`] | The classification loop and per-file pipeline |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`logging`] | stderr + log file sink for the `log` facade |
//! | [`output`] | CLI text formatting for scans, rules, progress and summaries |
//!
//! # Design Decisions
//!
//! ## Metadata Only
//!
//! Dimensions come from headers: the `image` crate reads just enough of a
//! still image to report its size, EXIF orientation (via `kamadak-exif`)
//! swaps width and height for quarter turns, and videos are measured by
//! `ffprobe`. Sorting a large card of RAW-sized JPEGs never decodes a pixel.
//!
//! ## Cooperative Control
//!
//! Pause and cancel are requests, observed between files. The file in flight
//! always finishes, so a cancelled run never leaves a half-copied file behind.
//! Control state outlives a run and has to be reset explicitly with
//! [`engine::Classifier::reset_control_state`].

pub mod config;
pub mod control;
pub mod engine;
pub mod events;
pub mod logging;
pub mod media;
pub mod operations;
pub mod output;
pub mod probe;
pub mod ratio;
pub mod rules;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use engine::Classifier;
pub use ratio::AspectRatio;
pub use rules::{Rule, RuleSet};
pub use types::{
    ClassificationOptions, ClassificationResult, ClassificationSummary, ConflictResolution,
    OperationMode,
};
