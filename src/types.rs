//! Run configuration and outcome types shared by the engine, the CLI and
//! event consumers.
//!
//! Results and summaries serialize to JSON for `--report`; errors are
//! written as their display strings.

use crate::operations::{FileOperation, OperationError};
use crate::probe::ProbeError;
use crate::ratio::AspectRatio;
use crate::rules::Rule;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// What happens to each classified file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationMode {
    #[default]
    Copy,
    Move,
    /// Compute destinations without touching the filesystem.
    DryRun,
}

impl OperationMode {
    /// The filesystem operation for this mode; `None` for a dry run.
    pub fn file_operation(self) -> Option<FileOperation> {
        match self {
            Self::Copy => Some(FileOperation::Copy),
            Self::Move => Some(FileOperation::Move),
            Self::DryRun => None,
        }
    }
}

impl FromStr for OperationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "copy" => Ok(Self::Copy),
            "move" => Ok(Self::Move),
            "dry-run" | "dryrun" => Ok(Self::DryRun),
            other => Err(format!("unknown mode '{other}' (copy, move, dry-run)")),
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Copy => "copy",
            Self::Move => "move",
            Self::DryRun => "dry-run",
        })
    }
}

/// Policy when the destination file already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictResolution {
    Skip,
    #[default]
    Rename,
    Overwrite,
}

impl FromStr for ConflictResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "rename" => Ok(Self::Rename),
            "overwrite" => Ok(Self::Overwrite),
            other => Err(format!(
                "unknown conflict resolution '{other}' (skip, rename, overwrite)"
            )),
        }
    }
}

impl fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Skip => "skip",
            Self::Rename => "rename",
            Self::Overwrite => "overwrite",
        })
    }
}

pub const DEFAULT_FOLDER_NAME: &str = "Other";

/// Settings for one classification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationOptions {
    pub mode: OperationMode,
    pub conflict_resolution: ConflictResolution,
    /// Create destination folders as needed (ignored in dry runs).
    pub create_subfolders: bool,
    /// Folder for files no rule matched.
    pub default_folder_name: String,
}

impl Default for ClassificationOptions {
    fn default() -> Self {
        Self {
            mode: OperationMode::default(),
            conflict_resolution: ConflictResolution::default(),
            create_subfolders: true,
            default_folder_name: DEFAULT_FOLDER_NAME.to_string(),
        }
    }
}

/// Why a single file could not be classified.
#[derive(Error, Debug, Clone)]
pub enum ClassificationError {
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Outcome for one file.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    pub original_path: PathBuf,
    /// `None` when the run failed before a destination was known.
    pub destination_path: Option<PathBuf>,
    pub aspect_ratio: AspectRatio,
    /// `None` when the file went to the default folder.
    pub matched_rule: Option<Rule>,
    pub success: bool,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<ClassificationError>,
}

impl ClassificationResult {
    pub fn succeeded(
        original_path: PathBuf,
        destination_path: PathBuf,
        aspect_ratio: AspectRatio,
        matched_rule: Option<Rule>,
    ) -> Self {
        Self {
            original_path,
            destination_path: Some(destination_path),
            aspect_ratio,
            matched_rule,
            success: true,
            error: None,
        }
    }

    pub fn failed(
        original_path: PathBuf,
        destination_path: Option<PathBuf>,
        aspect_ratio: AspectRatio,
        matched_rule: Option<Rule>,
        error: impl Into<ClassificationError>,
    ) -> Self {
        Self {
            original_path,
            destination_path,
            aspect_ratio,
            matched_rule,
            success: false,
            error: Some(error.into()),
        }
    }

    /// Folder name the file was (or would have been) sorted into.
    pub fn folder_name(&self) -> Option<String> {
        self.destination_path
            .as_ref()?
            .parent()?
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }
}

fn serialize_error<S: Serializer>(
    error: &Option<ClassificationError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Totals for a finished (or cancelled) run.
///
/// `failed_files` is always `total_files - successful_files`: files a
/// cancelled run never reached count as failed, and `results` holds only
/// the files actually processed.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationSummary {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_files: usize,
    pub successful_files: usize,
    pub failed_files: usize,
    pub cancelled: bool,
    pub results: Vec<ClassificationResult>,
}

impl ClassificationSummary {
    pub fn duration(&self) -> TimeDelta {
        self.end_time - self.start_time
    }

    /// Fraction of input files that succeeded; 0 for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            self.successful_files as f64 / self.total_files as f64
        }
    }

    /// Files that were listed but never processed because of cancellation.
    pub fn unprocessed_files(&self) -> usize {
        self.total_files - self.results.len()
    }

    /// A run with input but no successes is inconclusive rather than fatal.
    pub fn is_inconclusive(&self) -> bool {
        self.total_files > 0 && self.successful_files == 0
    }
}
