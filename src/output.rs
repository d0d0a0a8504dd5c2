//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Media files (3)
//!     001 beach.jpg [image]
//!     002 clips/surf.mp4 [video]
//!     003 sunset.png [image]
//! ```
//!
//! ## Rules
//!
//! ```text
//! 001 Square 1:1 ±0.05 → Square/
//! 002 Landscape 16:9 16:9 ±0.05 → Landscape_16-9/
//! 003 Old portrait 3:4 ±0.05 → Portrait_3-4/ (disabled)
//! ```
//!
//! ## Classify
//!
//! ```text
//! Classifying 3 files
//! 001/003 beach.jpg (16:9) → Landscape_16-9/beach.jpg
//! 002/003 banner.png (6.000:1) → Other/banner.png
//!     No rule matched
//! 003/003 broken.jpg FAILED
//!     Cannot read dimensions of broken.jpg
//!
//! Classified 2 of 3 files (66.7%) in 0.04s
//!     Failed: 1
//! Folders
//!     Landscape_16-9: 1
//!     Other: 1
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::events::ClassificationEvent;
use crate::media::MediaKind;
use crate::rules::RuleSet;
use crate::types::{ClassificationResult, ClassificationSummary, OperationMode};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `path` relative to `root` when possible.
fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

// ============================================================================
// Scan
// ============================================================================

pub fn format_scan_output(files: &[PathBuf], source_root: &Path) -> Vec<String> {
    let mut lines = vec![format!("Media files ({})", files.len())];
    for (i, file) in files.iter().enumerate() {
        let kind = match MediaKind::from_path(file) {
            Some(MediaKind::Image) => "image",
            Some(MediaKind::Video) => "video",
            None => "unknown",
        };
        lines.push(format!(
            "    {} {} [{}]",
            format_index(i + 1),
            relative(file, source_root),
            kind
        ));
    }
    lines
}

pub fn print_scan_output(files: &[PathBuf], source_root: &Path) {
    for line in format_scan_output(files, source_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Rules
// ============================================================================

pub fn format_rules(rules: &RuleSet) -> Vec<String> {
    if rules.is_empty() {
        return vec!["No rules: every file goes to the default folder".to_string()];
    }
    rules
        .rules()
        .iter()
        .enumerate()
        .map(|(i, rule)| {
            let disabled = if rule.is_enabled { "" } else { " (disabled)" };
            format!(
                "{} {} {} \u{b1}{} \u{2192} {}/{}",
                format_index(i + 1),
                rule.name,
                rule.target_ratio.label(),
                rule.target_ratio.tolerance(),
                rule.destination_path,
                disabled
            )
        })
        .collect()
}

pub fn print_rules(rules: &RuleSet) {
    for line in format_rules(rules) {
        println!("{}", line);
    }
}

// ============================================================================
// Classify
// ============================================================================

/// Format a single classification event as display lines.
pub fn format_event(event: &ClassificationEvent, mode: OperationMode) -> Vec<String> {
    match event {
        ClassificationEvent::Started { total_files } => {
            let suffix = if mode == OperationMode::DryRun {
                " (dry run)"
            } else {
                ""
            };
            vec![format!("Classifying {} files{}", total_files, suffix)]
        }
        ClassificationEvent::FileProcessed {
            index,
            total,
            result,
        } => format_result(*index, *total, result),
        ClassificationEvent::Completed { summary } => {
            let mut lines = vec![String::new()];
            lines.extend(format_summary(summary));
            lines
        }
    }
}

fn format_result(index: usize, total: usize, result: &ClassificationResult) -> Vec<String> {
    let width = total.to_string().len().max(3);
    let position = format!("{:0>width$}/{:0>width$}", index, total);
    let name = file_name(&result.original_path);

    if !result.success {
        let mut lines = vec![format!("{} {} FAILED", position, name)];
        if let Some(error) = &result.error {
            lines.push(format!("    {}", error));
        }
        return lines;
    }

    let placed = match (&result.destination_path, result.folder_name()) {
        (Some(dest), Some(folder)) => format!("{}/{}", folder, file_name(dest)),
        (Some(dest), None) => dest.display().to_string(),
        (None, _) => String::from("?"),
    };
    let mut lines = vec![format!(
        "{} {} ({}) \u{2192} {}",
        position, name, result.aspect_ratio, placed
    )];
    if result.matched_rule.is_none() {
        lines.push("    No rule matched".to_string());
    }
    lines
}

/// Format the end-of-run summary with per-folder counts.
pub fn format_summary(summary: &ClassificationSummary) -> Vec<String> {
    let seconds = summary.duration().num_milliseconds() as f64 / 1000.0;
    let mut lines = Vec::new();

    if summary.is_inconclusive() {
        lines.push(format!(
            "No file could be classified ({} tried, inconclusive) in {:.2}s",
            summary.total_files, seconds
        ));
    } else {
        lines.push(format!(
            "Classified {} of {} files ({:.1}%) in {:.2}s",
            summary.successful_files,
            summary.total_files,
            summary.success_rate() * 100.0,
            seconds
        ));
    }

    let processed_failures = summary.results.iter().filter(|r| !r.success).count();
    if processed_failures > 0 {
        lines.push(format!("    Failed: {}", processed_failures));
    }
    if summary.cancelled {
        lines.push(format!(
            "    Cancelled: {} files not processed",
            summary.unprocessed_files()
        ));
    }

    let mut folders: BTreeMap<String, usize> = BTreeMap::new();
    for folder in summary
        .results
        .iter()
        .filter(|r| r.success)
        .filter_map(ClassificationResult::folder_name)
    {
        *folders.entry(folder).or_default() += 1;
    }
    if !folders.is_empty() {
        lines.push("Folders".to_string());
        for (folder, count) in folders {
            lines.push(format!("    {}: {}", folder, count));
        }
    }
    lines
}

pub fn print_summary(summary: &ClassificationSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}
