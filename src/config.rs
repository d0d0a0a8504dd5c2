//! Sorter configuration.
//!
//! Handles loading, validating, and merging a `config.toml`. Stock defaults
//! are serialized to a TOML value and the user's file is merged on top, so a
//! file only needs the keys it wants to change. Command-line flags override
//! the merged result.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [options]
//! mode = "copy"                  # copy | move | dry-run
//! conflict_resolution = "rename" # skip | rename | overwrite
//! create_subfolders = true       # create destination folders as needed
//! default_folder_name = "Other"  # folder for files no rule matched
//! include_subfolders = false     # scan the source recursively
//!
//! [[rules]]
//! name = "Square"
//! ratio = [1, 1]                 # width:height
//! tolerance = 0.05               # optional, default 0.05
//! destination = "Square"         # folder under the destination directory
//! enabled = true                 # optional, default true
//! ```
//!
//! ## Rules replace, options merge
//!
//! Tables merge key by key, but arrays replace arrays. A file that lists any
//! `[[rules]]` therefore replaces the whole default rule table, and its order
//! is the match order.
//!
//! Unknown keys are rejected to catch typos early.

use crate::ratio::{AspectRatio, DEFAULT_TOLERANCE};
use crate::rules::{DEFAULT_RULES, Rule, RuleError, RuleSet, is_folder_segment};
use crate::types::{
    ClassificationOptions, ConflictResolution, DEFAULT_FOLDER_NAME, OperationMode,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Invalid rule: {0}")]
    Rule(#[from] RuleError),
}

/// Configuration loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SorterConfig {
    pub options: OptionsConfig,
    /// Classification rules in match order.
    pub rules: Vec<RuleConfig>,
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            options: OptionsConfig::default(),
            rules: DEFAULT_RULES
                .iter()
                .map(|&(name, width, height, folder)| {
                    RuleConfig::new(name, [width, height], folder)
                })
                .collect(),
        }
    }
}

impl SorterConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_folder_segment(&self.options.default_folder_name) {
            return Err(ConfigError::Validation(
                "options.default_folder_name must be a single relative folder name".into(),
            ));
        }
        for rule in &self.rules {
            if !rule.tolerance.is_finite() || rule.tolerance < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "rule '{}': tolerance must be a non-negative number",
                    rule.name
                )));
            }
            rule.to_rule()?;
        }
        Ok(())
    }

    /// The rule table, in file order.
    pub fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        let rules = self
            .rules
            .iter()
            .map(RuleConfig::to_rule)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RuleSet::new(rules))
    }

    pub fn classification_options(&self) -> ClassificationOptions {
        ClassificationOptions {
            mode: self.options.mode,
            conflict_resolution: self.options.conflict_resolution,
            create_subfolders: self.options.create_subfolders,
            default_folder_name: self.options.default_folder_name.clone(),
        }
    }
}

/// Run options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsConfig {
    pub mode: OperationMode,
    pub conflict_resolution: ConflictResolution,
    pub create_subfolders: bool,
    pub default_folder_name: String,
    pub include_subfolders: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            mode: OperationMode::default(),
            conflict_resolution: ConflictResolution::default(),
            create_subfolders: true,
            default_folder_name: DEFAULT_FOLDER_NAME.to_string(),
            include_subfolders: false,
        }
    }
}

/// One `[[rules]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub name: String,
    /// Target ratio as `[width, height]`, e.g. `[16, 9]`.
    pub ratio: [u32; 2],
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    pub destination: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_enabled() -> bool {
    true
}

impl RuleConfig {
    pub fn new(name: &str, ratio: [u32; 2], destination: &str) -> Self {
        Self {
            name: name.to_string(),
            ratio,
            tolerance: DEFAULT_TOLERANCE,
            destination: destination.to_string(),
            enabled: true,
        }
    }

    pub fn to_rule(&self) -> Result<Rule, RuleError> {
        let [w, h] = self.ratio;
        if w == 0 || h == 0 {
            return Err(RuleError::InvalidRatio(self.name.clone()));
        }
        let target = AspectRatio::from_fraction(w, h, self.tolerance);
        let rule = Rule::new(self.name.as_str(), target, self.destination.as_str())?;
        Ok(if self.enabled { rule } else { rule.disabled() })
    }
}

/// Stock defaults as a TOML value, the base every user file merges onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SorterConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay, arrays included, replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. The file must exist.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SorterConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SorterConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config: stock defaults, overlaid by `path` if given.
pub fn load_config(path: Option<&Path>) -> Result<SorterConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = path.map(load_raw_config).transpose()?;
    if let Some(path) = path {
        log::debug!("Loaded config from {}", path.display());
    }
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# aspect-sort configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.
# Command-line flags override values from this file.

# ---------------------------------------------------------------------------
# Run options
# ---------------------------------------------------------------------------
[options]
# What to do with each file: "copy", "move" or "dry-run".
# A dry run computes destinations and changes nothing on disk.
mode = "copy"

# When the destination file already exists:
#   "skip"      leave it, report the file as failed
#   "rename"    place the new file as name_1.ext, name_2.ext, ...
#   "overwrite" replace the existing file
conflict_resolution = "rename"

# Create destination folders that do not exist yet.
create_subfolders = true

# Folder for files whose ratio matches no rule.
default_folder_name = "Other"

# Also classify files in subfolders of the source directory.
include_subfolders = false

# ---------------------------------------------------------------------------
# Rules
# ---------------------------------------------------------------------------
# Checked top to bottom; the first enabled rule whose ratio is within
# tolerance wins. Listing any [[rules]] replaces this whole table.
#
#   ratio       [width, height]
#   tolerance   maximum difference of width/height ratios (default 0.05)
#   destination a single folder name under the destination directory
#   enabled     set to false to keep a rule without using it

[[rules]]
name = "Square"
ratio = [1, 1]
tolerance = 0.05
destination = "Square"
enabled = true

[[rules]]
name = "Landscape 16:9"
ratio = [16, 9]
tolerance = 0.05
destination = "Landscape_16-9"
enabled = true

[[rules]]
name = "Landscape 4:3"
ratio = [4, 3]
tolerance = 0.05
destination = "Landscape_4-3"
enabled = true

[[rules]]
name = "Portrait 9:16"
ratio = [9, 16]
tolerance = 0.05
destination = "Portrait_9-16"
enabled = true

[[rules]]
name = "Portrait 3:4"
ratio = [3, 4]
tolerance = 0.05
destination = "Portrait_3-4"
enabled = true
"##
}
