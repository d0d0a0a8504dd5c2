//! Classification rules.
//!
//! A [`Rule`] maps a target [`AspectRatio`] to a destination folder name. A
//! [`RuleSet`] is an ordered list of rules; lookup returns the **first**
//! enabled rule whose target matches, so list order is the tie-breaker when
//! several tolerance ranges overlap.
//!
//! ## Default table
//!
//! ```text
//! Square      1:1   → Square/
//! 16:9              → Landscape_16-9/
//! 4:3               → Landscape_4-3/
//! 9:16              → Portrait_9-16/
//! 3:4               → Portrait_3-4/
//! ```

use crate::ratio::{AspectRatio, DEFAULT_TOLERANCE};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("Rule name must not be empty")]
    EmptyName,
    #[error("Rule '{0}' needs a single relative folder name as destination")]
    InvalidDestination(String),
    #[error("Rule '{0}' has an invalid ratio or tolerance")]
    InvalidRatio(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub id: Uuid,
    pub name: String,
    pub target_ratio: AspectRatio,
    /// Folder name (one path segment) under the base directory.
    pub destination_path: String,
    pub is_enabled: bool,
}

impl Rule {
    /// Create an enabled rule with a fresh id.
    pub fn new(
        name: impl Into<String>,
        target_ratio: AspectRatio,
        destination_path: impl Into<String>,
    ) -> Result<Self, RuleError> {
        let name = name.into().trim().to_string();
        let destination_path = destination_path.into().trim().to_string();
        if name.is_empty() {
            return Err(RuleError::EmptyName);
        }
        if !is_folder_segment(&destination_path) {
            return Err(RuleError::InvalidDestination(name));
        }
        if target_ratio.ratio() <= 0.0 {
            return Err(RuleError::InvalidRatio(name));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            target_ratio,
            destination_path,
            is_enabled: true,
        })
    }

    pub fn disabled(mut self) -> Self {
        self.is_enabled = false;
        self
    }

    /// A disabled rule never matches.
    pub fn matches(&self, ratio: &AspectRatio) -> bool {
        self.is_enabled && self.target_ratio.matches(ratio)
    }
}

/// Whether `name` is usable as a single relative folder name.
pub fn is_folder_segment(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty()
        && trimmed != "."
        && trimmed != ".."
        && !trimmed.contains(['/', '\\'])
        && !trimmed.contains('\0')
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The built-in table, in lookup order.
    pub fn default_rules() -> Self {
        Self::new(
            DEFAULT_RULES
                .iter()
                .map(|&(name, width, height, folder)| {
                    default_rule(name, width, height, folder)
                })
                .collect(),
        )
    }

    /// First enabled rule matching `ratio`, in configured order.
    pub fn find_matching_rule(&self, ratio: &AspectRatio) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(ratio))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// `(name, width, height, folder)` for each built-in rule, in lookup order.
/// Both [`RuleSet::default_rules`] and the stock config are built from it.
pub const DEFAULT_RULES: &[(&str, u32, u32, &str)] = &[
    ("Square", 1, 1, "Square"),
    ("Landscape 16:9", 16, 9, "Landscape_16-9"),
    ("Landscape 4:3", 4, 3, "Landscape_4-3"),
    ("Portrait 9:16", 9, 16, "Portrait_9-16"),
    ("Portrait 3:4", 3, 4, "Portrait_3-4"),
];

fn default_rule(name: &str, width: u32, height: u32, folder: &str) -> Rule {
    Rule {
        id: Uuid::new_v4(),
        name: name.to_string(),
        target_ratio: AspectRatio::from_fraction(width, height, DEFAULT_TOLERANCE),
        destination_path: folder.to_string(),
        is_enabled: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folders(rules: &RuleSet) -> Vec<&str> {
        rules
            .rules()
            .iter()
            .map(|r| r.destination_path.as_str())
            .collect()
    }

    #[test]
    fn default_table_order_is_fixed() {
        let rules = RuleSet::default_rules();
        assert_eq!(
            folders(&rules),
            vec![
                "Square",
                "Landscape_16-9",
                "Landscape_4-3",
                "Portrait_9-16",
                "Portrait_3-4"
            ]
        );
        assert!(rules.rules().iter().all(|r| r.is_enabled));
    }

    #[test]
    fn default_rules_match_common_shapes() {
        let rules = RuleSet::default_rules();
        let folder = |w: f64, h: f64| {
            rules
                .find_matching_rule(&AspectRatio::compute(w, h))
                .map(|r| r.destination_path.clone())
        };
        assert_eq!(folder(1000.0, 1000.0).as_deref(), Some("Square"));
        assert_eq!(folder(1920.0, 1080.0).as_deref(), Some("Landscape_16-9"));
        assert_eq!(folder(1024.0, 768.0).as_deref(), Some("Landscape_4-3"));
        assert_eq!(folder(1080.0, 1920.0).as_deref(), Some("Portrait_9-16"));
        assert_eq!(folder(768.0, 1024.0).as_deref(), Some("Portrait_3-4"));
        assert_eq!(folder(3000.0, 1000.0), None);
    }

    #[test]
    fn earlier_rule_wins_on_overlap() {
        let wide = Rule::new("wide", AspectRatio::new(1.5, 0.3), "Wide").unwrap();
        let classic = Rule::new("classic", AspectRatio::new(1.33, 0.1), "Classic").unwrap();
        let query = AspectRatio::compute(4.0, 3.0);

        let first = RuleSet::new(vec![wide.clone(), classic.clone()]);
        assert_eq!(first.find_matching_rule(&query).unwrap().name, "wide");

        let second = RuleSet::new(vec![classic, wide]);
        assert_eq!(second.find_matching_rule(&query).unwrap().name, "classic");
    }

    #[test]
    fn lookup_is_deterministic() {
        let rules = RuleSet::default_rules();
        let query = AspectRatio::compute(1.0, 1.0);
        let first = rules.find_matching_rule(&query).map(|r| r.id);
        for _ in 0..10 {
            assert_eq!(rules.find_matching_rule(&query).map(|r| r.id), first);
        }
    }

    #[test]
    fn disabled_rules_are_skipped() {
        let off = Rule::new("off", AspectRatio::exact(1.0), "Off")
            .unwrap()
            .disabled();
        let on = Rule::new("on", AspectRatio::exact(1.0), "On").unwrap();
        let rules = RuleSet::new(vec![off, on]);
        let found = rules.find_matching_rule(&AspectRatio::exact(1.0)).unwrap();
        assert_eq!(found.name, "on");
    }

    #[test]
    fn query_tolerance_participates() {
        let strict = Rule::new("strict", AspectRatio::new(2.0, 0.0), "Two").unwrap();
        let rules = RuleSet::new(vec![strict]);
        assert!(rules.find_matching_rule(&AspectRatio::new(2.04, 0.0)).is_none());
        assert!(rules.find_matching_rule(&AspectRatio::new(2.04, 0.05)).is_some());
    }

    #[test]
    fn rule_validation() {
        assert_eq!(
            Rule::new(" ", AspectRatio::exact(1.0), "Square"),
            Err(RuleError::EmptyName)
        );
        for bad in ["", "..", "a/b", "a\\b", "."] {
            assert_eq!(
                Rule::new("r", AspectRatio::exact(1.0), bad),
                Err(RuleError::InvalidDestination("r".into())),
                "{bad:?}"
            );
        }
        assert_eq!(
            Rule::new("r", AspectRatio::unknown(), "Zero"),
            Err(RuleError::InvalidRatio("r".into()))
        );
    }

    #[test]
    fn rule_stores_trimmed_name_and_folder() {
        let rule = Rule::new("  Square ", AspectRatio::exact(1.0), " Square\t").unwrap();
        assert_eq!(rule.name, "Square");
        assert_eq!(rule.destination_path, "Square");
        assert_eq!(
            Rule::new(" r ", AspectRatio::exact(1.0), " .. "),
            Err(RuleError::InvalidDestination("r".into()))
        );
    }
}
