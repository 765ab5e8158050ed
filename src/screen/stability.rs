use serde::{Deserialize, Serialize};

use crate::dom::selector::Combinator;

/// Heuristics deciding which ids and classes survive a re-render.
///
/// The defaults were tuned against form-heavy admin frameworks and are not
/// universal, so every threshold can be overridden from the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StabilityPolicy {
    /// Case-insensitive substrings marking a generated id or class.
    #[serde(default = "default_volatile_markers")]
    pub volatile_markers: Vec<String>,

    /// An id with a run of this many digits is treated as generated.
    #[serde(default = "default_id_digit_run")]
    pub id_digit_run: usize,

    /// Same for class tokens.
    #[serde(default = "default_class_digit_run")]
    pub class_digit_run: usize,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_max_classes")]
    pub max_classes: usize,

    /// Checked in order; the first one present qualifies the level.
    #[serde(default = "default_anchor_attributes")]
    pub anchor_attributes: Vec<String>,

    /// Joins levels of a generated path.
    #[serde(default)]
    pub combinator: PathCombinator,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathCombinator {
    #[default]
    Descendant,
    Child,
}

impl PathCombinator {
    pub fn separator(&self) -> &'static str {
        match self {
            PathCombinator::Descendant => " ",
            PathCombinator::Child => " > ",
        }
    }

    pub fn as_combinator(&self) -> Combinator {
        match self {
            PathCombinator::Descendant => Combinator::Descendant,
            PathCombinator::Child => Combinator::Child,
        }
    }
}

fn default_volatile_markers() -> Vec<String> {
    vec!["jqx".into(), "random".into(), "dynamic".into()]
}

fn default_id_digit_run() -> usize {
    6
}

fn default_class_digit_run() -> usize {
    5
}

fn default_max_depth() -> usize {
    5
}

fn default_max_classes() -> usize {
    2
}

fn default_anchor_attributes() -> Vec<String> {
    [
        "data-name",
        "data-field",
        "data-caption",
        "emap-role",
        "data-role",
        "xtype",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for StabilityPolicy {
    fn default() -> Self {
        StabilityPolicy {
            volatile_markers: default_volatile_markers(),
            id_digit_run: default_id_digit_run(),
            class_digit_run: default_class_digit_run(),
            max_depth: default_max_depth(),
            max_classes: default_max_classes(),
            anchor_attributes: default_anchor_attributes(),
            combinator: PathCombinator::default(),
        }
    }
}

impl StabilityPolicy {
    pub fn is_stable_id(&self, id: &str) -> bool {
        !id.trim().is_empty() && !self.is_volatile(id, self.id_digit_run)
    }

    pub fn is_stable_class(&self, class_name: &str) -> bool {
        !class_name.is_empty() && !self.is_volatile(class_name, self.class_digit_run)
    }

    fn is_volatile(&self, value: &str, digit_run: usize) -> bool {
        let lower = value.to_ascii_lowercase();
        if self
            .volatile_markers
            .iter()
            .any(|m| !m.is_empty() && lower.contains(&m.to_ascii_lowercase()))
        {
            return true;
        }
        digit_run > 0 && longest_digit_run(value) >= digit_run
    }
}

fn longest_digit_run(value: &str) -> usize {
    value
        .chars()
        .fold((0usize, 0usize), |(best, current), c| {
            if c.is_ascii_digit() {
                (best.max(current + 1), current + 1)
            } else {
                (best, 0)
            }
        })
        .0
}
