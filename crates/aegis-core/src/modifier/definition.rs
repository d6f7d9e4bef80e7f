//! Modifier definitions.

use serde::{Deserialize, Serialize};

use super::{ExecutorKind, MergerKind, MAGNITUDE};

/// Which value layer a modifier writes.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierMode {
    /// One-shot change of the base value. Never stored.
    BaseValue,
    /// Persistent change of the current value, kept until removed.
    #[default]
    CurrentValue,
}

fn default_operands() -> Vec<String> {
    vec![MAGNITUDE.to_string()]
}

/// Immutable modifier metadata.
///
/// `executor` and `merger` are optional so that malformed data can be loaded
/// and reported; a modifier without either is skipped at recalculation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierDefinition {
    /// Name, unique within a registry. Instances sharing a name are merged.
    pub name: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Application order; lower runs first.
    #[serde(default)]
    pub priority: i32,
    /// Attribute the modifier writes.
    pub target_attribute: String,
    /// Value layer.
    #[serde(default)]
    pub mode: ModifierMode,
    /// Operand names, `["Magnitude"]` by default.
    #[serde(default = "default_operands")]
    pub operand_names: Vec<String>,
    /// Execution algorithm.
    #[serde(default)]
    pub executor: Option<ExecutorKind>,
    /// Merge strategy for same-named instances.
    #[serde(default)]
    pub merger: Option<MergerKind>,
}

impl ModifierDefinition {
    /// Creates a priority-0 definition with `NoMerge`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        target_attribute: impl Into<String>,
        mode: ModifierMode,
        executor: ExecutorKind,
    ) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            priority: 0,
            target_attribute: target_attribute.into(),
            mode,
            operand_names: default_operands(),
            executor: Some(executor),
            merger: Some(MergerKind::NoMerge),
        }
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the merge strategy.
    #[must_use]
    pub fn with_merger(mut self, merger: MergerKind) -> Self {
        self.merger = Some(merger);
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Returns true if the definition carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
