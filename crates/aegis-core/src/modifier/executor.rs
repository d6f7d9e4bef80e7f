//! Modifier execution algorithms.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ModifierInstance, ModifierMode};
use crate::attribute::AttributeValues;

/// How a modifier's magnitude changes a value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutorKind {
    /// `value + magnitude`
    Addition,
    /// `value * (1 + magnitude)`; stack bonuses by merging with `AdditiveSum`.
    MultiplyAdditive,
    /// `value * magnitude`; compounds when applied repeatedly.
    MultiplyContinued,
}

impl ExecutorKind {
    /// Applies the algorithm to a single value.
    #[must_use]
    pub fn combine(self, value: f32, magnitude: f32) -> f32 {
        match self {
            Self::Addition => value + magnitude,
            Self::MultiplyAdditive => value * (1.0 + magnitude),
            Self::MultiplyContinued => value * magnitude,
        }
    }

    /// Executes `modifier` against the two value layers.
    ///
    /// The target attribute must exist in both maps; otherwise a warning is
    /// logged and nothing changes. Without a `Magnitude` operand nothing
    /// changes either. Only the map matching the modifier's mode is written.
    /// Returns true if a value was written.
    pub fn execute(
        self,
        modifier: &ModifierInstance,
        base_values: &mut AttributeValues,
        current_values: &mut AttributeValues,
    ) -> bool {
        let target = modifier.target_attribute();
        if !base_values.contains_key(target) || !current_values.contains_key(target) {
            warn!(
                modifier = modifier.name(),
                attribute = target,
                "modifier targets an attribute the entity does not have"
            );
            return false;
        }
        let Some(magnitude) = modifier.magnitude() else {
            return false;
        };
        let values = match modifier.mode() {
            ModifierMode::BaseValue => base_values,
            ModifierMode::CurrentValue => current_values,
        };
        match values.get_mut(target) {
            Some(value) => {
                *value = self.combine(*value, magnitude);
                true
            }
            None => false,
        }
    }
}
