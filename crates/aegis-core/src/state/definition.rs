use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::condition::Condition;

/// Identifier of a state definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateDefId(String);

impl StateDefId {
    /// Creates an id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateDefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StateDefId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// What a state represents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKind {
    /// Generic status.
    #[default]
    State,
    /// Granted by casting a skill.
    Skill,
    /// Buff or debuff.
    Buff,
}

/// How a state's lifetime is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationKind {
    /// No countdown; the behavior decides when the state ends.
    #[default]
    None,
    /// Counts down from `duration_seconds`.
    Duration,
    /// Never expires on its own.
    Infinite,
}

/// Who receives a granted modifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrantTarget {
    /// The entity holding the state.
    #[default]
    Owner,
    /// The entity that applied the state.
    Instigator,
    /// The state's target, if any.
    Target,
}

/// A modifier a state hands out while it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantedModifier {
    /// Modifier definition name.
    pub modifier: String,
    /// Receiver.
    #[serde(default)]
    pub target: GrantTarget,
    /// Static operand values.
    #[serde(default)]
    pub operands: BTreeMap<String, f32>,
    /// Numeric state parameter that overrides the `Magnitude` operand.
    #[serde(default)]
    pub magnitude_parameter: Option<String>,
    /// Multiply `Magnitude` by the instance's stack count.
    #[serde(default)]
    pub scale_with_stacks: bool,
}

impl GrantedModifier {
    /// Grants `modifier` to the owner with a fixed magnitude.
    #[must_use]
    pub fn new(modifier: impl Into<String>, magnitude: f32) -> Self {
        let mut operands = BTreeMap::new();
        operands.insert(crate::modifier::MAGNITUDE.to_string(), magnitude);
        Self {
            modifier: modifier.into(),
            target: GrantTarget::Owner,
            operands,
            magnitude_parameter: None,
            scale_with_stacks: false,
        }
    }

    /// Sets the receiver.
    #[must_use]
    pub fn to(mut self, target: GrantTarget) -> Self {
        self.target = target;
        self
    }

    /// Reads `Magnitude` from a numeric state parameter.
    #[must_use]
    pub fn with_magnitude_parameter(mut self, name: impl Into<String>) -> Self {
        self.magnitude_parameter = Some(name.into());
        self
    }

    /// Scales `Magnitude` by stack count.
    #[must_use]
    pub fn scaled_with_stacks(mut self) -> Self {
        self.scale_with_stacks = true;
        self
    }
}

/// Immutable description of a state.
///
/// ```
/// use aegis_core::state::{DurationKind, StateDefinition, StateKind};
///
/// let burning = StateDefinition::new("Burning", StateKind::Buff)
///     .with_duration(4.0)
///     .with_max_stacks(3)
///     .with_slot("Debuff");
///
/// assert_eq!(burning.duration, DurationKind::Duration);
/// assert!((burning.total_duration() - 4.0).abs() < 0.0001);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDefinition {
    /// Unique id.
    pub id: StateDefId,
    /// Kind.
    #[serde(default)]
    pub kind: StateKind,
    /// Slot tag, if slotted.
    #[serde(default)]
    pub slot: Option<String>,
    /// Precedence within an exclusive slot; lower wins.
    #[serde(default)]
    pub priority: i32,
    /// Category and function tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Registered behavior script name.
    #[serde(default)]
    pub behavior: Option<String>,
    /// Duration kind.
    #[serde(default)]
    pub duration: DurationKind,
    /// Seconds, for [`DurationKind::Duration`].
    #[serde(default)]
    pub duration_seconds: f32,
    /// Maximum stack count; zero or less disables stacking.
    #[serde(default)]
    pub max_stack_count: i32,
    /// Stacking policy consulted when the same instigator re-applies.
    #[serde(default)]
    pub same_instigator_stacking: Option<String>,
    /// Stacking policy consulted when a different instigator applies.
    #[serde(default)]
    pub different_instigator_stacking: Option<String>,
    /// All must hold for the state to be applied.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Modifiers the behavior scripts hand out.
    #[serde(default)]
    pub granted_modifiers: Vec<GrantedModifier>,
    /// Numeric parameters every instance starts with.
    #[serde(default)]
    pub default_parameters: BTreeMap<String, f32>,
}

impl StateDefinition {
    /// Creates an untimed, unslotted definition without behavior.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: StateKind) -> Self {
        Self {
            id: StateDefId::new(id),
            kind,
            slot: None,
            priority: 0,
            tags: Vec::new(),
            behavior: None,
            duration: DurationKind::None,
            duration_seconds: 0.0,
            max_stack_count: 0,
            same_instigator_stacking: None,
            different_instigator_stacking: None,
            conditions: Vec::new(),
            granted_modifiers: Vec::new(),
            default_parameters: BTreeMap::new(),
        }
    }

    /// Makes the state timed.
    #[must_use]
    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration = DurationKind::Duration;
        self.duration_seconds = seconds;
        self
    }

    /// Makes the state last until removed.
    #[must_use]
    pub fn infinite(mut self) -> Self {
        self.duration = DurationKind::Infinite;
        self
    }

    /// Puts the state in a slot.
    #[must_use]
    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = Some(slot.into());
        self
    }

    /// Sets the slot precedence.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the behavior script.
    #[must_use]
    pub fn with_behavior(mut self, behavior: impl Into<String>) -> Self {
        self.behavior = Some(behavior.into());
        self
    }

    /// Enables stacking up to `max`.
    #[must_use]
    pub fn with_max_stacks(mut self, max: i32) -> Self {
        self.max_stack_count = max;
        self
    }

    /// Names the stacking policies for same and different instigators.
    #[must_use]
    pub fn with_stacking(mut self, same: Option<&str>, different: Option<&str>) -> Self {
        self.same_instigator_stacking = same.map(str::to_string);
        self.different_instigator_stacking = different.map(str::to_string);
        self
    }

    /// Adds an application condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Adds a granted modifier.
    #[must_use]
    pub fn with_granted_modifier(mut self, granted: GrantedModifier) -> Self {
        self.granted_modifiers.push(granted);
        self
    }

    /// Adds a default numeric parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: f32) -> Self {
        self.default_parameters.insert(name.into(), value);
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

    /// Seconds a fresh or refreshed instance lasts.
    ///
    /// Infinite states report `f32::INFINITY`; untimed states report zero.
    #[must_use]
    pub fn total_duration(&self) -> f32 {
        match self.duration {
            DurationKind::None => 0.0,
            DurationKind::Duration => self.duration_seconds.max(0.0),
            DurationKind::Infinite => f32::INFINITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_duration_by_kind() {
        let untimed = StateDefinition::new("A", StateKind::State);
        assert!(untimed.total_duration().abs() < 0.0001);

        let timed = StateDefinition::new("B", StateKind::Buff).with_duration(2.5);
        assert!((timed.total_duration() - 2.5).abs() < 0.0001);

        let forever = StateDefinition::new("C", StateKind::Buff).infinite();
        assert!(forever.total_duration().is_infinite());
    }

    #[test]
    fn negative_seconds_are_floored() {
        let def = StateDefinition::new("A", StateKind::Buff).with_duration(-3.0);
        assert!(def.total_duration().abs() < 0.0001);
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{ "id": "Stun", "duration": "Duration", "duration_seconds": 1.5 }"#;
        let def: StateDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.id, StateDefId::new("Stun"));
        assert_eq!(def.kind, StateKind::State);
        assert!(def.slot.is_none());
        assert!(def.conditions.is_empty());
    }

    #[test]
    fn granted_modifier_builder() {
        let granted = GrantedModifier::new("Burn", -5.0)
            .to(GrantTarget::Target)
            .scaled_with_stacks();
        assert_eq!(granted.target, GrantTarget::Target);
        assert!(granted.scale_with_stacks);
        assert!((granted.operands["Magnitude"] + 5.0).abs() < 0.0001);
    }
}
