use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{ParameterScaling, ParseInput, SkillDefId, SkillDefinition};
use crate::entity::EntityId;
use crate::state::StateInstanceId;

/// How a skill modifier combines with a parameter's base value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillModifierKind {
    /// Added to the base value.
    Additive,
    /// Multiplies the sum of base and additive values.
    Multiplicative,
}

/// A per-parameter adjustment on a learned skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillModifier {
    /// Combination rule.
    pub kind: SkillModifierKind,
    /// Who added it; used for removal.
    pub source: String,
    /// Amount or factor.
    pub value: f32,
}

impl SkillModifier {
    /// An additive modifier.
    #[must_use]
    pub fn additive(source: impl Into<String>, value: f32) -> Self {
        Self {
            kind: SkillModifierKind::Additive,
            source: source.into(),
            value,
        }
    }

    /// A multiplicative modifier.
    #[must_use]
    pub fn multiplicative(source: impl Into<String>, value: f32) -> Self {
        Self {
            kind: SkillModifierKind::Multiplicative,
            source: source.into(),
            value,
        }
    }
}

/// A learned skill.
///
/// Numeric parameters are stored as configurations and computed on demand.
/// Snapshot parameters are cached by [`take_snapshot`](Self::take_snapshot)
/// and stay fixed until [`clear_snapshot`](Self::clear_snapshot) or the next
/// snapshot. Real-time parameters remember the last value written to the
/// active state so unchanged values are not rewritten.
#[derive(Debug, Clone)]
pub struct SkillInstance {
    definition: Arc<SkillDefinition>,
    owner: EntityId,
    level: i32,
    cooldown_multiplier: f32,
    cost_multiplier: f32,
    bool_parameters: BTreeMap<String, bool>,
    vector_parameters: BTreeMap<String, Vec3>,
    snapshot: BTreeMap<String, f32>,
    realtime_cache: BTreeMap<String, f32>,
    modifiers: BTreeMap<String, Vec<SkillModifier>>,
    active_instance: Option<StateInstanceId>,
}

impl SkillInstance {
    /// Creates a learned skill. The level is clamped to `[1, max_level]`.
    #[must_use]
    pub fn new(definition: Arc<SkillDefinition>, owner: EntityId, level: i32) -> Self {
        let level = level.max(1).min(definition.max_level.max(1));
        Self {
            bool_parameters: definition.bool_parameters.clone(),
            vector_parameters: definition.vector_parameters.clone(),
            definition,
            owner,
            level,
            cooldown_multiplier: 1.0,
            cost_multiplier: 1.0,
            snapshot: BTreeMap::new(),
            realtime_cache: BTreeMap::new(),
            modifiers: BTreeMap::new(),
            active_instance: None,
        }
    }

    /// Returns the definition.
    #[must_use]
    pub fn definition(&self) -> &Arc<SkillDefinition> {
        &self.definition
    }

    /// Returns the skill id.
    #[must_use]
    pub fn id(&self) -> &SkillDefId {
        &self.definition.id
    }

    /// Returns the owning entity.
    #[must_use]
    pub const fn owner(&self) -> EntityId {
        self.owner
    }

    /// Returns the current level.
    #[must_use]
    pub const fn level(&self) -> i32 {
        self.level
    }

    /// Returns the highest reachable level.
    #[must_use]
    pub fn max_level(&self) -> i32 {
        self.definition.max_level.max(1)
    }

    /// Sets the level, clamped to `[1, max_level]`, and clears the snapshot.
    ///
    /// Returns the stored level.
    pub fn set_level(&mut self, level: i32) -> i32 {
        self.level = level.max(1).min(self.max_level());
        self.clear_snapshot();
        self.level
    }

    /// Returns the cooldown multiplier.
    #[must_use]
    pub const fn cooldown_multiplier(&self) -> f32 {
        self.cooldown_multiplier
    }

    /// Sets the cooldown multiplier (negative values become zero).
    pub fn set_cooldown_multiplier(&mut self, multiplier: f32) {
        self.cooldown_multiplier = multiplier.max(0.0);
    }

    /// Returns the cost multiplier.
    #[must_use]
    pub const fn cost_multiplier(&self) -> f32 {
        self.cost_multiplier
    }

    /// Sets the cost multiplier (negative values become zero).
    pub fn set_cost_multiplier(&mut self, multiplier: f32) {
        self.cost_multiplier = multiplier.max(0.0);
    }

    /// Returns the state instance granted by the latest cast.
    #[must_use]
    pub const fn active_instance(&self) -> Option<StateInstanceId> {
        self.active_instance
    }

    pub(crate) fn set_active_instance(&mut self, instance: Option<StateInstanceId>) {
        self.active_instance = instance;
        if instance.is_none() {
            self.realtime_cache.clear();
        }
    }

    // -------------------------------------------------------------------------
    // Bool / vector parameters
    // -------------------------------------------------------------------------

    /// Returns a boolean parameter.
    #[must_use]
    pub fn bool_parameter(&self, name: &str) -> Option<bool> {
        self.bool_parameters.get(name).copied()
    }

    /// Sets a boolean parameter.
    pub fn set_bool_parameter(&mut self, name: impl Into<String>, value: bool) {
        self.bool_parameters.insert(name.into(), value);
    }

    /// Returns every boolean parameter.
    #[must_use]
    pub const fn bool_parameters(&self) -> &BTreeMap<String, bool> {
        &self.bool_parameters
    }

    /// Returns a vector parameter.
    #[must_use]
    pub fn vector_parameter(&self, name: &str) -> Option<Vec3> {
        self.vector_parameters.get(name).copied()
    }

    /// Sets a vector parameter.
    pub fn set_vector_parameter(&mut self, name: impl Into<String>, value: Vec3) {
        self.vector_parameters.insert(name.into(), value);
    }

    /// Returns every vector parameter.
    #[must_use]
    pub const fn vector_parameters(&self) -> &BTreeMap<String, Vec3> {
        &self.vector_parameters
    }

    // -------------------------------------------------------------------------
    // Skill modifiers
    // -------------------------------------------------------------------------

    /// Adds a modifier to a numeric parameter.
    pub fn add_modifier(&mut self, parameter: impl Into<String>, modifier: SkillModifier) {
        self.modifiers.entry(parameter.into()).or_default().push(modifier);
    }

    /// Removes a parameter's modifiers from `source`. Returns how many.
    pub fn remove_modifiers(&mut self, parameter: &str, source: &str) -> usize {
        let Some(list) = self.modifiers.get_mut(parameter) else {
            return 0;
        };
        let before = list.len();
        list.retain(|modifier| modifier.source != source);
        let removed = before - list.len();
        if list.is_empty() {
            self.modifiers.remove(parameter);
        }
        removed
    }

    /// Removes every modifier of a parameter.
    pub fn clear_modifiers(&mut self, parameter: &str) {
        self.modifiers.remove(parameter);
    }

    /// Returns a parameter's modifiers.
    #[must_use]
    pub fn modifiers(&self, parameter: &str) -> &[SkillModifier] {
        self.modifiers.get(parameter).map_or(&[], Vec::as_slice)
    }

    // -------------------------------------------------------------------------
    // Numeric parameters
    // -------------------------------------------------------------------------

    /// Returns true if the definition configures `name`.
    #[must_use]
    pub fn has_numeric_parameter(&self, name: &str) -> bool {
        self.definition.parameters.contains_key(name)
    }

    /// Returns true if `name` is a snapshot parameter.
    #[must_use]
    pub fn is_snapshot(&self, name: &str) -> bool {
        self.definition
            .parameters
            .get(name)
            .is_some_and(|config| config.snapshot)
    }

    /// Resolves a parameter's base value from its parser.
    #[must_use]
    pub fn calculate_base(&self, name: &str, input: &ParseInput<'_>) -> Option<f32> {
        self.definition
            .parameters
            .get(name)
            .map(|config| config.parser.parse(input))
    }

    /// Applies skill modifiers and built-in scaling to a base value.
    #[must_use]
    pub fn apply_modifiers(&self, name: &str, base: f32) -> f32 {
        let (sum, product) = self.modifiers(name).iter().fold(
            (0.0_f32, 1.0_f32),
            |(sum, product), modifier| match modifier.kind {
                SkillModifierKind::Additive => (sum + modifier.value, product),
                SkillModifierKind::Multiplicative => (sum, product * modifier.value),
            },
        );
        ParameterScaling::classify(name).apply(
            (base + sum) * product,
            self.level,
            self.cooldown_multiplier,
            self.cost_multiplier,
        )
    }

    /// Computes a parameter from scratch, ignoring any snapshot.
    #[must_use]
    pub fn calculate(&self, name: &str, input: &ParseInput<'_>) -> Option<f32> {
        self.calculate_base(name, input)
            .map(|base| self.apply_modifiers(name, base))
    }

    /// Returns a parameter's effective value: the snapshot for snapshot
    /// parameters that have one, a fresh computation otherwise.
    #[must_use]
    pub fn parameter_value(&self, name: &str, input: &ParseInput<'_>) -> Option<f32> {
        if self.is_snapshot(name) {
            if let Some(value) = self.snapshot.get(name) {
                return Some(*value);
            }
        }
        self.calculate(name, input)
    }

    /// Computes and caches every snapshot parameter. Returns the values.
    pub fn take_snapshot(&mut self, input: &ParseInput<'_>) -> BTreeMap<String, f32> {
        let values: BTreeMap<String, f32> = self
            .definition
            .parameters
            .iter()
            .filter(|(_, config)| config.snapshot)
            .map(|(name, config)| {
                let value = self.apply_modifiers(name, config.parser.parse(input));
                (name.clone(), value)
            })
            .collect();
        self.snapshot.clone_from(&values);
        values
    }

    pub(crate) fn commit_snapshot(&mut self, name: &str, value: f32) {
        self.snapshot.insert(name.to_string(), value);
    }

    /// Returns a cached snapshot value.
    #[must_use]
    pub fn snapshot_value(&self, name: &str) -> Option<f32> {
        self.snapshot.get(name).copied()
    }

    /// Drops every cached snapshot value.
    pub fn clear_snapshot(&mut self) {
        self.snapshot.clear();
    }

    /// Computes every real-time parameter.
    #[must_use]
    pub fn realtime_values(&self, input: &ParseInput<'_>) -> BTreeMap<String, f32> {
        self.definition
            .parameters
            .iter()
            .filter(|(_, config)| !config.snapshot)
            .map(|(name, config)| {
                let value = self.apply_modifiers(name, config.parser.parse(input));
                (name.clone(), value)
            })
            .collect()
    }

    /// Real-time parameters whose value moved more than `epsilon` from the
    /// last written value.
    #[must_use]
    pub fn realtime_changes(&self, input: &ParseInput<'_>, epsilon: f32) -> Vec<(String, f32)> {
        self.realtime_values(input)
            .into_iter()
            .filter(|(name, value)| {
                self.realtime_cache
                    .get(name)
                    .map_or(true, |cached| (cached - value).abs() > epsilon)
            })
            .collect()
    }

    /// Records a value written to the active state.
    pub fn commit_realtime(&mut self, name: impl Into<String>, value: f32) {
        self.realtime_cache.insert(name.into(), value);
    }

    /// Returns the last value written for a real-time parameter.
    #[must_use]
    pub fn cached_realtime(&self, name: &str) -> Option<f32> {
        self.realtime_cache.get(name).copied()
    }
}
