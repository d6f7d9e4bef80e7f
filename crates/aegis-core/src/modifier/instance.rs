//! Modifier instances and the factory that numbers them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{ModifierDefinition, ModifierMode, MAGNITUDE};
use crate::entity::EntityId;

/// Identifier of one modifier instance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModifierInstanceId(u64);

impl ModifierInstanceId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModifierInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One application of a modifier definition.
///
/// Two instances are equal when their definition name and instance id match;
/// operands and timestamps do not take part. Application order is by
/// [`priority`](Self::priority), lower first.
#[derive(Debug, Clone)]
pub struct ModifierInstance {
    definition: Arc<ModifierDefinition>,
    instance_id: ModifierInstanceId,
    source_name: String,
    instigator: Option<EntityId>,
    target: Option<EntityId>,
    operands: BTreeMap<String, f32>,
    apply_timestamp: f64,
    update_timestamp: f64,
}

impl PartialEq for ModifierInstance {
    fn eq(&self, other: &Self) -> bool {
        self.instance_id == other.instance_id && self.definition.name == other.definition.name
    }
}

impl Eq for ModifierInstance {}

impl ModifierInstance {
    /// Creates an instance with no operands.
    ///
    /// Prefer [`ModifierFactory::create`], which numbers instances.
    #[must_use]
    pub fn new(
        definition: Arc<ModifierDefinition>,
        instance_id: ModifierInstanceId,
        source_name: impl Into<String>,
    ) -> Self {
        Self {
            definition,
            instance_id,
            source_name: source_name.into(),
            instigator: None,
            target: None,
            operands: BTreeMap::new(),
            apply_timestamp: 0.0,
            update_timestamp: 0.0,
        }
    }

    /// Sets the instigator.
    #[must_use]
    pub fn with_instigator(mut self, instigator: Option<EntityId>) -> Self {
        self.instigator = instigator;
        self
    }

    /// Sets the target.
    #[must_use]
    pub fn with_target(mut self, target: Option<EntityId>) -> Self {
        self.target = target;
        self
    }

    /// Sets an operand.
    #[must_use]
    pub fn with_operand(mut self, name: impl Into<String>, value: f32) -> Self {
        self.operands.insert(name.into(), value);
        self
    }

    /// Sets the `Magnitude` operand.
    #[must_use]
    pub fn with_magnitude(self, magnitude: f32) -> Self {
        self.with_operand(MAGNITUDE, magnitude)
    }

    /// Returns the definition.
    #[must_use]
    pub fn definition(&self) -> &Arc<ModifierDefinition> {
        &self.definition
    }

    /// Returns the definition name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Returns the instance id.
    #[must_use]
    pub const fn instance_id(&self) -> ModifierInstanceId {
        self.instance_id
    }

    /// Returns the name deltas are attributed to.
    #[must_use]
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Returns the instigator, if any.
    #[must_use]
    pub const fn instigator(&self) -> Option<EntityId> {
        self.instigator
    }

    /// Returns the target, if any.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Returns the application priority.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.definition.priority
    }

    /// Returns the value layer.
    #[must_use]
    pub fn mode(&self) -> ModifierMode {
        self.definition.mode
    }

    /// Returns the target attribute name.
    #[must_use]
    pub fn target_attribute(&self) -> &str {
        &self.definition.target_attribute
    }

    /// Returns an operand.
    #[must_use]
    pub fn operand(&self, name: &str) -> Option<f32> {
        self.operands.get(name).copied()
    }

    /// Returns the `Magnitude` operand.
    #[must_use]
    pub fn magnitude(&self) -> Option<f32> {
        self.operand(MAGNITUDE)
    }

    /// Returns all operands.
    #[must_use]
    pub const fn operands(&self) -> &BTreeMap<String, f32> {
        &self.operands
    }

    /// Sets an operand in place.
    ///
    /// Stored modifiers must be re-announced through
    /// `AttributeEngine::handle_modifiers_updated` for the change to apply.
    pub fn set_operand(&mut self, name: impl Into<String>, value: f32) {
        self.operands.insert(name.into(), value);
    }

    /// Returns when the instance was first applied.
    #[must_use]
    pub const fn apply_timestamp(&self) -> f64 {
        self.apply_timestamp
    }

    /// Returns when the instance was last applied or updated.
    #[must_use]
    pub const fn update_timestamp(&self) -> f64 {
        self.update_timestamp
    }

    pub(crate) fn stamp(&mut self, apply: f64, update: f64) {
        self.apply_timestamp = apply;
        self.update_timestamp = update;
    }
}

/// Numbers modifier instances.
#[derive(Debug, Clone)]
pub struct ModifierFactory {
    next_id: u64,
}

impl Default for ModifierFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ModifierFactory {
    /// Creates a factory whose first id is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Creates a fresh instance of `definition`.
    pub fn create(
        &mut self,
        definition: Arc<ModifierDefinition>,
        source_name: impl Into<String>,
    ) -> ModifierInstance {
        let id = ModifierInstanceId::new(self.next_id);
        self.next_id += 1;
        ModifierInstance::new(definition, id, source_name)
    }
}
