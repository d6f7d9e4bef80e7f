//! Per-entity attribute storage.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{AttributeDefinition, AttributeValues};
use crate::entity::EntityId;
use crate::modifier::ModifierInstance;

/// Identifier of one attribute instance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttributeInstanceId(u64);

impl AttributeInstanceId {
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

impl fmt::Display for AttributeInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One attribute on one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInstance {
    definition: Arc<AttributeDefinition>,
    instance_id: AttributeInstanceId,
    base_value: f32,
    current_value: f32,
    owner: EntityId,
}

impl AttributeInstance {
    /// Returns the attribute definition.
    #[must_use]
    pub fn definition(&self) -> &AttributeDefinition {
        &self.definition
    }

    /// Returns the attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Returns the instance id.
    #[must_use]
    pub const fn instance_id(&self) -> AttributeInstanceId {
        self.instance_id
    }

    /// Returns the base value.
    #[must_use]
    pub const fn base_value(&self) -> f32 {
        self.base_value
    }

    /// Returns the current (modified) value.
    #[must_use]
    pub const fn current_value(&self) -> f32 {
        self.current_value
    }

    /// Returns the owning entity.
    #[must_use]
    pub const fn owner(&self) -> EntityId {
        self.owner
    }
}

/// Attribute store of one entity.
///
/// Holds every attribute keyed by name plus the list of persistent
/// `CurrentValue` modifiers. Values are only changed through
/// [`AttributeEngine`](super::AttributeEngine).
#[derive(Debug, Clone)]
pub struct AttributeStore {
    owner: EntityId,
    attributes: BTreeMap<String, AttributeInstance>,
    active_modifiers: Vec<ModifierInstance>,
}

impl AttributeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(owner: EntityId) -> Self {
        Self {
            owner,
            attributes: BTreeMap::new(),
            active_modifiers: Vec::new(),
        }
    }

    /// Returns the owning entity.
    #[must_use]
    pub const fn owner(&self) -> EntityId {
        self.owner
    }

    /// Adds an attribute with the given base value.
    ///
    /// The value is clamped to the definition's range; a dynamic bound whose
    /// source attribute is not present yet leaves the value as given. Base and
    /// current start equal. Returns false if the name is already present.
    pub fn add_attribute(
        &mut self,
        definition: Arc<AttributeDefinition>,
        instance_id: AttributeInstanceId,
        base_value: f32,
    ) -> bool {
        if self.attributes.contains_key(&definition.name) {
            return false;
        }
        let value = definition
            .range
            .clamp(base_value, &self.current_values())
            .unwrap_or(base_value);
        let name = definition.name.clone();
        self.attributes.insert(
            name,
            AttributeInstance {
                definition,
                instance_id,
                base_value: value,
                current_value: value,
                owner: self.owner,
            },
        );
        true
    }

    /// Removes an attribute.
    pub fn remove_attribute(&mut self, name: &str) -> Option<AttributeInstance> {
        self.attributes.remove(name)
    }

    /// Returns an attribute by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeInstance> {
        self.attributes.get(name)
    }

    /// Returns true if the attribute exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Returns an attribute's base value.
    #[must_use]
    pub fn base_value(&self, name: &str) -> Option<f32> {
        self.attributes.get(name).map(AttributeInstance::base_value)
    }

    /// Returns an attribute's current value.
    #[must_use]
    pub fn current_value(&self, name: &str) -> Option<f32> {
        self.attributes.get(name).map(AttributeInstance::current_value)
    }

    /// Copies all base values into a name-keyed map.
    #[must_use]
    pub fn base_values(&self) -> AttributeValues {
        self.attributes
            .iter()
            .map(|(name, attr)| (name.clone(), attr.base_value))
            .collect()
    }

    /// Copies all current values into a name-keyed map.
    #[must_use]
    pub fn current_values(&self) -> AttributeValues {
        self.attributes
            .iter()
            .map(|(name, attr)| (name.clone(), attr.current_value))
            .collect()
    }

    /// Iterates attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = &AttributeInstance> {
        self.attributes.values()
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns true if the store holds no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Returns the persistent `CurrentValue` modifiers, in insertion order.
    #[must_use]
    pub fn active_modifiers(&self) -> &[ModifierInstance] {
        &self.active_modifiers
    }

    pub(crate) fn active_modifiers_mut(&mut self) -> &mut Vec<ModifierInstance> {
        &mut self.active_modifiers
    }

    pub(crate) fn range_of(&self, name: &str) -> Option<&super::RangeRule> {
        self.attributes.get(name).map(|attr| &attr.definition.range)
    }

    pub(crate) fn set_base_value(&mut self, name: &str, value: f32) {
        if let Some(attr) = self.attributes.get_mut(name) {
            attr.base_value = value;
        }
    }

    pub(crate) fn set_current_value(&mut self, name: &str, value: f32) {
        if let Some(attr) = self.attributes.get_mut(name) {
            attr.current_value = value;
        }
    }
}
