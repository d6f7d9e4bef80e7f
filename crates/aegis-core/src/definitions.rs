//! Definition tables.
//!
//! Definitions are immutable once registered and shared through [`Arc`].
//! A [`DefinitionSet`] is the serde-loadable form; converting it with
//! [`DefinitionRegistry::from_set`] registers everything and checks the
//! cross references.
//!
//! # Example
//!
//! ```
//! use aegis_core::definitions::{DefinitionRegistry, DefinitionSet};
//! use aegis_core::state::SlotKind;
//!
//! let json = r#"{
//!     "attributes": [{ "name": "Health" }],
//!     "modifiers": [{ "name": "Bless", "target_attribute": "Health" }],
//!     "states": [{ "id": "Blessed", "kind": "Buff", "slot": "Holy",
//!                  "granted_modifiers": [{ "modifier": "Bless" }] }],
//!     "slots": { "Holy": "Exclusive" }
//! }"#;
//! let set: DefinitionSet = serde_json::from_str(json).unwrap();
//! let registry = DefinitionRegistry::from_set(set).unwrap();
//! assert!(registry.modifier("Bless").is_some());
//! assert_eq!(registry.slot_kind("Holy"), SlotKind::Exclusive);
//! assert_eq!(registry.slot_kind("Other"), SlotKind::Parallel);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attribute::AttributeDefinition;
use crate::error::DefinitionError;
use crate::modifier::ModifierDefinition;
use crate::skill::{SkillDefId, SkillDefinition};
use crate::state::{SlotKind, StateDefId, StateDefinition, StateKind};

/// Serializable bundle of definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionSet {
    /// Attribute definitions.
    pub attributes: Vec<AttributeDefinition>,
    /// Modifier definitions.
    pub modifiers: Vec<ModifierDefinition>,
    /// State definitions.
    pub states: Vec<StateDefinition>,
    /// Skill definitions.
    pub skills: Vec<SkillDefinition>,
    /// Slot kinds; undeclared slots are parallel.
    pub slots: BTreeMap<String, SlotKind>,
}

/// Keyed, read-only definition tables.
#[derive(Default)]
pub struct DefinitionRegistry {
    attributes: BTreeMap<String, Arc<AttributeDefinition>>,
    modifiers: BTreeMap<String, Arc<ModifierDefinition>>,
    states: BTreeMap<StateDefId, Arc<StateDefinition>>,
    skills: BTreeMap<SkillDefId, Arc<SkillDefinition>>,
    slots: BTreeMap<String, SlotKind>,
}

impl DefinitionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a whole set and validates its cross references.
    ///
    /// # Errors
    ///
    /// Returns the first duplicate, empty modifier target or dangling
    /// reference found.
    pub fn from_set(set: DefinitionSet) -> Result<Self, DefinitionError> {
        let mut registry = Self::new();
        for attribute in set.attributes {
            registry.register_attribute(attribute)?;
        }
        for modifier in set.modifiers {
            registry.register_modifier(modifier)?;
        }
        for state in set.states {
            registry.register_state(state)?;
        }
        for skill in set.skills {
            registry.register_skill(skill)?;
        }
        for (slot, kind) in set.slots {
            registry.set_slot_kind(slot, kind);
        }
        registry.validate()?;
        debug!(
            attributes = registry.attributes.len(),
            modifiers = registry.modifiers.len(),
            states = registry.states.len(),
            skills = registry.skills.len(),
            "definitions loaded"
        );
        Ok(registry)
    }

    /// Checks that every reference between definitions resolves.
    ///
    /// # Errors
    ///
    /// - [`DefinitionError::UnknownModifier`] for a state granting an
    ///   unregistered modifier
    /// - [`DefinitionError::UnknownState`] for a skill granting an
    ///   unregistered state
    /// - [`DefinitionError::NotASkillState`] for a skill granting a state
    ///   whose kind is not `Skill`
    pub fn validate(&self) -> Result<(), DefinitionError> {
        for state in self.states.values() {
            for granted in &state.granted_modifiers {
                if !self.modifiers.contains_key(&granted.modifier) {
                    return Err(DefinitionError::UnknownModifier {
                        state: state.id.clone(),
                        modifier: granted.modifier.clone(),
                    });
                }
            }
        }
        for skill in self.skills.values() {
            let Some(state) = self.states.get(&skill.state) else {
                return Err(DefinitionError::UnknownState {
                    skill: skill.id.clone(),
                    state: skill.state.clone(),
                });
            };
            if state.kind != StateKind::Skill {
                return Err(DefinitionError::NotASkillState {
                    skill: skill.id.clone(),
                    state: skill.state.clone(),
                });
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Registers an attribute definition.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::Duplicate`] if the name is taken.
    pub fn register_attribute(&mut self, definition: AttributeDefinition) -> Result<(), DefinitionError> {
        insert_unique(&mut self.attributes, "attribute", definition.name.clone(), definition)
    }

    /// Registers a modifier definition.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::EmptyTarget`] for a modifier without a
    /// target attribute and [`DefinitionError::Duplicate`] if the name is
    /// taken.
    pub fn register_modifier(&mut self, definition: ModifierDefinition) -> Result<(), DefinitionError> {
        if definition.target_attribute.is_empty() {
            return Err(DefinitionError::EmptyTarget(definition.name));
        }
        insert_unique(&mut self.modifiers, "modifier", definition.name.clone(), definition)
    }

    /// Registers a state definition.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::Duplicate`] if the id is taken.
    pub fn register_state(&mut self, definition: StateDefinition) -> Result<(), DefinitionError> {
        insert_unique(&mut self.states, "state", definition.id.clone(), definition)
    }

    /// Registers a skill definition.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::Duplicate`] if the id is taken.
    pub fn register_skill(&mut self, definition: SkillDefinition) -> Result<(), DefinitionError> {
        insert_unique(&mut self.skills, "skill", definition.id.clone(), definition)
    }

    /// Declares a slot's kind.
    pub fn set_slot_kind(&mut self, slot: impl Into<String>, kind: SlotKind) {
        self.slots.insert(slot.into(), kind);
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// Returns an attribute definition.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Arc<AttributeDefinition>> {
        self.attributes.get(name)
    }

    /// Returns a modifier definition.
    #[must_use]
    pub fn modifier(&self, name: &str) -> Option<&Arc<ModifierDefinition>> {
        self.modifiers.get(name)
    }

    /// Returns a state definition.
    #[must_use]
    pub fn state(&self, id: &StateDefId) -> Option<&Arc<StateDefinition>> {
        self.states.get(id)
    }

    /// Returns a skill definition.
    #[must_use]
    pub fn skill(&self, id: &SkillDefId) -> Option<&Arc<SkillDefinition>> {
        self.skills.get(id)
    }

    /// Returns a slot's kind; undeclared slots are parallel.
    #[must_use]
    pub fn slot_kind(&self, slot: &str) -> SlotKind {
        self.slots.get(slot).copied().unwrap_or_default()
    }

    /// Iterates attribute definitions in name order.
    pub fn attributes(&self) -> impl Iterator<Item = &Arc<AttributeDefinition>> {
        self.attributes.values()
    }

    /// Iterates state definitions in id order.
    pub fn states(&self) -> impl Iterator<Item = &Arc<StateDefinition>> {
        self.states.values()
    }

    /// Iterates skill definitions in id order.
    pub fn skills(&self) -> impl Iterator<Item = &Arc<SkillDefinition>> {
        self.skills.values()
    }
}

fn insert_unique<K: Ord + fmt::Display, V>(
    table: &mut BTreeMap<K, Arc<V>>,
    family: &'static str,
    key: K,
    definition: V,
) -> Result<(), DefinitionError> {
    if table.contains_key(&key) {
        return Err(DefinitionError::Duplicate {
            family,
            name: key.to_string(),
        });
    }
    table.insert(key, Arc::new(definition));
    Ok(())
}

impl fmt::Debug for DefinitionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionRegistry")
            .field("attributes", &self.attributes.len())
            .field("modifiers", &self.modifiers.len())
            .field("states", &self.states.len())
            .field("skills", &self.skills.len())
            .field("slots", &self.slots)
            .finish()
    }
}
