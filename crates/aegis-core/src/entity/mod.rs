//! Entity types for the combat core.
//!
//! - [`EntityId`]: stable, non-owning handle into the arena
//! - [`EntityTag`]: archetype that picks the entity's components
//! - [`Entity`]: an id plus optional attribute, state and skill components
//!
//! Everything that refers to another entity (modifier instigators, state
//! owners, cast targets) stores an `EntityId`, never a reference. The
//! referenced entity may be despawned at any time; lookups then return
//! `None` and callers treat that as a normal outcome.
//!
//! # Example
//!
//! ```
//! use aegis_core::entity::{Entity, EntityId, EntityTag};
//!
//! let hero = Entity::new(EntityId::new(7), EntityTag::Combatant, "hero");
//! assert_eq!(hero.id().as_u64(), 7);
//! assert!(hero.attributes().is_some());
//! assert!(hero.skills().is_some());
//!
//! let totem = Entity::new(EntityId::new(8), EntityTag::Construct, "totem");
//! assert!(totem.skills().is_none());
//! ```

pub mod components;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use components::ComponentSet;

use crate::attribute::AttributeStore;
use crate::skill::SkillComponent;
use crate::state::StateComponent;

/// Attribute whose current value is the entity's level.
pub const LEVEL_ATTRIBUTE: &str = "Level";

// =============================================================================
// Entity ID
// =============================================================================

/// Unique identifier for an entity.
///
/// Ids are allocated by the arena in increasing order and never reused, so
/// ordering by id is ordering by spawn time.
///
/// ```
/// use aegis_core::entity::EntityId;
///
/// let a = EntityId::new(1);
/// let b = EntityId::new(2);
/// assert!(a < b);
/// assert_eq!(u64::from(b), 2);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
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

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

// =============================================================================
// Entity Tag
// =============================================================================

/// Entity archetype.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// Full combat participant: attributes, states and skills.
    Combatant,
    /// Summoned object or structure: attributes and states, no skills.
    Construct,
    /// Pure reference point (spawn marker, zone anchor): no components.
    Marker,
}

impl EntityTag {
    /// Returns the components an entity of this archetype carries.
    #[must_use]
    pub const fn components(self) -> ComponentSet {
        match self {
            Self::Combatant => ComponentSet::all(),
            Self::Construct => ComponentSet::ATTRIBUTES.union(ComponentSet::STATES),
            Self::Marker => ComponentSet::empty(),
        }
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Combatant => write!(f, "Combatant"),
            Self::Construct => write!(f, "Construct"),
            Self::Marker => write!(f, "Marker"),
        }
    }
}

// =============================================================================
// Entity
// =============================================================================

/// A simulation entity and its combat components.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    tag: EntityTag,
    name: String,
    attributes: Option<AttributeStore>,
    states: Option<StateComponent>,
    skills: Option<SkillComponent>,
}

impl Entity {
    /// Creates an entity with the components its tag implies.
    #[must_use]
    pub fn new(id: EntityId, tag: EntityTag, name: impl Into<String>) -> Self {
        Self::with_components(id, tag, name, tag.components())
    }

    /// Creates an entity with an explicit component set.
    #[must_use]
    pub fn with_components(
        id: EntityId,
        tag: EntityTag,
        name: impl Into<String>,
        components: ComponentSet,
    ) -> Self {
        Self {
            id,
            tag,
            name: name.into(),
            attributes: components
                .contains(ComponentSet::ATTRIBUTES)
                .then(|| AttributeStore::new(id)),
            states: components
                .contains(ComponentSet::STATES)
                .then(StateComponent::new),
            skills: components
                .contains(ComponentSet::SKILLS)
                .then(SkillComponent::new),
        }
    }

    /// Returns the entity's id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity's archetype.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.tag
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the attribute store, if any.
    #[must_use]
    pub const fn attributes(&self) -> Option<&AttributeStore> {
        self.attributes.as_ref()
    }

    /// Returns the attribute store mutably, if any.
    pub fn attributes_mut(&mut self) -> Option<&mut AttributeStore> {
        self.attributes.as_mut()
    }

    /// Returns the state registries, if any.
    #[must_use]
    pub const fn states(&self) -> Option<&StateComponent> {
        self.states.as_ref()
    }

    /// Returns the state registries mutably, if any.
    pub fn states_mut(&mut self) -> Option<&mut StateComponent> {
        self.states.as_mut()
    }

    /// Returns the skill catalog, if any.
    #[must_use]
    pub const fn skills(&self) -> Option<&SkillComponent> {
        self.skills.as_ref()
    }

    /// Returns the skill catalog mutably, if any.
    pub fn skills_mut(&mut self) -> Option<&mut SkillComponent> {
        self.skills.as_mut()
    }

    /// Returns the entity's level.
    ///
    /// This is the rounded current value of the [`LEVEL_ATTRIBUTE`], or 1 if
    /// the entity has no such attribute.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn level(&self) -> i32 {
        self.attributes
            .as_ref()
            .and_then(|store| store.current_value(LEVEL_ATTRIBUTE))
            .map_or(1, |value| value.round() as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod entity_id_tests {
        use super::*;

        #[test]
        fn ordering() {
            let mut ids = vec![EntityId::new(3), EntityId::new(1), EntityId::new(2)];
            ids.sort();
            assert_eq!(ids, vec![EntityId::new(1), EntityId::new(2), EntityId::new(3)]);
        }

        #[test]
        fn debug_and_display_format() {
            let id = EntityId::new(42);
            assert_eq!(format!("{id:?}"), "EntityId(42)");
            assert_eq!(format!("{id}"), "42");
        }

        #[test]
        fn u64_conversions() {
            let id: EntityId = 9u64.into();
            let raw: u64 = id.into();
            assert_eq!(raw, 9);
        }

        #[test]
        fn serialization_roundtrip() {
            let id = EntityId::new(12345);
            let json = serde_json::to_string(&id).unwrap();
            let restored: EntityId = serde_json::from_str(&json).unwrap();
            assert_eq!(id, restored);
        }
    }

    mod entity_tests {
        use std::sync::Arc;

        use super::*;
        use crate::attribute::{AttributeDefinition, AttributeInstanceId};

        #[test]
        fn tags_select_components() {
            let marker = Entity::new(EntityId::new(1), EntityTag::Marker, "anchor");
            assert!(marker.attributes().is_none());
            assert!(marker.states().is_none());
            assert!(marker.skills().is_none());

            let construct = Entity::new(EntityId::new(2), EntityTag::Construct, "wall");
            assert!(construct.attributes().is_some());
            assert!(construct.states().is_some());
            assert!(construct.skills().is_none());
        }

        #[test]
        fn explicit_components_override_tag() {
            let entity = Entity::with_components(
                EntityId::new(1),
                EntityTag::Combatant,
                "dummy",
                ComponentSet::ATTRIBUTES,
            );
            assert!(entity.attributes().is_some());
            assert!(entity.states().is_none());
        }

        #[test]
        fn level_defaults_to_one() {
            let entity = Entity::new(EntityId::new(1), EntityTag::Combatant, "hero");
            assert_eq!(entity.level(), 1);
        }

        #[test]
        fn level_reads_level_attribute() {
            let mut entity = Entity::new(EntityId::new(1), EntityTag::Combatant, "hero");
            let definition = Arc::new(AttributeDefinition::new(LEVEL_ATTRIBUTE));
            entity.attributes_mut().unwrap().add_attribute(
                definition,
                AttributeInstanceId::new(1),
                4.0,
            );
            assert_eq!(entity.level(), 4);
        }

        #[test]
        fn tag_display() {
            assert_eq!(EntityTag::Construct.to_string(), "Construct");
        }
    }
}
