//! Read-only arena access for behavior machines, conditions and parsers.
//!
//! An [`ArenaView`] is a cheap `Copy` handle over a shared borrow of the
//! arena. Code that only needs to read other entities (an instigator's
//! attributes feeding a target's condition, a level lookup for a skill
//! parameter) receives a view instead of the arena itself, so it cannot
//! mutate anything and can run on worker threads.
//!
//! Every lookup tolerates a despawned entity by returning `None` or `false`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use aegis_core::arena::Arena;
//! use aegis_core::attribute::AttributeDefinition;
//! use aegis_core::entity::{EntityId, EntityTag};
//!
//! let mut arena = Arena::new();
//! let hero = arena.spawn(EntityTag::Combatant, "hero");
//! arena.add_attribute(hero, Arc::new(AttributeDefinition::new("Level")), 3.0);
//!
//! let view = arena.view();
//! assert_eq!(view.level(hero), Some(3));
//! assert_eq!(view.level(EntityId::new(99)), None);
//! ```

use crate::arena::Arena;
use crate::entity::{Entity, EntityId};
use crate::skill::{SkillDefId, SkillInstance};
use crate::state::{StateDefId, StateInstance, StateInstanceId};

/// Immutable view over an [`Arena`].
#[derive(Debug, Clone, Copy)]
pub struct ArenaView<'a> {
    arena: &'a Arena,
}

impl<'a> ArenaView<'a> {
    /// Wraps a shared arena borrow.
    #[must_use]
    pub const fn new(arena: &'a Arena) -> Self {
        Self { arena }
    }

    /// Returns the world time in seconds.
    #[must_use]
    pub const fn now(&self) -> f64 {
        self.arena.now()
    }

    /// Returns an entity by id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&'a Entity> {
        self.arena.get(id)
    }

    /// Returns true if the entity still exists.
    #[must_use]
    pub fn exists(&self, id: EntityId) -> bool {
        self.arena.contains(id)
    }

    /// Returns an attribute's current value.
    #[must_use]
    pub fn attribute_current(&self, id: EntityId, attribute: &str) -> Option<f32> {
        self.arena.attributes(id)?.current_value(attribute)
    }

    /// Returns an attribute's base value.
    #[must_use]
    pub fn attribute_base(&self, id: EntityId, attribute: &str) -> Option<f32> {
        self.arena.attributes(id)?.base_value(attribute)
    }

    /// Returns an entity's level, or `None` if the entity is gone.
    #[must_use]
    pub fn level(&self, id: EntityId) -> Option<i32> {
        self.entity(id).map(Entity::level)
    }

    /// Returns true if the entity has an active instance of `state`.
    #[must_use]
    pub fn has_state(&self, id: EntityId, state: &StateDefId) -> bool {
        self.arena
            .states(id)
            .is_some_and(|states| states.instances_of(state).any(StateInstance::is_active))
    }

    /// Returns a state instance by id.
    #[must_use]
    pub fn state_instance(&self, id: EntityId, instance: StateInstanceId) -> Option<&'a StateInstance> {
        self.arena.states(id)?.get(instance)
    }

    /// Returns true if an active instance occupies `slot` on the entity.
    #[must_use]
    pub fn is_slot_occupied(&self, id: EntityId, slot: &str) -> bool {
        self.arena
            .states(id)
            .is_some_and(|states| states.is_slot_occupied(slot))
    }

    /// Returns a learned skill.
    #[must_use]
    pub fn skill(&self, id: EntityId, skill: &SkillDefId) -> Option<&'a SkillInstance> {
        self.arena.skills(id)?.get(skill)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::attribute::AttributeDefinition;
    use crate::entity::EntityTag;

    #[test]
    fn attribute_reads() {
        let mut arena = Arena::new();
        let hero = arena.spawn(EntityTag::Combatant, "hero");
        arena.add_attribute(hero, Arc::new(AttributeDefinition::new("Armor")), 12.0);

        let view = arena.view();
        assert_eq!(view.attribute_current(hero, "Armor"), Some(12.0));
        assert_eq!(view.attribute_base(hero, "Armor"), Some(12.0));
        assert_eq!(view.attribute_current(hero, "Mana"), None);
    }

    #[test]
    fn despawned_entities_read_as_absent() {
        let mut arena = Arena::new();
        let hero = arena.spawn(EntityTag::Combatant, "hero");
        arena.despawn(hero);

        let view = arena.view();
        assert!(!view.exists(hero));
        assert!(view.level(hero).is_none());
        assert!(!view.has_state(hero, &StateDefId::new("Stun")));
        assert!(!view.is_slot_occupied(hero, "Cast"));
        assert!(view.skill(hero, &SkillDefId::new("Dash")).is_none());
    }

    #[test]
    fn level_defaults_to_one_without_attribute() {
        let mut arena = Arena::new();
        let hero = arena.spawn(EntityTag::Combatant, "hero");
        assert_eq!(arena.view().level(hero), Some(1));
    }
}
