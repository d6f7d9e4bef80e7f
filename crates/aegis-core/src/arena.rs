//! The arena: the context object every core operation runs against.
//!
//! The Arena owns:
//! - Entity storage with deterministic iteration order (`BTreeMap`)
//! - The world clock, in seconds
//! - Monotonically increasing id counters for attribute, modifier and state instances
//! - The event bus
//!
//! There is no global state. A simulation owns exactly one arena and passes
//! it to the managers explicitly.
//!
//! # Example
//!
//! ```
//! use aegis_core::arena::Arena;
//! use aegis_core::entity::EntityTag;
//!
//! let mut arena = Arena::new();
//! let hero = arena.spawn(EntityTag::Combatant, "hero");
//! let wall = arena.spawn(EntityTag::Construct, "wall");
//!
//! let ids: Vec<_> = arena.entity_ids().collect();
//! assert_eq!(ids, vec![hero, wall]);
//! assert!(arena.skills(wall).is_none());
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::attribute::{AttributeDefinition, AttributeInstanceId, AttributeStore};
use crate::entity::{ComponentSet, Entity, EntityId, EntityTag};
use crate::event::{CombatEvent, EventBus};
use crate::modifier::{ModifierDefinition, ModifierFactory, ModifierInstance};
use crate::skill::SkillComponent;
use crate::state::{StateComponent, StateInstanceId};
use crate::view::ArenaView;

/// Container of all entities plus the shared clock, counters and event bus.
#[derive(Debug, Default)]
pub struct Arena {
    /// Monotonically increasing entity ID counter.
    next_entity_id: u64,
    /// Entity storage with deterministic iteration order.
    entities: BTreeMap<EntityId, Entity>,
    /// World clock in seconds.
    now: f64,
    next_attribute_id: u64,
    next_state_id: u64,
    modifiers: ModifierFactory,
    events: EventBus,
}

impl Arena {
    /// Creates an empty arena at time zero that records events.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty arena with event recording on or off.
    #[must_use]
    pub fn with_event_recording(record: bool) -> Self {
        Self {
            events: EventBus::new(record),
            ..Self::default()
        }
    }

    // -------------------------------------------------------------------------
    // Entities
    // -------------------------------------------------------------------------

    /// Spawns an entity with the components its tag implies.
    pub fn spawn(&mut self, tag: EntityTag, name: impl Into<String>) -> EntityId {
        self.spawn_with(tag, name, tag.components())
    }

    /// Spawns an entity with an explicit component set.
    pub fn spawn_with(
        &mut self,
        tag: EntityTag,
        name: impl Into<String>,
        components: ComponentSet,
    ) -> EntityId {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;
        self.entities
            .insert(id, Entity::with_components(id, tag, name, components));
        id
    }

    /// Removes an entity and everything it owns.
    ///
    /// Use `Simulation::despawn` to stop running behaviors first.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Returns an entity by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Returns an entity by id, mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Returns true if the entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Iterates entity ids in ascending order.
    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Iterates entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Returns the number of entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if there are no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    // -------------------------------------------------------------------------
    // Component accessors (absence is a normal outcome)
    // -------------------------------------------------------------------------

    /// Returns an entity's attribute store.
    #[must_use]
    pub fn attributes(&self, id: EntityId) -> Option<&AttributeStore> {
        self.get(id).and_then(Entity::attributes)
    }

    /// Returns an entity's attribute store, mutably.
    pub fn attributes_mut(&mut self, id: EntityId) -> Option<&mut AttributeStore> {
        self.get_mut(id).and_then(Entity::attributes_mut)
    }

    /// Returns an entity's state registries.
    #[must_use]
    pub fn states(&self, id: EntityId) -> Option<&StateComponent> {
        self.get(id).and_then(Entity::states)
    }

    /// Returns an entity's state registries, mutably.
    pub fn states_mut(&mut self, id: EntityId) -> Option<&mut StateComponent> {
        self.get_mut(id).and_then(Entity::states_mut)
    }

    /// Returns an entity's skill catalog.
    #[must_use]
    pub fn skills(&self, id: EntityId) -> Option<&SkillComponent> {
        self.get(id).and_then(Entity::skills)
    }

    /// Returns an entity's skill catalog, mutably.
    pub fn skills_mut(&mut self, id: EntityId) -> Option<&mut SkillComponent> {
        self.get_mut(id).and_then(Entity::skills_mut)
    }

    /// Adds an attribute to an entity with a fresh instance id.
    ///
    /// Returns false if the entity has no attribute store or already has the
    /// attribute.
    pub fn add_attribute(
        &mut self,
        id: EntityId,
        definition: Arc<AttributeDefinition>,
        base_value: f32,
    ) -> bool {
        if self.attributes(id).is_none() {
            return false;
        }
        let instance_id = AttributeInstanceId::new(self.next_attribute_id);
        self.next_attribute_id += 1;
        self.attributes_mut(id)
            .is_some_and(|store| store.add_attribute(definition, instance_id, base_value))
    }

    // -------------------------------------------------------------------------
    // Clock and counters
    // -------------------------------------------------------------------------

    /// Returns the world time in seconds.
    #[must_use]
    pub const fn now(&self) -> f64 {
        self.now
    }

    /// Moves the clock forward. Negative or non-finite steps are ignored.
    pub fn advance_clock(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.now += f64::from(dt);
        }
    }

    /// Creates a numbered modifier instance.
    pub fn create_modifier(
        &mut self,
        definition: Arc<ModifierDefinition>,
        source_name: impl Into<String>,
    ) -> ModifierInstance {
        self.modifiers.create(definition, source_name)
    }

    /// Allocates a state instance id.
    pub fn next_state_instance_id(&mut self) -> StateInstanceId {
        self.next_state_id += 1;
        StateInstanceId::new(self.next_state_id)
    }

    // -------------------------------------------------------------------------
    // Events and views
    // -------------------------------------------------------------------------

    /// Publishes an event.
    pub fn publish(&mut self, event: CombatEvent) {
        self.events.publish(event);
    }

    /// Returns the event bus.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Returns the event bus, mutably.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Drains the event log.
    pub fn take_events(&mut self) -> Vec<CombatEvent> {
        self.events.take_events()
    }

    /// Returns a read-only view for cross-entity queries.
    #[must_use]
    pub const fn view(&self) -> ArenaView<'_> {
        ArenaView::new(self)
    }
}
