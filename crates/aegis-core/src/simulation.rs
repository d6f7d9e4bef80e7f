//! Simulation module with the per-step update loop.
//!
//! The `Simulation` struct owns the arena and the managers that act on it.
//! Each [`step`](Simulation::step) runs, in order:
//!
//! 1. **CLOCK**: advance world time by `dt`
//! 2. **BEHAVIOR**: tick every running behavior machine
//! 3. **DURATION**: once per elapsed tick interval, count down state
//!    durations and poll skill cooldowns
//! 4. **REALTIME**: recompute real-time skill parameters (parallel read,
//!    sequential write)
//!
//! # Determinism
//!
//! Entities, instances and skills are visited in id order (`BTreeMap`
//! storage), and the parallel real-time pass sorts its results before
//! writing, so identical inputs produce identical event logs.
//!
//! # Example
//!
//! ```
//! use aegis_core::definitions::DefinitionRegistry;
//! use aegis_core::entity::EntityTag;
//! use aegis_core::simulation::Simulation;
//! use aegis_core::state::{StateDefinition, StateKind, StateParameters};
//!
//! let mut definitions = DefinitionRegistry::new();
//! definitions
//!     .register_state(StateDefinition::new("Haste", StateKind::Buff).with_duration(0.5))
//!     .unwrap();
//!
//! let mut sim = Simulation::new(definitions);
//! let hero = sim.spawn(EntityTag::Combatant, "hero");
//! let haste = sim
//!     .apply_state(hero, &"Haste".into(), None, StateParameters::new())
//!     .unwrap();
//!
//! for _ in 0..10 {
//!     sim.step(0.1);
//! }
//!
//! assert_eq!(sim.tick(), 10);
//! assert!(!sim.arena().states(hero).unwrap().contains(haste));
//! ```

use std::sync::Arc;

use tracing::warn;

use crate::arena::Arena;
use crate::attribute::AttributeEngine;
use crate::behavior::BehaviorEvent;
use crate::config::CoreConfig;
use crate::definitions::DefinitionRegistry;
use crate::entity::{EntityId, EntityTag};
use crate::error::{ApplyStateError, CastError, ConfigError, SkillError};
use crate::event::{CombatEvent, EventSink};
use crate::modifier::ModifierInstance;
use crate::skill::{SkillDefId, SkillEngine};
use crate::state::{RemovalReason, StateDefId, StateInstanceId, StateLifecycleManager, StateParameters};

// =============================================================================
// Simulation
// =============================================================================

/// The explicit context object: arena, definitions and managers.
///
/// Every operation goes through a `Simulation` (or the managers it owns);
/// there is no global state.
#[derive(Debug)]
pub struct Simulation {
    arena: Arena,
    definitions: Arc<DefinitionRegistry>,
    config: CoreConfig,
    attributes: AttributeEngine,
    states: StateLifecycleManager,
    skills: SkillEngine,
    tick: u64,
    duration_accumulator: f32,
}

impl Simulation {
    /// Upper bound on duration passes run by a single [`step`](Self::step).
    pub const MAX_DURATION_PASSES: u32 = 64;

    /// Creates a simulation with the default configuration.
    #[must_use]
    pub fn new(definitions: DefinitionRegistry) -> Self {
        Self::build(Arc::new(definitions), CoreConfig::default())
    }

    /// Creates a simulation with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns the first invalid configuration field.
    pub fn with_config(definitions: DefinitionRegistry, config: CoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(Arc::new(definitions), config))
    }

    fn build(definitions: Arc<DefinitionRegistry>, config: CoreConfig) -> Self {
        let attributes = AttributeEngine::from_config(&config);
        Self {
            arena: Arena::with_event_recording(config.record_events),
            states: StateLifecycleManager::new(Arc::clone(&definitions), attributes),
            skills: SkillEngine::new(Arc::clone(&definitions), config.clone()),
            definitions,
            config,
            attributes,
            tick: 0,
            duration_accumulator: 0.0,
        }
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// Negative or non-finite `dt` is treated as zero. A large `dt` runs at
    /// most [`MAX_DURATION_PASSES`](Self::MAX_DURATION_PASSES) duration
    /// passes, the last one covering the surplus time.
    pub fn step(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        // CLOCK
        self.arena.advance_clock(dt);

        // BEHAVIOR
        self.states.tick_behaviors(&mut self.arena, dt);

        // DURATION
        let interval = self.config.duration_tick_interval;
        self.duration_accumulator += dt;
        let due = (self.duration_accumulator / interval).floor();
        if due >= 1.0 {
            self.duration_accumulator %= interval;
            // Passes beyond the cap fold into the last one.
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_precision_loss,
                clippy::cast_sign_loss
            )]
            let passes = due.min(Self::MAX_DURATION_PASSES as f32) as u32;
            #[allow(clippy::cast_precision_loss)]
            let overflow = (due - passes as f32) * interval;
            for pass in 1..=passes {
                let elapsed = if pass == passes { interval + overflow } else { interval };
                self.states.tick_durations(&mut self.arena, elapsed);
                self.skills.poll(&mut self.arena);
            }
        }

        // REALTIME
        self.skills.refresh_realtime_parameters(&mut self.arena);

        self.tick += 1;
    }

    /// Returns the number of completed steps.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Returns the world time in seconds.
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.arena.now()
    }

    /// Returns the arena.
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Returns the arena mutably.
    ///
    /// Use this for setup; state and skill changes should go through the
    /// simulation so their side effects run.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Returns the definition registry.
    #[must_use]
    pub const fn definitions(&self) -> &Arc<DefinitionRegistry> {
        &self.definitions
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Returns the attribute engine.
    #[must_use]
    pub const fn attribute_engine(&self) -> &AttributeEngine {
        &self.attributes
    }

    /// Returns the state lifecycle manager.
    #[must_use]
    pub const fn states(&self) -> &StateLifecycleManager {
        &self.states
    }

    /// Returns the state lifecycle manager mutably, e.g. to register
    /// behavior scripts or stacking policies.
    pub fn states_mut(&mut self) -> &mut StateLifecycleManager {
        &mut self.states
    }

    /// Returns the skill engine.
    #[must_use]
    pub const fn skills(&self) -> &SkillEngine {
        &self.skills
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Spawns an entity.
    pub fn spawn(&mut self, tag: EntityTag, name: impl Into<String>) -> EntityId {
        self.arena.spawn(tag, name)
    }

    /// Removes an entity after removing every state it holds.
    ///
    /// Returns false if the entity did not exist.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        self.states
            .remove_all_states(&mut self.arena, entity, RemovalReason::OwnerRemoved);
        self.arena.despawn(entity).is_some()
    }

    /// Adds a registered attribute to an entity.
    ///
    /// Returns false if the attribute is unknown, the entity has no
    /// attribute store or already has the attribute.
    pub fn add_attribute(&mut self, entity: EntityId, attribute: &str, base_value: f32) -> bool {
        let Some(definition) = self.definitions.attribute(attribute) else {
            warn!(entity = %entity, attribute, "unknown attribute definition");
            return false;
        };
        self.arena
            .add_attribute(entity, Arc::clone(definition), base_value)
    }

    // =========================================================================
    // Modifiers
    // =========================================================================

    /// Creates a numbered modifier instance from a registered definition.
    pub fn create_modifier(&mut self, name: &str, source: impl Into<String>) -> Option<ModifierInstance> {
        let Some(definition) = self.definitions.modifier(name) else {
            warn!(modifier = name, "unknown modifier definition");
            return None;
        };
        Some(self.arena.create_modifier(Arc::clone(definition), source))
    }

    /// Applies modifiers to an entity.
    pub fn apply_modifiers(&mut self, entity: EntityId, modifiers: Vec<ModifierInstance>) -> bool {
        self.attributes
            .apply_to_entity(&mut self.arena, entity, modifiers)
    }

    /// Removes modifiers from an entity.
    pub fn remove_modifiers(&mut self, entity: EntityId, modifiers: &[ModifierInstance]) -> bool {
        self.attributes
            .remove_from_entity(&mut self.arena, entity, modifiers)
    }

    /// Removes every modifier from `source` on an entity.
    pub fn remove_modifiers_from_source(&mut self, entity: EntityId, source: &str) -> bool {
        self.attributes
            .remove_source_from_entity(&mut self.arena, entity, source)
    }

    /// Re-applies modifiers whose operands changed externally.
    pub fn update_modifiers(&mut self, entity: EntityId, modifiers: Vec<ModifierInstance>) -> bool {
        self.attributes
            .update_on_entity(&mut self.arena, entity, modifiers)
    }

    // =========================================================================
    // States
    // =========================================================================

    /// Applies a state. See [`StateLifecycleManager::apply_state`].
    ///
    /// # Errors
    ///
    /// Returns why the state could not be applied.
    pub fn apply_state(
        &mut self,
        owner: EntityId,
        state: &StateDefId,
        instigator: Option<EntityId>,
        parameters: StateParameters,
    ) -> Result<StateInstanceId, ApplyStateError> {
        self.states
            .apply_state(&mut self.arena, owner, state, instigator, parameters)
    }

    /// Cancels a state instance.
    pub fn cancel_state(&mut self, owner: EntityId, instance: StateInstanceId) -> bool {
        self.states.cancel_state(&mut self.arena, owner, instance)
    }

    /// Resets a state's remaining duration.
    pub fn refresh_state_duration(&mut self, owner: EntityId, instance: StateInstanceId) -> Option<f32> {
        self.states.refresh_duration(&mut self.arena, owner, instance)
    }

    /// Sets a state's remaining duration.
    pub fn set_state_duration(&mut self, owner: EntityId, instance: StateInstanceId, seconds: f32) -> Option<f32> {
        self.states
            .set_duration(&mut self.arena, owner, instance, seconds)
    }

    /// Adds stacks, clamped to the definition's maximum.
    pub fn add_stack(&mut self, owner: EntityId, instance: StateInstanceId, count: i32) -> Option<i32> {
        self.states.add_stack(&mut self.arena, owner, instance, count)
    }

    /// Removes stacks.
    pub fn remove_stack(&mut self, owner: EntityId, instance: StateInstanceId, count: i32) -> Option<i32> {
        self.states
            .remove_stack(&mut self.arena, owner, instance, count)
    }

    /// Sets a state's stack count.
    pub fn set_stack_count(&mut self, owner: EntityId, instance: StateInstanceId, count: i32) -> Option<i32> {
        self.states
            .set_stack_count(&mut self.arena, owner, instance, count)
    }

    /// Delivers an event to a running state's behavior.
    pub fn send_state_event(&mut self, owner: EntityId, instance: StateInstanceId, event: &BehaviorEvent) -> bool {
        self.states
            .send_state_event(&mut self.arena, owner, instance, event)
    }

    // =========================================================================
    // Skills
    // =========================================================================

    /// Teaches a skill.
    ///
    /// # Errors
    ///
    /// See [`SkillEngine::learn`].
    pub fn learn_skill(&mut self, owner: EntityId, skill: &SkillDefId, level: i32) -> Result<(), SkillError> {
        self.skills.learn(&mut self.arena, owner, skill, level)
    }

    /// Forgets a skill.
    ///
    /// # Errors
    ///
    /// See [`SkillEngine::forget`].
    pub fn forget_skill(&mut self, owner: EntityId, skill: &SkillDefId) -> Result<(), SkillError> {
        self.skills
            .forget(&mut self.arena, &self.states, owner, skill)
    }

    /// Casts a skill.
    ///
    /// # Errors
    ///
    /// Returns the caller-facing reason the cast was refused.
    pub fn try_cast_skill(
        &mut self,
        caster: EntityId,
        skill: &SkillDefId,
        target: Option<EntityId>,
    ) -> Result<StateInstanceId, CastError> {
        self.skills
            .try_cast(&mut self.arena, &self.states, caster, skill, target)
    }

    /// Sets a skill's level.
    pub fn set_skill_level(&mut self, owner: EntityId, skill: &SkillDefId, level: i32) -> Option<i32> {
        self.skills
            .set_skill_level(&mut self.arena, owner, skill, level)
    }

    /// Returns true if the skill is cooling down.
    #[must_use]
    pub fn is_skill_on_cooldown(&self, owner: EntityId, skill: &SkillDefId) -> bool {
        self.skills.is_on_cooldown(&self.arena, owner, skill)
    }

    /// Seconds left on a skill's cooldown.
    #[must_use]
    pub fn skill_cooldown_remaining(&self, owner: EntityId, skill: &SkillDefId) -> f32 {
        self.skills.cooldown_remaining(&self.arena, owner, skill)
    }

    /// Shortens a skill's cooldown.
    pub fn reduce_cooldown(&mut self, owner: EntityId, skill: &SkillDefId, seconds: f32) -> Option<f32> {
        self.skills
            .reduce_cooldown(&mut self.arena, owner, skill, seconds)
    }

    /// Clears a skill's cooldown.
    pub fn clear_cooldown(&mut self, owner: EntityId, skill: &SkillDefId) -> bool {
        self.skills.clear_cooldown(&mut self.arena, owner, skill)
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Registers an event sink.
    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.arena.events_mut().subscribe(sink);
    }

    /// Drains the recorded event log.
    pub fn take_events(&mut self) -> Vec<CombatEvent> {
        self.arena.take_events()
    }
}

// =============================================================================
// Tests
// =============================================================================
