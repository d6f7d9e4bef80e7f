//! Skill catalog management and casting.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use super::{ParseInput, SkillDefId, SkillInstance};
use crate::arena::Arena;
use crate::config::CoreConfig;
use crate::definitions::DefinitionRegistry;
use crate::entity::EntityId;
use crate::error::{ApplyStateError, CastError, SkillError};
use crate::event::CombatEvent;
use crate::state::{
    RemovalReason, Spawned, StateInstance, StateInstanceId, StateLifecycleManager, StateParameters,
};

/// Numeric parameter that overrides the legacy cooldown calculation.
pub const COOLDOWN_PARAMETER: &str = "Cooldown";

/// A real-time value ready to be written to an active state.
#[derive(Debug, Clone, PartialEq)]
struct RealtimeUpdate {
    owner: EntityId,
    skill: SkillDefId,
    instance: StateInstanceId,
    name: String,
    value: f32,
}

/// Learns, forgets, levels and casts skills.
#[derive(Debug, Clone)]
pub struct SkillEngine {
    definitions: Arc<DefinitionRegistry>,
    config: CoreConfig,
}

impl SkillEngine {
    /// Creates an engine.
    #[must_use]
    pub const fn new(definitions: Arc<DefinitionRegistry>, config: CoreConfig) -> Self {
        Self {
            definitions,
            config,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Adds a skill to an entity's catalog.
    ///
    /// # Errors
    ///
    /// Fails if the skill is unknown, the entity has no skill catalog or the
    /// skill is already learned.
    pub fn learn(
        &self,
        arena: &mut Arena,
        owner: EntityId,
        skill: &SkillDefId,
        level: i32,
    ) -> Result<(), SkillError> {
        let Some(definition) = self.definitions.skill(skill) else {
            warn!(entity = %owner, skill = %skill, "unknown skill definition");
            return Err(SkillError::UnknownSkill(skill.clone()));
        };
        let Some(catalog) = arena.skills_mut(owner) else {
            warn!(entity = %owner, skill = %skill, "entity cannot learn skills");
            return Err(SkillError::NoSkillComponent(owner));
        };
        if catalog.contains(skill) {
            return Err(SkillError::AlreadyLearned(skill.clone()));
        }
        let instance = SkillInstance::new(Arc::clone(definition), owner, level);
        let level = instance.level();
        catalog.insert(instance);
        debug!(entity = %owner, skill = %skill, level, "skill learned");
        arena.publish(CombatEvent::SkillLearned {
            owner,
            skill: skill.clone(),
            level,
        });
        Ok(())
    }

    /// Removes a skill, cancelling its active state and clearing its
    /// cooldown.
    ///
    /// # Errors
    ///
    /// Fails if the entity has no skill catalog or the skill is not learned.
    pub fn forget(
        &self,
        arena: &mut Arena,
        states: &StateLifecycleManager,
        owner: EntityId,
        skill: &SkillDefId,
    ) -> Result<(), SkillError> {
        let Some(catalog) = arena.skills_mut(owner) else {
            return Err(SkillError::NoSkillComponent(owner));
        };
        let Some(removed) = catalog.remove(skill) else {
            return Err(SkillError::NotLearned(skill.clone()));
        };
        let had_cooldown = catalog.cooldowns_mut().clear(skill);

        if let Some(instance) = removed.active_instance() {
            states.remove_state(arena, owner, instance, RemovalReason::Forgotten);
        }
        if had_cooldown {
            Self::publish_cooldown(arena, owner, skill, 0.0);
        }
        debug!(entity = %owner, skill = %skill, "skill forgotten");
        arena.publish(CombatEvent::SkillForgotten {
            owner,
            skill: skill.clone(),
        });
        Ok(())
    }

    /// Returns true if the entity has learned the skill.
    #[must_use]
    pub fn is_learned(&self, arena: &Arena, owner: EntityId, skill: &SkillDefId) -> bool {
        arena
            .skills(owner)
            .is_some_and(|catalog| catalog.contains(skill))
    }

    /// Sets a skill's level, clamped to `[1, max_level]`.
    ///
    /// Clears the snapshot and carries the new level to the active state
    /// instance, so state-level parsers see it on the next real-time pass.
    /// Returns the stored level, or `None` if the skill is not learned.
    pub fn set_skill_level(
        &self,
        arena: &mut Arena,
        owner: EntityId,
        skill: &SkillDefId,
        level: i32,
    ) -> Option<i32> {
        let instance = arena.skills_mut(owner)?.get_mut(skill)?;
        let old = instance.level();
        let new = instance.set_level(level);
        let active = instance.active_instance();
        if let Some(state) = active.and_then(|id| arena.states_mut(owner)?.get_mut(id)) {
            state.set_level(new);
        }
        if old != new {
            debug!(entity = %owner, skill = %skill, old, new, "skill level changed");
            arena.publish(CombatEvent::SkillLevelChanged {
                owner,
                skill: skill.clone(),
                level: new,
            });
        }
        Some(new)
    }

    // =========================================================================
    // Cooldowns
    // =========================================================================

    /// Returns true if the skill is cooling down.
    #[must_use]
    pub fn is_on_cooldown(&self, arena: &Arena, owner: EntityId, skill: &SkillDefId) -> bool {
        self.cooldown_remaining(arena, owner, skill) > 0.0
    }

    /// Seconds left on a skill's cooldown; zero when ready or unknown.
    #[must_use]
    pub fn cooldown_remaining(&self, arena: &Arena, owner: EntityId, skill: &SkillDefId) -> f32 {
        arena
            .skills(owner)
            .map_or(0.0, |catalog| catalog.cooldowns().remaining(skill, arena.now()))
    }

    /// Clears a cooldown. Returns true if one was running.
    pub fn clear_cooldown(&self, arena: &mut Arena, owner: EntityId, skill: &SkillDefId) -> bool {
        let cleared = arena
            .skills_mut(owner)
            .is_some_and(|catalog| catalog.cooldowns_mut().clear(skill));
        if cleared {
            Self::publish_cooldown(arena, owner, skill, 0.0);
        }
        cleared
    }

    /// Shortens a cooldown by `seconds`. Returns the seconds left, or `None`
    /// if no cooldown was running.
    pub fn reduce_cooldown(
        &self,
        arena: &mut Arena,
        owner: EntityId,
        skill: &SkillDefId,
        seconds: f32,
    ) -> Option<f32> {
        let now = arena.now();
        let remaining = arena
            .skills_mut(owner)?
            .cooldowns_mut()
            .reduce(skill, now, seconds)?;
        Self::publish_cooldown(arena, owner, skill, remaining);
        Some(remaining)
    }

    fn publish_cooldown(arena: &mut Arena, owner: EntityId, skill: &SkillDefId, remaining: f32) {
        arena.publish(CombatEvent::CooldownChanged {
            owner,
            skill: skill.clone(),
            remaining,
        });
    }

    /// Resolves the cooldown of a cast: the `Cooldown` parameter when the
    /// skill configures one, the level-decayed base cooldown otherwise.
    fn cast_cooldown(&self, skill: &SkillInstance, parameters: &StateParameters) -> f32 {
        if skill.has_numeric_parameter(COOLDOWN_PARAMETER) {
            if let Some(value) = parameters.numeric.get(COOLDOWN_PARAMETER) {
                return *value;
            }
        }
        skill.definition().base_cooldown * self.config.legacy_cooldown_factor(skill.level())
    }

    // =========================================================================
    // Casting
    // =========================================================================

    /// Casts a skill, granting its state to the caster.
    ///
    /// Steps: validate, compute parameters (taking the snapshot), spawn the
    /// state, register it as the skill's active instance, set the cooldown,
    /// then start the state. If the start fails, the active instance and the
    /// cooldown set by this cast are rolled back.
    ///
    /// # Errors
    ///
    /// Returns the caller-facing reason the cast was refused.
    pub fn try_cast(
        &self,
        arena: &mut Arena,
        states: &StateLifecycleManager,
        caster: EntityId,
        skill_id: &SkillDefId,
        target: Option<EntityId>,
    ) -> Result<StateInstanceId, CastError> {
        let (definition, parameters) = {
            let view = arena.view();
            let Some(catalog) = arena.skills(caster) else {
                return Err(CastError::NoSkillComponent(caster));
            };
            let Some(skill) = catalog.get(skill_id) else {
                return Err(CastError::NotLearned(skill_id.clone()));
            };
            let remaining = catalog.cooldowns().remaining(skill_id, arena.now());
            if remaining > 0.0 {
                return Err(CastError::OnCooldown {
                    skill: skill_id.clone(),
                    remaining,
                });
            }
            if skill
                .active_instance()
                .and_then(|id| view.state_instance(caster, id))
                .is_some_and(StateInstance::is_active)
            {
                return Err(CastError::AlreadyActive(skill_id.clone()));
            }
            let Some(definition) = states.definitions().state(&skill.definition().state).cloned()
            else {
                warn!(entity = %caster, skill = %skill_id, state = %skill.definition().state, "skill grants an unknown state");
                return Err(CastError::State {
                    skill: skill_id.clone(),
                    source: ApplyStateError::UnknownState(skill.definition().state.clone()),
                });
            };
            let input = ParseInput {
                view,
                instigator: Some(caster),
                target,
                state_level: Some(skill.level()),
            };
            (definition, Self::cast_parameters(skill, &input, target))
        };

        let state_error = |source| CastError::State {
            skill: skill_id.clone(),
            source,
        };
        let spawned = states
            .spawn_state(arena, caster, &definition, Some(caster), parameters.clone())
            .map_err(state_error)?;
        let instance = match spawned {
            Spawned::Created(id) | Spawned::Absorbed(id) => id,
        };

        let now = arena.now();
        let Some(catalog) = arena.skills_mut(caster) else {
            StateLifecycleManager::discard(arena, caster, instance);
            return Err(CastError::NoSkillComponent(caster));
        };
        let Some(skill) = catalog.get_mut(skill_id) else {
            StateLifecycleManager::discard(arena, caster, instance);
            return Err(CastError::NotLearned(skill_id.clone()));
        };
        let previous_instance = skill.active_instance();
        skill.set_active_instance(Some(instance));
        for (name, value) in &parameters.numeric {
            if skill.is_snapshot(name) {
                skill.commit_snapshot(name, *value);
            } else {
                skill.commit_realtime(name.clone(), *value);
            }
        }
        let cooldown = self.cast_cooldown(skill, &parameters);
        let cooldown = catalog.cooldowns_mut().set(skill_id, now, cooldown);

        if let Spawned::Created(id) = spawned {
            if let Err(source) = states.start_state(arena, caster, id) {
                if let Some(catalog) = arena.skills_mut(caster) {
                    if let Some(skill) = catalog.get_mut(skill_id) {
                        skill.set_active_instance(previous_instance);
                        skill.clear_snapshot();
                    }
                    catalog.cooldowns_mut().clear(skill_id);
                }
                if cooldown > 0.0 {
                    Self::publish_cooldown(arena, caster, skill_id, 0.0);
                }
                warn!(entity = %caster, skill = %skill_id, error = %source, "cast rolled back");
                return Err(state_error(source));
            }
        }

        if cooldown > 0.0 {
            debug!(entity = %caster, skill = %skill_id, cooldown, "cooldown set");
            Self::publish_cooldown(arena, caster, skill_id, cooldown);
        }
        for (name, value) in parameters.numeric {
            arena.publish(CombatEvent::SkillParameterChanged {
                owner: caster,
                skill: skill_id.clone(),
                name,
                value,
            });
        }
        debug!(entity = %caster, skill = %skill_id, instance = %instance, "skill cast");
        arena.publish(CombatEvent::SkillCast {
            owner: caster,
            skill: skill_id.clone(),
            instance,
            target,
        });
        Ok(instance)
    }

    /// Builds the parameters of the state granted by a cast.
    fn cast_parameters(
        skill: &SkillInstance,
        input: &ParseInput<'_>,
        target: Option<EntityId>,
    ) -> StateParameters {
        let mut parameters = StateParameters::new().with_level(skill.level());
        parameters.target = target;
        for (name, config) in &skill.definition().parameters {
            let value = skill.apply_modifiers(name, config.parser.parse(input));
            parameters.numeric.insert(name.clone(), value);
        }
        for (name, value) in skill.bool_parameters() {
            parameters.bools.insert(name.clone(), *value);
        }
        for (name, value) in skill.vector_parameters() {
            parameters.vectors.insert(name.clone(), *value);
        }
        parameters
    }

    // =========================================================================
    // Polling
    // =========================================================================

    /// Drops expired cooldowns and forgets active instances that ended.
    pub fn poll(&self, arena: &mut Arena) {
        let now = arena.now();
        let owners: Vec<EntityId> = arena.entity_ids().collect();
        for owner in owners {
            let stale: Vec<SkillDefId> = {
                let view = arena.view();
                let Some(catalog) = arena.skills(owner) else {
                    continue;
                };
                catalog
                    .iter()
                    .filter(|skill| {
                        skill.active_instance().is_some_and(|id| {
                            !view
                                .state_instance(owner, id)
                                .is_some_and(StateInstance::is_active)
                        })
                    })
                    .map(|skill| skill.id().clone())
                    .collect()
            };
            let Some(catalog) = arena.skills_mut(owner) else {
                continue;
            };
            for skill in &stale {
                if let Some(instance) = catalog.get_mut(skill) {
                    instance.set_active_instance(None);
                }
            }
            let expired = catalog.cooldowns_mut().prune(now);
            for skill in expired {
                Self::publish_cooldown(arena, owner, &skill, 0.0);
            }
        }
    }

    /// Recomputes real-time parameters of every skill with an active state
    /// and writes the ones that changed into that state.
    ///
    /// Computation runs in parallel over a read-only view; writes are
    /// applied afterwards in (entity, skill, parameter) order.
    pub fn refresh_realtime_parameters(&self, arena: &mut Arena) {
        let updates = self.collect_realtime_updates(arena);
        for update in updates {
            let Some(state) = arena
                .states_mut(update.owner)
                .and_then(|states| states.get_mut(update.instance))
            else {
                continue;
            };
            state.set_numeric_parameter(update.name.clone(), update.value);
            if let Some(skill) = arena
                .skills_mut(update.owner)
                .and_then(|catalog| catalog.get_mut(&update.skill))
            {
                skill.commit_realtime(update.name.clone(), update.value);
            }
            arena.publish(CombatEvent::SkillParameterChanged {
                owner: update.owner,
                skill: update.skill,
                name: update.name,
                value: update.value,
            });
        }
    }

    fn collect_realtime_updates(&self, arena: &Arena) -> Vec<RealtimeUpdate> {
        let view = arena.view();
        let epsilon = self.config.realtime_epsilon;
        let candidates: Vec<(EntityId, &SkillInstance, &StateInstance)> = arena
            .entities()
            .filter_map(|entity| entity.skills().map(|catalog| (entity.id(), catalog)))
            .flat_map(|(owner, catalog)| {
                catalog.iter().filter_map(move |skill| {
                    let state = view.state_instance(owner, skill.active_instance()?)?;
                    state.is_active().then_some((owner, skill, state))
                })
            })
            .collect();

        let mut updates: Vec<RealtimeUpdate> = candidates
            .par_iter()
            .flat_map_iter(|(owner, skill, state)| {
                let input = ParseInput {
                    view,
                    instigator: Some(*owner),
                    target: state.target(),
                    state_level: Some(state.level()),
                };
                skill
                    .realtime_changes(&input, epsilon)
                    .into_iter()
                    .map(move |(name, value)| RealtimeUpdate {
                        owner: *owner,
                        skill: skill.id().clone(),
                        instance: state.id(),
                        name,
                        value,
                    })
            })
            .collect();
        updates.sort_by(|a, b| (a.owner, &a.skill, &a.name).cmp(&(b.owner, &b.skill, &b.name)));
        updates
    }
}
