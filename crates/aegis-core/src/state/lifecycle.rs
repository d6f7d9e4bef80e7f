//! State lifecycle orchestration.
//!
//! [`StateLifecycleManager`] is the only code that creates or destroys state
//! instances. Applying a state runs these steps, in order:
//!
//! 1. Resolve the definition and the owner's components.
//! 2. Build the candidate instance and check the definition's conditions.
//! 3. Consult the stacking policy if an active instance of the definition
//!    already exists; the existing instance may absorb the application.
//! 4. Arbitrate exclusive slots, evicting lower-precedence occupants.
//! 5. Register the instance (index, duration scheduler, slot).
//! 6. Initialize and start the behavior machine.
//!
//! A failure in step 6 removes the instance from every registry before the
//! error is returned, so a failed application leaves nothing behind except
//! evictions already made in step 4.
//!
//! Behavior machines run on a detached instance: the instance and its
//! machine are taken out of the registry for the duration of the call and put
//! back afterwards. Commands the machine queued are resolved once it is back.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{
    GrantTarget, RemovalReason, SlotKind, StackingDecision, StackingRegistry, StateComponent,
    StateDefId, StateDefinition, StateInstance, StateInstanceId, StateKind, StateParameters,
    StateStage,
};
use crate::arena::Arena;
use crate::attribute::AttributeEngine;
use crate::behavior::scripts::Passive;
use crate::behavior::{
    BehaviorCommand, BehaviorContext, BehaviorEvent, BehaviorMachine, BehaviorRegistry, RunStatus,
};
use crate::definitions::DefinitionRegistry;
use crate::entity::EntityId;
use crate::error::ApplyStateError;
use crate::event::CombatEvent;
use crate::view::ArenaView;

/// Identity of the instance whose commands are being resolved.
#[derive(Debug, Clone)]
struct CommandOrigin {
    owner: EntityId,
    instance: StateInstanceId,
    instigator: Option<EntityId>,
    target: Option<EntityId>,
    source: String,
}

impl CommandOrigin {
    fn of(instance: &StateInstance) -> Self {
        Self {
            owner: instance.owner(),
            instance: instance.id(),
            instigator: instance.instigator(),
            target: instance.target(),
            source: instance.source_tag(),
        }
    }

    const fn resolve(&self, target: GrantTarget) -> Option<EntityId> {
        match target {
            GrantTarget::Owner => Some(self.owner),
            GrantTarget::Instigator => self.instigator,
            GrantTarget::Target => self.target,
        }
    }

    fn receivers(&self) -> BTreeSet<EntityId> {
        [Some(self.owner), self.instigator, self.target]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Result of the registration half of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Spawned {
    /// A new, not yet started instance.
    Created(StateInstanceId),
    /// An existing instance absorbed the application.
    Absorbed(StateInstanceId),
}

/// Creates, drives and destroys state instances.
#[derive(Debug)]
pub struct StateLifecycleManager {
    definitions: Arc<DefinitionRegistry>,
    behaviors: BehaviorRegistry,
    stacking: StackingRegistry,
    attributes: AttributeEngine,
}

impl StateLifecycleManager {
    /// Creates a manager with the built-in behavior scripts and stacking
    /// policies.
    #[must_use]
    pub fn new(definitions: Arc<DefinitionRegistry>, attributes: AttributeEngine) -> Self {
        Self {
            definitions,
            behaviors: BehaviorRegistry::with_builtin_scripts(),
            stacking: StackingRegistry::with_builtin_policies(),
            attributes,
        }
    }

    /// Returns the definition registry.
    #[must_use]
    pub const fn definitions(&self) -> &Arc<DefinitionRegistry> {
        &self.definitions
    }

    /// Returns the behavior script registry.
    #[must_use]
    pub const fn behaviors(&self) -> &BehaviorRegistry {
        &self.behaviors
    }

    /// Returns the behavior script registry, mutably.
    pub fn behaviors_mut(&mut self) -> &mut BehaviorRegistry {
        &mut self.behaviors
    }

    /// Returns the stacking policy registry, mutably.
    pub fn stacking_mut(&mut self) -> &mut StackingRegistry {
        &mut self.stacking
    }

    // =========================================================================
    // Application
    // =========================================================================

    /// Applies a state to `owner`.
    ///
    /// Returns the new instance id, or the id of the existing instance that
    /// absorbed the application through a stacking policy.
    ///
    /// # Errors
    ///
    /// - [`ApplyStateError::UnknownState`] if no definition has this id
    /// - [`ApplyStateError::WrongKind`] for skill states
    /// - [`ApplyStateError::MissingComponents`] if the owner cannot hold states
    /// - [`ApplyStateError::ConditionsNotMet`] and [`ApplyStateError::SlotOccupied`]
    ///   when application is not allowed
    /// - [`ApplyStateError::UnknownBehavior`], [`ApplyStateError::InitializationFailed`]
    ///   and [`ApplyStateError::StartFailed`] when the behavior cannot run; the
    ///   instance is then fully unregistered
    pub fn apply_state(
        &self,
        arena: &mut Arena,
        owner: EntityId,
        state: &StateDefId,
        instigator: Option<EntityId>,
        parameters: StateParameters,
    ) -> Result<StateInstanceId, ApplyStateError> {
        let definition = self.lookup(state)?;
        if definition.kind == StateKind::Skill {
            warn!(entity = %owner, state = %state, "skill states are granted by casting");
            return Err(ApplyStateError::WrongKind(state.clone()));
        }
        match self.spawn_state(arena, owner, &definition, instigator, parameters)? {
            Spawned::Absorbed(id) => Ok(id),
            Spawned::Created(id) => {
                self.start_state(arena, owner, id)?;
                Ok(id)
            }
        }
    }

    fn lookup(&self, state: &StateDefId) -> Result<Arc<StateDefinition>, ApplyStateError> {
        self.definitions.state(state).cloned().ok_or_else(|| {
            warn!(state = %state, "unknown state definition");
            ApplyStateError::UnknownState(state.clone())
        })
    }

    fn create_machine(
        &self,
        definition: &StateDefinition,
    ) -> Result<Box<dyn BehaviorMachine>, ApplyStateError> {
        let Some(name) = definition.behavior.as_deref() else {
            return Ok(Box::new(Passive));
        };
        self.behaviors.create(name, definition).ok_or_else(|| {
            warn!(state = %definition.id, script = name, "unknown behavior script");
            ApplyStateError::UnknownBehavior(name.to_string())
        })
    }

    /// Registers and initializes an instance without starting it.
    pub(crate) fn spawn_state(
        &self,
        arena: &mut Arena,
        owner: EntityId,
        definition: &Arc<StateDefinition>,
        instigator: Option<EntityId>,
        parameters: StateParameters,
    ) -> Result<Spawned, ApplyStateError> {
        if arena.attributes(owner).is_none() || arena.states(owner).is_none() {
            warn!(entity = %owner, state = %definition.id, "entity cannot hold states");
            return Err(ApplyStateError::MissingComponents(owner));
        }
        let machine = self.create_machine(definition)?;

        let id = arena.next_state_instance_id();
        let candidate = StateInstance::new(
            Arc::clone(definition),
            id,
            owner,
            instigator,
            parameters.clone(),
            arena.now(),
        );
        let view = arena.view();
        if !definition
            .conditions
            .iter()
            .all(|condition| condition.check(view, &candidate))
        {
            debug!(entity = %owner, state = %definition.id, "application conditions not met");
            return Err(ApplyStateError::ConditionsNotMet(definition.id.clone()));
        }

        if let Some((existing, add_stacks, refresh)) =
            self.stacking_decision(view, owner, definition, instigator, &parameters)
        {
            if add_stacks != 0 {
                self.add_stack(arena, owner, existing, add_stacks);
            }
            if refresh {
                self.refresh_duration(arena, owner, existing);
            }
            debug!(entity = %owner, state = %definition.id, instance = %existing, "application absorbed");
            return Ok(Spawned::Absorbed(existing));
        }

        if let Some(slot) = &definition.slot {
            self.arbitrate_slot(arena, owner, slot, definition)?;
        }

        let Some(states) = arena.states_mut(owner) else {
            return Err(ApplyStateError::MissingComponents(owner));
        };
        states.insert(candidate, machine);

        let initialized = Self::with_detached(arena, owner, id, |view, instance, machine| {
            machine.initialize(view, instance)
        })
        .unwrap_or(false);
        if !initialized {
            warn!(entity = %owner, state = %definition.id, "behavior failed to initialize");
            Self::discard(arena, owner, id);
            return Err(ApplyStateError::InitializationFailed(definition.id.clone()));
        }
        Ok(Spawned::Created(id))
    }

    fn stacking_decision(
        &self,
        view: ArenaView<'_>,
        owner: EntityId,
        definition: &StateDefinition,
        instigator: Option<EntityId>,
        incoming: &StateParameters,
    ) -> Option<(StateInstanceId, i32, bool)> {
        let states = view.entity(owner)?.states()?;
        let existing = states
            .instances_of(&definition.id)
            .find(|instance| instance.is_active())?;
        let name = if existing.instigator() == instigator {
            definition.same_instigator_stacking.as_deref()
        } else {
            definition.different_instigator_stacking.as_deref()
        }?;
        let Some(policy) = self.stacking.get(name) else {
            warn!(state = %definition.id, policy = name, "unknown stacking policy; creating a new instance");
            return None;
        };
        match policy.decide(existing, incoming) {
            StackingDecision::CreateNew => None,
            StackingDecision::Absorb {
                add_stacks,
                refresh_duration,
            } => Some((existing.id(), add_stacks, refresh_duration)),
        }
    }

    fn arbitrate_slot(
        &self,
        arena: &mut Arena,
        owner: EntityId,
        slot: &str,
        definition: &StateDefinition,
    ) -> Result<(), ApplyStateError> {
        if self.definitions.slot_kind(slot) != SlotKind::Exclusive {
            return Ok(());
        }
        let occupants: Vec<(StateInstanceId, i32)> = arena
            .states(owner)
            .map(|states| {
                states
                    .active_occupants(slot)
                    .into_iter()
                    .map(|instance| (instance.id(), instance.definition().priority))
                    .collect()
            })
            .unwrap_or_default();
        if occupants
            .iter()
            .any(|(_, priority)| *priority < definition.priority)
        {
            debug!(entity = %owner, slot, state = %definition.id, "exclusive slot held by higher priority state");
            return Err(ApplyStateError::SlotOccupied {
                slot: slot.to_string(),
            });
        }
        for (occupant, _) in occupants {
            self.remove_state(arena, owner, occupant, RemovalReason::Evicted);
        }
        Ok(())
    }

    /// Starts a spawned instance.
    ///
    /// A machine that reports `Succeeded` from `start` has done its work: the
    /// instance is announced and removed right away with
    /// [`RemovalReason::Completed`]. Any other non-running status unregisters
    /// the instance silently.
    pub(crate) fn start_state(
        &self,
        arena: &mut Arena,
        owner: EntityId,
        id: StateInstanceId,
    ) -> Result<(), ApplyStateError> {
        let outcome = Self::with_detached(arena, owner, id, |view, instance, machine| {
            let (status, commands) = if Self::dependencies_met(view, instance, machine) {
                let mut ctx = BehaviorContext::new(view, instance);
                let status = machine.start(&mut ctx);
                (status, ctx.into_commands())
            } else {
                warn!(entity = %owner, instance = %id, "behavior dependencies missing; failing closed");
                (RunStatus::Failed, Vec::new())
            };
            instance.set_run_status(status);
            if matches!(status, RunStatus::Running | RunStatus::Succeeded) {
                instance.set_stage(StateStage::Active);
            }
            (status, commands, CommandOrigin::of(instance), instance.definition().clone())
        });
        let Some((status, commands, origin, definition)) = outcome else {
            return Err(ApplyStateError::MissingComponents(owner));
        };

        match status {
            RunStatus::Running | RunStatus::Succeeded => {
                debug!(entity = %owner, instance = %id, state = %definition.id, "state applied");
                arena.publish(CombatEvent::StateApplied {
                    owner,
                    instance: id,
                    state: definition.id.clone(),
                    instigator: origin.instigator,
                });
                if let Some(slot) = &definition.slot {
                    let occupants = arena
                        .states(owner)
                        .map(|states| states.slots().occupants(slot).to_vec())
                        .unwrap_or_default();
                    arena.publish(CombatEvent::SlotChanged {
                        owner,
                        slot: slot.clone(),
                        occupants,
                    });
                }
                self.resolve_commands(arena, &origin, commands);
                if status == RunStatus::Succeeded {
                    self.remove_state(arena, owner, id, RemovalReason::Completed);
                }
                Ok(())
            }
            _ => {
                warn!(entity = %owner, instance = %id, state = %definition.id, ?status, "behavior did not start");
                Self::discard(arena, owner, id);
                Err(ApplyStateError::StartFailed {
                    state: definition.id.clone(),
                    status,
                })
            }
        }
    }

    /// Unregisters an instance that was never announced.
    pub(crate) fn discard(arena: &mut Arena, owner: EntityId, id: StateInstanceId) {
        if let Some(states) = arena.states_mut(owner) {
            states.remove(id);
        }
    }

    fn dependencies_met(
        view: ArenaView<'_>,
        instance: &StateInstance,
        machine: &dyn BehaviorMachine,
    ) -> bool {
        machine
            .dependencies()
            .iter()
            .all(|dependency| dependency.is_satisfied(view, instance))
    }

    fn with_detached<R>(
        arena: &mut Arena,
        owner: EntityId,
        id: StateInstanceId,
        call: impl FnOnce(ArenaView<'_>, &mut StateInstance, &mut dyn BehaviorMachine) -> R,
    ) -> Option<R> {
        let mut detached = arena.states_mut(owner)?.detach(id)?;
        let result = call(arena.view(), &mut detached.instance, &mut *detached.machine);
        if let Some(states) = arena.states_mut(owner) {
            states.reattach(detached);
        }
        Some(result)
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Removes an instance from every registry.
    ///
    /// A running behavior is stopped first and every persistent modifier the
    /// instance granted is withdrawn. Returns false if the instance was not
    /// registered, so repeated calls are harmless.
    pub fn remove_state(
        &self,
        arena: &mut Arena,
        owner: EntityId,
        id: StateInstanceId,
        reason: RemovalReason,
    ) -> bool {
        let Some(removed) = arena.states_mut(owner).and_then(|states| states.remove(id)) else {
            return false;
        };
        let mut instance = removed.instance;
        let origin = CommandOrigin::of(&instance);

        if instance.run_status() == RunStatus::Running {
            if let Some(mut machine) = removed.machine {
                let mut ctx = BehaviorContext::new(arena.view(), &mut instance);
                let status = machine.stop(&mut ctx, reason);
                let commands = ctx.into_commands();
                instance.set_run_status(status);
                self.resolve_commands(arena, &origin, commands);
            }
        }
        self.withdraw_grants(arena, &origin, None);
        instance.set_stage(StateStage::Expired);

        if let Some(change) = removed.slot_change {
            arena.publish(CombatEvent::SlotChanged {
                owner,
                slot: change.slot,
                occupants: change.occupants,
            });
        }
        debug!(entity = %owner, instance = %id, state = %instance.def_id(), %reason, "state removed");
        arena.publish(CombatEvent::StateRemoved {
            owner,
            instance: id,
            state: instance.def_id().clone(),
            reason,
        });
        true
    }

    /// Cancels an instance.
    pub fn cancel_state(&self, arena: &mut Arena, owner: EntityId, id: StateInstanceId) -> bool {
        self.remove_state(arena, owner, id, RemovalReason::Cancelled)
    }

    /// Cancels every occupant of a slot. Returns how many were removed.
    pub fn clear_slot(&self, arena: &mut Arena, owner: EntityId, slot: &str) -> usize {
        let occupants = arena
            .states(owner)
            .map(|states| states.slots().occupants(slot).to_vec())
            .unwrap_or_default();
        occupants
            .into_iter()
            .filter(|id| self.remove_state(arena, owner, *id, RemovalReason::Cancelled))
            .count()
    }

    /// Removes every instance an entity holds.
    pub fn remove_all_states(&self, arena: &mut Arena, owner: EntityId, reason: RemovalReason) -> usize {
        let ids: Vec<StateInstanceId> = arena
            .states(owner)
            .map(|states| states.iter().map(StateInstance::id).collect())
            .unwrap_or_default();
        ids.into_iter()
            .filter(|id| self.remove_state(arena, owner, *id, reason))
            .count()
    }

    // =========================================================================
    // Ticking
    // =========================================================================

    /// Ticks every running behavior machine, entities and instances in id
    /// order. Machines that finish are removed.
    pub fn tick_behaviors(&self, arena: &mut Arena, dt: f32) {
        let owners: Vec<EntityId> = arena.entity_ids().collect();
        for owner in owners {
            let ids = arena
                .states(owner)
                .map(StateComponent::active_ids)
                .unwrap_or_default();
            for id in ids {
                self.tick_instance(arena, owner, id, dt);
            }
        }
    }

    fn tick_instance(&self, arena: &mut Arena, owner: EntityId, id: StateInstanceId, dt: f32) {
        let outcome = Self::with_detached(arena, owner, id, |view, instance, machine| {
            if !instance.is_active() || instance.run_status() != RunStatus::Running {
                return None;
            }
            let (status, commands) = if Self::dependencies_met(view, instance, machine) {
                let mut ctx = BehaviorContext::new(view, instance);
                let status = machine.tick(&mut ctx, dt);
                (status, ctx.into_commands())
            } else {
                warn!(entity = %owner, instance = %id, "behavior dependencies missing; failing closed");
                (RunStatus::Failed, Vec::new())
            };
            instance.set_run_status(status);
            Some((status, commands, CommandOrigin::of(instance)))
        });
        let Some(Some((status, commands, origin))) = outcome else {
            return;
        };
        self.resolve_commands(arena, &origin, commands);
        if status.is_terminal() {
            if status == RunStatus::Failed {
                warn!(entity = %owner, instance = %id, "behavior failed");
            }
            self.remove_state(arena, owner, id, RemovalReason::from_status(status));
        }
    }

    /// Counts down durations by `elapsed` seconds and removes expired
    /// instances.
    pub fn tick_durations(&self, arena: &mut Arena, elapsed: f32) {
        let owners: Vec<EntityId> = arena.entity_ids().collect();
        for owner in owners {
            let expired = arena
                .states_mut(owner)
                .map(|states| states.tick_durations(elapsed))
                .unwrap_or_default();
            for id in expired {
                self.remove_state(arena, owner, id, RemovalReason::Expired);
            }
        }
    }

    // =========================================================================
    // Duration and Stack Control
    // =========================================================================

    /// Resets an instance's remaining duration to its total.
    pub fn refresh_duration(&self, arena: &mut Arena, owner: EntityId, id: StateInstanceId) -> Option<f32> {
        let remaining = arena.states_mut(owner)?.durations_mut().refresh(id)?;
        Self::publish_duration(arena, owner, id, remaining);
        Some(remaining)
    }

    /// Sets an instance's remaining duration.
    pub fn set_duration(
        &self,
        arena: &mut Arena,
        owner: EntityId,
        id: StateInstanceId,
        seconds: f32,
    ) -> Option<f32> {
        let remaining = arena
            .states_mut(owner)?
            .durations_mut()
            .set_remaining(id, seconds)?;
        Self::publish_duration(arena, owner, id, remaining);
        Some(remaining)
    }

    fn publish_duration(arena: &mut Arena, owner: EntityId, id: StateInstanceId, remaining: f32) {
        arena.publish(CombatEvent::StateDurationChanged {
            owner,
            instance: id,
            remaining,
        });
    }

    /// Adds stacks. Returns the new count.
    pub fn add_stack(&self, arena: &mut Arena, owner: EntityId, id: StateInstanceId, count: i32) -> Option<i32> {
        Self::change_stacks(arena, owner, id, |instance| instance.add_stack(count))
    }

    /// Removes stacks. Returns the new count.
    pub fn remove_stack(&self, arena: &mut Arena, owner: EntityId, id: StateInstanceId, count: i32) -> Option<i32> {
        Self::change_stacks(arena, owner, id, |instance| instance.remove_stack(count))
    }

    /// Sets the stack count. Returns the stored count.
    pub fn set_stack_count(&self, arena: &mut Arena, owner: EntityId, id: StateInstanceId, count: i32) -> Option<i32> {
        Self::change_stacks(arena, owner, id, |instance| instance.set_stack_count(count))
    }

    fn change_stacks(
        arena: &mut Arena,
        owner: EntityId,
        id: StateInstanceId,
        change: impl FnOnce(&mut StateInstance) -> i32,
    ) -> Option<i32> {
        let instance = arena.states_mut(owner)?.get_mut(id)?;
        let old_count = instance.stack_count();
        let new_count = change(instance);
        if old_count != new_count {
            arena.publish(CombatEvent::StateStackChanged {
                owner,
                instance: id,
                old_count,
                new_count,
            });
        }
        Some(new_count)
    }

    /// Delivers an event to a running behavior. Returns false if the
    /// instance is missing or not running.
    pub fn send_state_event(
        &self,
        arena: &mut Arena,
        owner: EntityId,
        id: StateInstanceId,
        event: &BehaviorEvent,
    ) -> bool {
        let outcome = Self::with_detached(arena, owner, id, |view, instance, machine| {
            if instance.run_status() != RunStatus::Running {
                return None;
            }
            let mut ctx = BehaviorContext::new(view, instance);
            machine.send_event(&mut ctx, event);
            let commands = ctx.into_commands();
            Some((commands, CommandOrigin::of(instance)))
        });
        let Some(Some((commands, origin))) = outcome else {
            return false;
        };
        self.resolve_commands(arena, &origin, commands);
        true
    }

    // =========================================================================
    // Command Resolution
    // =========================================================================

    fn resolve_commands(&self, arena: &mut Arena, origin: &CommandOrigin, commands: Vec<BehaviorCommand>) {
        for command in commands {
            match command {
                BehaviorCommand::ApplyModifier {
                    target,
                    modifier,
                    operands,
                } => self.grant_modifier(arena, origin, target, &modifier, operands),
                BehaviorCommand::RemoveGrantedModifiers { target } => {
                    self.withdraw_grants(arena, origin, target);
                }
                BehaviorCommand::ApplyState {
                    target,
                    state,
                    parameters,
                } => {
                    let Some(receiver) = origin.resolve(target) else {
                        warn!(entity = %origin.owner, instance = %origin.instance, ?target, "state receiver missing");
                        continue;
                    };
                    if let Err(error) =
                        self.apply_state(arena, receiver, &state, Some(origin.owner), parameters)
                    {
                        debug!(entity = %receiver, state = %state, %error, "behavior state application refused");
                    }
                }
                BehaviorCommand::CancelSelf => {
                    self.remove_state(arena, origin.owner, origin.instance, RemovalReason::Cancelled);
                }
                BehaviorCommand::RefreshDuration => {
                    self.refresh_duration(arena, origin.owner, origin.instance);
                }
                BehaviorCommand::SetDuration(seconds) => {
                    self.set_duration(arena, origin.owner, origin.instance, seconds);
                }
                BehaviorCommand::AddStack(count) => {
                    self.add_stack(arena, origin.owner, origin.instance, count);
                }
                BehaviorCommand::RemoveStack(count) => {
                    self.remove_stack(arena, origin.owner, origin.instance, count);
                }
                BehaviorCommand::Signal(tag) => arena.publish(CombatEvent::BehaviorSignal {
                    owner: origin.owner,
                    instance: origin.instance,
                    tag,
                }),
            }
        }
    }

    fn grant_modifier(
        &self,
        arena: &mut Arena,
        origin: &CommandOrigin,
        target: GrantTarget,
        name: &str,
        operands: std::collections::BTreeMap<String, f32>,
    ) {
        let Some(receiver) = origin.resolve(target) else {
            warn!(entity = %origin.owner, instance = %origin.instance, ?target, modifier = name, "modifier receiver missing");
            return;
        };
        let Some(definition) = self.definitions.modifier(name) else {
            warn!(modifier = name, "unknown modifier definition");
            return;
        };
        let mut modifier = arena
            .create_modifier(Arc::clone(definition), origin.source.clone())
            .with_instigator(origin.instigator.or(Some(origin.owner)))
            .with_target(Some(receiver));
        for (operand, value) in operands {
            modifier.set_operand(operand, value);
        }
        self.attributes.apply_to_entity(arena, receiver, vec![modifier]);
    }

    fn withdraw_grants(&self, arena: &mut Arena, origin: &CommandOrigin, target: Option<GrantTarget>) {
        let receivers = match target {
            Some(target) => origin.resolve(target).into_iter().collect(),
            None => origin.receivers(),
        };
        for receiver in receivers {
            if arena.attributes(receiver).is_some() {
                self.attributes
                    .remove_source_from_entity(arena, receiver, &origin.source);
            }
        }
    }
}
