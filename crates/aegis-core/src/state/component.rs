use std::collections::BTreeMap;
use std::fmt;

use super::{
    SlotChange, StateDefId, StateDurationScheduler, StateInstance, StateInstanceId,
    StateSlotManager,
};
use crate::behavior::BehaviorMachine;

/// An instance together with its behavior machine, taken out of the registry.
pub(crate) struct Detached {
    pub instance: StateInstance,
    pub machine: Box<dyn BehaviorMachine>,
}

/// What [`StateComponent::remove`] took out.
pub(crate) struct Removed {
    pub instance: StateInstance,
    pub machine: Option<Box<dyn BehaviorMachine>>,
    pub slot_change: Option<SlotChange>,
}

/// Per-entity state registries: instances, machines, durations and slots.
#[derive(Default)]
pub struct StateComponent {
    instances: BTreeMap<StateInstanceId, StateInstance>,
    by_definition: BTreeMap<StateDefId, Vec<StateInstanceId>>,
    machines: BTreeMap<StateInstanceId, Box<dyn BehaviorMachine>>,
    durations: StateDurationScheduler,
    slots: StateSlotManager,
}

impl StateComponent {
    /// Creates empty registries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an instance.
    #[must_use]
    pub fn get(&self, id: StateInstanceId) -> Option<&StateInstance> {
        self.instances.get(&id)
    }

    /// Returns an instance mutably.
    pub fn get_mut(&mut self, id: StateInstanceId) -> Option<&mut StateInstance> {
        self.instances.get_mut(&id)
    }

    /// Returns true if the instance is registered.
    #[must_use]
    pub fn contains(&self, id: StateInstanceId) -> bool {
        self.instances.contains_key(&id)
    }

    /// Iterates instances of one definition, oldest first.
    pub fn instances_of<'a>(&'a self, def: &StateDefId) -> impl Iterator<Item = &'a StateInstance> + 'a {
        self.by_definition
            .get(def)
            .into_iter()
            .flatten()
            .filter_map(|id| self.instances.get(id))
    }

    /// Iterates every instance in id order.
    pub fn iter(&self) -> impl Iterator<Item = &StateInstance> {
        self.instances.values()
    }

    /// Ids of active instances in id order.
    #[must_use]
    pub fn active_ids(&self) -> Vec<StateInstanceId> {
        self.instances
            .values()
            .filter(|instance| instance.is_active())
            .map(StateInstance::id)
            .collect()
    }

    /// Returns the number of registered instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns true if no instance is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Returns the duration registry.
    #[must_use]
    pub const fn durations(&self) -> &StateDurationScheduler {
        &self.durations
    }

    /// Returns the slot registry.
    #[must_use]
    pub const fn slots(&self) -> &StateSlotManager {
        &self.slots
    }

    /// Returns seconds left on an instance.
    #[must_use]
    pub fn remaining_duration(&self, id: StateInstanceId) -> Option<f32> {
        self.durations.remaining(id)
    }

    /// Returns true if an active instance occupies `slot`.
    #[must_use]
    pub fn is_slot_occupied(&self, slot: &str) -> bool {
        self.slots
            .is_occupied(slot, |id| self.instances.get(&id).is_some_and(StateInstance::is_active))
    }

    /// Active occupants of `slot` in insertion order.
    #[must_use]
    pub fn active_occupants(&self, slot: &str) -> Vec<&StateInstance> {
        self.slots
            .occupants(slot)
            .iter()
            .filter_map(|id| self.instances.get(id))
            .filter(|instance| instance.is_active())
            .collect()
    }

    /// Decrements durations and returns the instances that ran out.
    pub fn tick_durations(&mut self, elapsed: f32) -> Vec<StateInstanceId> {
        let instances = &self.instances;
        self.durations
            .tick(elapsed, |id| instances.get(&id).is_some_and(StateInstance::is_active))
    }

    pub(crate) fn durations_mut(&mut self) -> &mut StateDurationScheduler {
        &mut self.durations
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Registers an instance in every index.
    pub(crate) fn insert(&mut self, instance: StateInstance, machine: Box<dyn BehaviorMachine>) {
        let id = instance.id();
        let definition = instance.definition();
        self.durations
            .register(id, definition.duration, definition.total_duration());
        if let Some(slot) = &definition.slot {
            self.slots.assign(slot, id);
        }
        self.by_definition
            .entry(definition.id.clone())
            .or_default()
            .push(id);
        self.machines.insert(id, machine);
        self.instances.insert(id, instance);
    }

    /// Removes an instance from every index.
    pub(crate) fn remove(&mut self, id: StateInstanceId) -> Option<Removed> {
        let instance = self.instances.remove(&id)?;
        let machine = self.machines.remove(&id);
        self.durations.unregister(id);
        let slot_change = self.slots.remove_instance(id);
        if let Some(ids) = self.by_definition.get_mut(instance.def_id()) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.by_definition.remove(instance.def_id());
            }
        }
        Some(Removed {
            instance,
            machine,
            slot_change,
        })
    }

    /// Takes an instance and its machine out for a behavior call.
    ///
    /// The duration, slot and definition indices keep the id.
    pub(crate) fn detach(&mut self, id: StateInstanceId) -> Option<Detached> {
        let machine = self.machines.remove(&id)?;
        let Some(instance) = self.instances.remove(&id) else {
            self.machines.insert(id, machine);
            return None;
        };
        Some(Detached { instance, machine })
    }

    /// Puts a detached instance back.
    pub(crate) fn reattach(&mut self, detached: Detached) {
        let id = detached.instance.id();
        self.machines.insert(id, detached.machine);
        self.instances.insert(id, detached.instance);
    }
}

impl fmt::Debug for StateComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateComponent")
            .field("instances", &self.instances.len())
            .field("machines", &self.machines.len())
            .field("durations", &self.durations.len())
            .field("slots", &self.slots.slot_tags().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::behavior::scripts::Passive;
    use crate::entity::EntityId;
    use crate::state::{StateDefinition, StateKind, StateParameters, StateStage};

    fn instance(id: u64, def: &Arc<StateDefinition>) -> StateInstance {
        StateInstance::new(
            Arc::clone(def),
            StateInstanceId::new(id),
            EntityId::new(1),
            None,
            StateParameters::new(),
            0.0,
        )
    }

    fn stun() -> Arc<StateDefinition> {
        Arc::new(
            StateDefinition::new("Stun", StateKind::State)
                .with_duration(1.0)
                .with_slot("Control"),
        )
    }

    #[test]
    fn insert_populates_every_index() {
        let def = stun();
        let mut states = StateComponent::new();
        states.insert(instance(1, &def), Box::new(Passive));

        assert!(states.contains(StateInstanceId::new(1)));
        assert_eq!(states.instances_of(&def.id).count(), 1);
        assert_eq!(states.remaining_duration(StateInstanceId::new(1)), Some(1.0));
        assert_eq!(states.slots().occupants("Control"), &[StateInstanceId::new(1)]);
    }

    #[test]
    fn remove_clears_every_index() {
        let def = stun();
        let mut states = StateComponent::new();
        states.insert(instance(1, &def), Box::new(Passive));
        let removed = states.remove(StateInstanceId::new(1)).unwrap();

        assert!(removed.machine.is_some());
        assert!(removed.slot_change.unwrap().occupants.is_empty());
        assert!(states.is_empty());
        assert_eq!(states.instances_of(&def.id).count(), 0);
        assert!(states.durations().is_empty());
        assert!(states.remove(StateInstanceId::new(1)).is_none());
    }

    #[test]
    fn occupancy_and_durations_follow_stage() {
        let def = stun();
        let mut states = StateComponent::new();
        states.insert(instance(1, &def), Box::new(Passive));
        assert!(!states.is_slot_occupied("Control"));
        assert!(states.tick_durations(5.0).is_empty());

        states.get_mut(StateInstanceId::new(1)).unwrap().set_stage(StateStage::Active);
        assert!(states.is_slot_occupied("Control"));
        assert_eq!(states.active_ids(), vec![StateInstanceId::new(1)]);
        assert_eq!(states.tick_durations(5.0), vec![StateInstanceId::new(1)]);
    }

    #[test]
    fn detach_and_reattach() {
        let def = stun();
        let mut states = StateComponent::new();
        states.insert(instance(1, &def), Box::new(Passive));
        let detached = states.detach(StateInstanceId::new(1)).unwrap();
        assert!(!states.contains(StateInstanceId::new(1)));
        assert_eq!(states.slots().occupants("Control").len(), 1);
        states.reattach(detached);
        assert!(states.contains(StateInstanceId::new(1)));
    }
}
