use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::StateInstanceId;

/// Whether a slot holds one active occupant or many.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotKind {
    /// At most one active occupant; the lifecycle manager arbitrates.
    Exclusive,
    /// Any number of occupants.
    #[default]
    Parallel,
}

/// A slot's occupants after a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotChange {
    /// Slot tag.
    pub slot: String,
    /// Occupants in insertion order.
    pub occupants: Vec<StateInstanceId>,
}

/// Per-entity mapping of slot tag to occupants.
///
/// This is mechanism only: it records membership and answers occupancy
/// queries. Exclusivity is decided by the caller.
#[derive(Debug, Clone, Default)]
pub struct StateSlotManager {
    slots: BTreeMap<String, Vec<StateInstanceId>>,
}

impl StateSlotManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an instance to a slot. Assigning twice is a no-op.
    pub fn assign(&mut self, slot: &str, id: StateInstanceId) -> Option<SlotChange> {
        let occupants = self.slots.entry(slot.to_string()).or_default();
        if occupants.contains(&id) {
            return None;
        }
        occupants.push(id);
        Some(SlotChange {
            slot: slot.to_string(),
            occupants: occupants.clone(),
        })
    }

    /// Removes an instance from a slot.
    pub fn remove(&mut self, slot: &str, id: StateInstanceId) -> Option<SlotChange> {
        let occupants = self.slots.get_mut(slot)?;
        let before = occupants.len();
        occupants.retain(|o| *o != id);
        if occupants.len() == before {
            return None;
        }
        let change = SlotChange {
            slot: slot.to_string(),
            occupants: occupants.clone(),
        };
        if occupants.is_empty() {
            self.slots.remove(slot);
        }
        Some(change)
    }

    /// Removes an instance from whichever slot holds it.
    pub fn remove_instance(&mut self, id: StateInstanceId) -> Option<SlotChange> {
        let slot = self.slot_of(id)?.to_string();
        self.remove(&slot, id)
    }

    /// Empties a slot and returns its former occupants.
    pub fn clear(&mut self, slot: &str) -> Vec<StateInstanceId> {
        self.slots.remove(slot).unwrap_or_default()
    }

    /// Returns a slot's occupants in insertion order.
    #[must_use]
    pub fn occupants(&self, slot: &str) -> &[StateInstanceId] {
        self.slots.get(slot).map_or(&[], Vec::as_slice)
    }

    /// Returns true if any occupant of `slot` is active.
    #[must_use]
    pub fn is_occupied(&self, slot: &str, is_active: impl Fn(StateInstanceId) -> bool) -> bool {
        self.occupants(slot).iter().any(|id| is_active(*id))
    }

    /// Returns the slot holding an instance.
    #[must_use]
    pub fn slot_of(&self, id: StateInstanceId) -> Option<&str> {
        self.slots
            .iter()
            .find(|(_, occupants)| occupants.contains(&id))
            .map(|(slot, _)| slot.as_str())
    }

    /// Iterates slot tags in sorted order.
    pub fn slot_tags(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }
}
