use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{DurationKind, StateInstanceId};

/// Countdown bookkeeping for one instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationData {
    /// Duration kind copied from the definition.
    pub kind: DurationKind,
    /// Seconds a refresh restores.
    pub total: f32,
    /// Seconds left. Infinite states hold `f32::INFINITY`, untimed ones zero.
    pub remaining: f32,
}

/// Per-entity registry of remaining durations.
///
/// Ticking only decrements `Duration` entries whose instance is active, and
/// reports expiries after the scan so the caller can remove them without
/// touching the registry mid-iteration.
#[derive(Debug, Clone, Default)]
pub struct StateDurationScheduler {
    entries: BTreeMap<StateInstanceId, DurationData>,
}

impl StateDurationScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an instance with its initial remaining time.
    pub fn register(&mut self, id: StateInstanceId, kind: DurationKind, total: f32) {
        let remaining = match kind {
            DurationKind::None => 0.0,
            DurationKind::Duration => total,
            DurationKind::Infinite => f32::INFINITY,
        };
        self.entries.insert(
            id,
            DurationData {
                kind,
                total,
                remaining,
            },
        );
    }

    /// Forgets an instance.
    pub fn unregister(&mut self, id: StateInstanceId) -> Option<DurationData> {
        self.entries.remove(&id)
    }

    /// Returns an instance's bookkeeping.
    #[must_use]
    pub fn get(&self, id: StateInstanceId) -> Option<&DurationData> {
        self.entries.get(&id)
    }

    /// Returns seconds left.
    #[must_use]
    pub fn remaining(&self, id: StateInstanceId) -> Option<f32> {
        self.entries.get(&id).map(|d| d.remaining)
    }

    /// Resets the remaining time to the total. Returns the new value.
    pub fn refresh(&mut self, id: StateInstanceId) -> Option<f32> {
        let data = self.entries.get_mut(&id)?;
        if data.kind == DurationKind::Duration {
            data.remaining = data.total;
        }
        Some(data.remaining)
    }

    /// Overwrites the remaining time of a timed entry. Returns the new value.
    pub fn set_remaining(&mut self, id: StateInstanceId, seconds: f32) -> Option<f32> {
        let data = self.entries.get_mut(&id)?;
        if data.kind == DurationKind::Duration {
            data.remaining = seconds.max(0.0);
        }
        Some(data.remaining)
    }

    /// Decrements active timed entries and returns those that ran out.
    pub fn tick(
        &mut self,
        elapsed: f32,
        is_active: impl Fn(StateInstanceId) -> bool,
    ) -> Vec<StateInstanceId> {
        let mut expired = Vec::new();
        for (id, data) in &mut self.entries {
            if data.kind != DurationKind::Duration || !is_active(*id) {
                continue;
            }
            data.remaining -= elapsed;
            if data.remaining <= 0.0 {
                data.remaining = 0.0;
                expired.push(*id);
            }
        }
        expired
    }

    /// Returns the number of registered instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
