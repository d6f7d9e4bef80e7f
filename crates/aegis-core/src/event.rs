//! Change notifications.
//!
//! Every observable change made by the core is published as a
//! [`CombatEvent`] on the arena's [`EventBus`]. Subscribers receive events
//! synchronously in subscription order. The bus can also keep a log that
//! callers drain with [`EventBus::take_events`], which is what the tests and
//! replay tooling use.
//!
//! Delivery is fire-and-forget: sinks return nothing and are not retried.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attribute::AttributeChange;
use crate::entity::EntityId;
use crate::skill::SkillDefId;
use crate::state::{RemovalReason, StateDefId, StateInstanceId};

// =============================================================================
// Events
// =============================================================================

/// Something observable happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// One or more base values changed in a single pass.
    AttributeBaseChanged {
        /// Entity whose attributes changed.
        owner: EntityId,
        /// Per-attribute changes.
        changes: Vec<AttributeChange>,
    },
    /// One or more current values changed in a single pass.
    AttributeCurrentChanged {
        /// Entity whose attributes changed.
        owner: EntityId,
        /// Per-attribute changes.
        changes: Vec<AttributeChange>,
    },
    /// A state instance became active.
    StateApplied {
        /// Owning entity.
        owner: EntityId,
        /// New instance.
        instance: StateInstanceId,
        /// Definition id.
        state: StateDefId,
        /// Who applied it.
        instigator: Option<EntityId>,
    },
    /// A state instance left every registry.
    StateRemoved {
        /// Owning entity.
        owner: EntityId,
        /// Removed instance.
        instance: StateInstanceId,
        /// Definition id.
        state: StateDefId,
        /// Why it ended.
        reason: RemovalReason,
    },
    /// A duration was refreshed or set explicitly (not natural decay).
    StateDurationChanged {
        /// Owning entity.
        owner: EntityId,
        /// Instance.
        instance: StateInstanceId,
        /// Seconds left.
        remaining: f32,
    },
    /// A stack count changed.
    StateStackChanged {
        /// Owning entity.
        owner: EntityId,
        /// Instance.
        instance: StateInstanceId,
        /// Previous count.
        old_count: i32,
        /// New count.
        new_count: i32,
    },
    /// A slot's occupant list changed.
    SlotChanged {
        /// Owning entity.
        owner: EntityId,
        /// Slot tag.
        slot: String,
        /// Occupants after the change, in insertion order.
        occupants: Vec<StateInstanceId>,
    },
    /// A skill was added to a catalog.
    SkillLearned {
        /// Owning entity.
        owner: EntityId,
        /// Skill id.
        skill: SkillDefId,
        /// Initial level.
        level: i32,
    },
    /// A skill was removed from a catalog.
    SkillForgotten {
        /// Owning entity.
        owner: EntityId,
        /// Skill id.
        skill: SkillDefId,
    },
    /// A skill was cast.
    SkillCast {
        /// Caster.
        owner: EntityId,
        /// Skill id.
        skill: SkillDefId,
        /// Granted state instance.
        instance: StateInstanceId,
        /// Cast target, if any.
        target: Option<EntityId>,
    },
    /// A real-time or snapshot skill parameter was written to its state.
    SkillParameterChanged {
        /// Owning entity.
        owner: EntityId,
        /// Skill id.
        skill: SkillDefId,
        /// Parameter name.
        name: String,
        /// New value.
        value: f32,
    },
    /// A skill's level changed.
    SkillLevelChanged {
        /// Owning entity.
        owner: EntityId,
        /// Skill id.
        skill: SkillDefId,
        /// New level.
        level: i32,
    },
    /// A cooldown was set, reduced or cleared.
    CooldownChanged {
        /// Owning entity.
        owner: EntityId,
        /// Skill id.
        skill: SkillDefId,
        /// Seconds left; zero when cleared.
        remaining: f32,
    },
    /// A behavior script emitted a named signal.
    BehaviorSignal {
        /// Owning entity.
        owner: EntityId,
        /// Emitting instance.
        instance: StateInstanceId,
        /// Signal tag.
        tag: String,
    },
}

/// Discriminant of [`CombatEvent`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    /// See [`CombatEvent::AttributeBaseChanged`].
    AttributeBaseChanged,
    /// See [`CombatEvent::AttributeCurrentChanged`].
    AttributeCurrentChanged,
    /// See [`CombatEvent::StateApplied`].
    StateApplied,
    /// See [`CombatEvent::StateRemoved`].
    StateRemoved,
    /// See [`CombatEvent::StateDurationChanged`].
    StateDurationChanged,
    /// See [`CombatEvent::StateStackChanged`].
    StateStackChanged,
    /// See [`CombatEvent::SlotChanged`].
    SlotChanged,
    /// See [`CombatEvent::SkillLearned`].
    SkillLearned,
    /// See [`CombatEvent::SkillForgotten`].
    SkillForgotten,
    /// See [`CombatEvent::SkillCast`].
    SkillCast,
    /// See [`CombatEvent::SkillParameterChanged`].
    SkillParameterChanged,
    /// See [`CombatEvent::SkillLevelChanged`].
    SkillLevelChanged,
    /// See [`CombatEvent::CooldownChanged`].
    CooldownChanged,
    /// See [`CombatEvent::BehaviorSignal`].
    BehaviorSignal,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl CombatEvent {
    /// Returns the event's discriminant.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::AttributeBaseChanged { .. } => EventKind::AttributeBaseChanged,
            Self::AttributeCurrentChanged { .. } => EventKind::AttributeCurrentChanged,
            Self::StateApplied { .. } => EventKind::StateApplied,
            Self::StateRemoved { .. } => EventKind::StateRemoved,
            Self::StateDurationChanged { .. } => EventKind::StateDurationChanged,
            Self::StateStackChanged { .. } => EventKind::StateStackChanged,
            Self::SlotChanged { .. } => EventKind::SlotChanged,
            Self::SkillLearned { .. } => EventKind::SkillLearned,
            Self::SkillForgotten { .. } => EventKind::SkillForgotten,
            Self::SkillCast { .. } => EventKind::SkillCast,
            Self::SkillParameterChanged { .. } => EventKind::SkillParameterChanged,
            Self::SkillLevelChanged { .. } => EventKind::SkillLevelChanged,
            Self::CooldownChanged { .. } => EventKind::CooldownChanged,
            Self::BehaviorSignal { .. } => EventKind::BehaviorSignal,
        }
    }

    /// Returns the entity the event is about.
    #[must_use]
    pub const fn owner(&self) -> EntityId {
        match self {
            Self::AttributeBaseChanged { owner, .. }
            | Self::AttributeCurrentChanged { owner, .. }
            | Self::StateApplied { owner, .. }
            | Self::StateRemoved { owner, .. }
            | Self::StateDurationChanged { owner, .. }
            | Self::StateStackChanged { owner, .. }
            | Self::SlotChanged { owner, .. }
            | Self::SkillLearned { owner, .. }
            | Self::SkillForgotten { owner, .. }
            | Self::SkillCast { owner, .. }
            | Self::SkillParameterChanged { owner, .. }
            | Self::SkillLevelChanged { owner, .. }
            | Self::CooldownChanged { owner, .. }
            | Self::BehaviorSignal { owner, .. } => *owner,
        }
    }

    /// Returns the attribute changes carried by attribute events.
    #[must_use]
    pub fn attribute_changes(&self) -> Option<&[AttributeChange]> {
        match self {
            Self::AttributeBaseChanged { changes, .. }
            | Self::AttributeCurrentChanged { changes, .. } => Some(changes),
            _ => None,
        }
    }
}

// =============================================================================
// Sinks and Bus
// =============================================================================

/// Receiver of published events.
pub trait EventSink: Send + Sync {
    /// Called once per published event.
    fn on_event(&mut self, event: &CombatEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&CombatEvent) + Send + Sync,
{
    fn on_event(&mut self, event: &CombatEvent) {
        self(event);
    }
}

/// Synchronous event dispatcher with an optional log.
pub struct EventBus {
    sinks: Vec<Box<dyn EventSink>>,
    log: Vec<CombatEvent>,
    record: bool,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(true)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("sinks", &self.sinks.len())
            .field("logged", &self.log.len())
            .field("record", &self.record)
            .finish()
    }
}

impl EventBus {
    /// Creates a bus; `record` keeps published events for [`take_events`](Self::take_events).
    #[must_use]
    pub fn new(record: bool) -> Self {
        Self {
            sinks: Vec::new(),
            log: Vec::new(),
            record,
        }
    }

    /// Adds a subscriber. Subscribers are called in the order they were added.
    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Returns the number of subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sinks.len()
    }

    /// Delivers an event to every subscriber and logs it if recording.
    pub fn publish(&mut self, event: CombatEvent) {
        for sink in &mut self.sinks {
            sink.on_event(&event);
        }
        if self.record {
            self.log.push(event);
        }
    }

    /// Returns the logged events.
    #[must_use]
    pub fn events(&self) -> &[CombatEvent] {
        &self.log
    }

    /// Drains the log.
    pub fn take_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.log)
    }

    /// Turns logging on or off. Turning it off clears the log.
    pub fn set_recording(&mut self, record: bool) {
        self.record = record;
        if !record {
            self.log.clear();
        }
    }
}
