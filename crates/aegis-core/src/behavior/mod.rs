//! Behavior machines: the scripted logic that drives a state instance.
//!
//! The core treats a behavior as an opaque machine with five entry points
//! (`initialize`, `start`, `tick`, `stop`, `send_event`) and a
//! [`RunStatus`]. A machine never touches the arena directly. It reads
//! through an [`ArenaView`], edits its own [`StateInstance`] and queues
//! [`BehaviorCommand`]s that the lifecycle manager resolves once the call
//! returns.
//!
//! # Example
//!
//! ```
//! use aegis_core::behavior::{BehaviorContext, BehaviorMachine, RunStatus};
//!
//! /// Emits a signal every tick and never finishes.
//! struct Heartbeat;
//!
//! impl BehaviorMachine for Heartbeat {
//!     fn script_id(&self) -> &str {
//!         "Heartbeat"
//!     }
//!
//!     fn start(&mut self, _ctx: &mut BehaviorContext<'_>) -> RunStatus {
//!         RunStatus::Running
//!     }
//!
//!     fn tick(&mut self, ctx: &mut BehaviorContext<'_>, _dt: f32) -> RunStatus {
//!         ctx.signal("beat");
//!         RunStatus::Running
//!     }
//! }
//! ```

mod commands;
mod registry;
pub mod scripts;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::state::{GrantTarget, RemovalReason, StateInstance};
use crate::view::ArenaView;

pub use commands::BehaviorCommand;
pub use registry::{BehaviorFactory, BehaviorRegistry};

// =============================================================================
// Status and Dependencies
// =============================================================================

/// Status reported by a behavior machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    /// Not started yet.
    #[default]
    NotStarted,
    /// Still running.
    Running,
    /// Finished successfully.
    Succeeded,
    /// Finished with failure.
    Failed,
    /// Stopped from outside.
    Stopped,
}

impl RunStatus {
    /// Returns true for `Succeeded`, `Failed` and `Stopped`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Stopped)
    }
}

/// Data a machine needs before it can start or tick.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataDependency {
    /// A numeric state parameter.
    NumericParameter(String),
    /// A boolean state parameter.
    BoolParameter(String),
    /// A living instigator.
    Instigator,
    /// A living target.
    Target,
}

impl DataDependency {
    /// Returns true if the dependency is available for `instance`.
    #[must_use]
    pub fn is_satisfied(&self, view: ArenaView<'_>, instance: &StateInstance) -> bool {
        match self {
            Self::NumericParameter(name) => instance.numeric_parameter(name).is_some(),
            Self::BoolParameter(name) => instance.bool_parameter(name).is_some(),
            Self::Instigator => instance.instigator().is_some_and(|id| view.exists(id)),
            Self::Target => instance.target().is_some_and(|id| view.exists(id)),
        }
    }
}

/// A named event delivered to a running machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorEvent {
    /// Event tag.
    pub tag: String,
    /// Numeric payload.
    pub values: BTreeMap<String, f32>,
    /// Entity that raised the event.
    pub source: Option<EntityId>,
}

impl BehaviorEvent {
    /// Creates an event without payload.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Adds a payload value.
    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: f32) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Sets the source entity.
    #[must_use]
    pub fn from_entity(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }
}

// =============================================================================
// Context
// =============================================================================

/// What a machine sees during one call.
pub struct BehaviorContext<'a> {
    view: ArenaView<'a>,
    instance: &'a mut StateInstance,
    commands: Vec<BehaviorCommand>,
}

impl<'a> BehaviorContext<'a> {
    /// Creates a context over a detached instance.
    pub fn new(view: ArenaView<'a>, instance: &'a mut StateInstance) -> Self {
        Self {
            view,
            instance,
            commands: Vec::new(),
        }
    }

    /// Read-only arena access. The instance itself is not visible through it.
    #[must_use]
    pub const fn view(&self) -> ArenaView<'a> {
        self.view
    }

    /// World time in seconds.
    #[must_use]
    pub const fn now(&self) -> f64 {
        self.view.now()
    }

    /// The state instance being driven.
    #[must_use]
    pub fn instance(&self) -> &StateInstance {
        &*self.instance
    }

    /// The state instance being driven, mutably.
    pub fn instance_mut(&mut self) -> &mut StateInstance {
        &mut *self.instance
    }

    /// Queues a command.
    pub fn push(&mut self, command: BehaviorCommand) {
        self.commands.push(command);
    }

    /// Queues several commands.
    pub fn extend(&mut self, commands: impl IntoIterator<Item = BehaviorCommand>) {
        self.commands.extend(commands);
    }

    /// Queues a modifier application.
    pub fn apply_modifier(
        &mut self,
        target: GrantTarget,
        modifier: impl Into<String>,
        operands: BTreeMap<String, f32>,
    ) {
        self.push(BehaviorCommand::ApplyModifier {
            target,
            modifier: modifier.into(),
            operands,
        });
    }

    /// Queues removal of this instance.
    pub fn cancel_self(&mut self) {
        self.push(BehaviorCommand::CancelSelf);
    }

    /// Queues a signal event.
    pub fn signal(&mut self, tag: impl Into<String>) {
        self.push(BehaviorCommand::Signal(tag.into()));
    }

    /// Returns the queued commands.
    #[must_use]
    pub fn commands(&self) -> &[BehaviorCommand] {
        &self.commands
    }

    /// Consumes the context and returns the queued commands.
    #[must_use]
    pub fn into_commands(self) -> Vec<BehaviorCommand> {
        self.commands
    }
}

// =============================================================================
// Machine Trait
// =============================================================================

/// Scripted logic bound to one state instance.
///
/// `start` and `tick` returning a terminal status end the instance. Machines
/// whose [`dependencies`](Self::dependencies) are missing are failed without
/// being called.
pub trait BehaviorMachine: Send + Sync {
    /// Registered script name.
    fn script_id(&self) -> &str;

    /// Data that must be present before `start` and every `tick`.
    fn dependencies(&self) -> Vec<DataDependency> {
        Vec::new()
    }

    /// Binds the machine to its instance. Returning false aborts the
    /// application.
    fn initialize(&mut self, _view: ArenaView<'_>, _instance: &StateInstance) -> bool {
        true
    }

    /// Starts the machine.
    fn start(&mut self, ctx: &mut BehaviorContext<'_>) -> RunStatus;

    /// Advances the machine by `dt` seconds.
    fn tick(&mut self, ctx: &mut BehaviorContext<'_>, dt: f32) -> RunStatus;

    /// Stops a running machine.
    fn stop(&mut self, _ctx: &mut BehaviorContext<'_>, _reason: RemovalReason) -> RunStatus {
        RunStatus::Stopped
    }

    /// Handles an external event.
    fn send_event(&mut self, _ctx: &mut BehaviorContext<'_>, _event: &BehaviorEvent) {}
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::arena::Arena;
    use crate::entity::EntityTag;
    use crate::state::{StateDefinition, StateInstanceId, StateKind, StateParameters};

    fn instance(instigator: Option<EntityId>) -> StateInstance {
        StateInstance::new(
            Arc::new(StateDefinition::new("Test", StateKind::Buff)),
            StateInstanceId::new(1),
            EntityId::new(0),
            instigator,
            StateParameters::new().with_numeric("Interval", 1.0),
            0.0,
        )
    }

    #[test]
    fn terminal_statuses() {
        assert!(!RunStatus::NotStarted.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Succeeded.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Stopped.is_terminal());
    }

    #[test]
    fn dependencies_check_instance_and_arena() {
        let mut arena = Arena::new();
        let caster = arena.spawn(EntityTag::Combatant, "caster");
        let inst = instance(Some(caster));
        let view = arena.view();

        assert!(DataDependency::NumericParameter("Interval".into()).is_satisfied(view, &inst));
        assert!(!DataDependency::NumericParameter("Radius".into()).is_satisfied(view, &inst));
        assert!(!DataDependency::BoolParameter("Crit".into()).is_satisfied(view, &inst));
        assert!(DataDependency::Instigator.is_satisfied(view, &inst));
        assert!(!DataDependency::Target.is_satisfied(view, &inst));
    }

    #[test]
    fn despawned_instigator_is_missing() {
        let mut arena = Arena::new();
        let caster = arena.spawn(EntityTag::Combatant, "caster");
        arena.despawn(caster);
        let inst = instance(Some(caster));
        assert!(!DataDependency::Instigator.is_satisfied(arena.view(), &inst));
    }

    #[test]
    fn context_collects_commands() {
        let arena = Arena::new();
        let mut inst = instance(None);
        let mut ctx = BehaviorContext::new(arena.view(), &mut inst);
        ctx.signal("hit");
        ctx.cancel_self();
        ctx.instance_mut().set_numeric_parameter("Charge", 2.0);
        assert_eq!(ctx.commands().len(), 2);
        let commands = ctx.into_commands();
        assert_eq!(commands[0], BehaviorCommand::Signal("hit".to_string()));
        assert_eq!(inst.numeric_parameter("Charge"), Some(2.0));
    }

    #[test]
    fn event_builder() {
        let event = BehaviorEvent::new("Parry")
            .with_value("Power", 3.0)
            .from_entity(EntityId::new(4));
        assert_eq!(event.tag, "Parry");
        assert_eq!(event.source, Some(EntityId::new(4)));
        assert!((event.values["Power"] - 3.0).abs() < 0.0001);
    }
}
