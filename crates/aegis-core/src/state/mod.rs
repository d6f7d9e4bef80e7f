//! States: buffs, skills and generic statuses applied to an entity.
//!
//! A [`StateDefinition`] describes the effect. Each application creates a
//! [`StateInstance`] owned by the entity's [`StateComponent`], which also
//! holds the per-entity duration and slot registries. All creation and
//! destruction goes through the [`StateLifecycleManager`].
//!
//! Stage transitions of an instance:
//!
//! ```text
//! Uninitialized --start--> Active --{expire, cancel, evict, finish}--> Expired
//! ```

mod component;
mod definition;
mod duration;
mod instance;
mod lifecycle;
mod slot;
mod stacking;

pub use component::StateComponent;
pub use definition::{DurationKind, GrantTarget, GrantedModifier, StateDefId, StateDefinition, StateKind};
pub use duration::{DurationData, StateDurationScheduler};
pub use instance::{
    RemovalReason, StateInstance, StateInstanceId, StateParameters, StateStage,
};
pub use lifecycle::StateLifecycleManager;
pub(crate) use lifecycle::Spawned;
pub use slot::{SlotChange, SlotKind, StateSlotManager};
pub use stacking::{
    AddStackPolicy, RefreshDurationPolicy, StackingDecision, StackingPolicy, StackingRegistry,
};
