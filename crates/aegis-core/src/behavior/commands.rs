use std::collections::BTreeMap;

use crate::state::{GrantTarget, StateDefId, StateParameters};

/// A change a behavior machine asks the lifecycle manager to make.
///
/// Commands are resolved in the order they were queued, after the machine
/// call returns. Targets are resolved against the issuing instance: a
/// missing instigator or target turns the command into a logged no-op.
#[derive(Debug, Clone, PartialEq)]
pub enum BehaviorCommand {
    /// Apply a registered modifier. The modifier's source name is the
    /// instance's source tag.
    ApplyModifier {
        /// Receiver.
        target: GrantTarget,
        /// Modifier definition name.
        modifier: String,
        /// Operand values.
        operands: BTreeMap<String, f32>,
    },
    /// Remove persistent modifiers this instance granted, from one receiver
    /// or from all of them.
    RemoveGrantedModifiers {
        /// Receiver, or `None` for every receiver.
        target: Option<GrantTarget>,
    },
    /// Apply another state with this instance's owner as instigator.
    ApplyState {
        /// Receiver.
        target: GrantTarget,
        /// State definition id.
        state: StateDefId,
        /// Parameters for the new instance.
        parameters: StateParameters,
    },
    /// Remove this instance.
    CancelSelf,
    /// Reset the remaining duration.
    RefreshDuration,
    /// Set the remaining duration in seconds.
    SetDuration(f32),
    /// Add stacks.
    AddStack(i32),
    /// Remove stacks.
    RemoveStack(i32),
    /// Publish a behavior signal event.
    Signal(String),
}

impl BehaviorCommand {
    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ApplyModifier { .. } => "ApplyModifier",
            Self::RemoveGrantedModifiers { .. } => "RemoveGrantedModifiers",
            Self::ApplyState { .. } => "ApplyState",
            Self::CancelSelf => "CancelSelf",
            Self::RefreshDuration => "RefreshDuration",
            Self::SetDuration(_) => "SetDuration",
            Self::AddStack(_) => "AddStack",
            Self::RemoveStack(_) => "RemoveStack",
            Self::Signal(_) => "Signal",
        }
    }
}
