//! Re-application policies.
//!
//! When a state is applied to an entity that already holds an active
//! instance of the same definition, the definition may name a policy for the
//! same instigator and one for a different instigator. A registered policy
//! decides whether the existing instance absorbs the application or a new
//! independent instance is created.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{StateInstance, StateParameters};

/// Outcome of a stacking policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackingDecision {
    /// Create a separate instance.
    CreateNew,
    /// Fold the application into the existing instance.
    Absorb {
        /// Stacks to add to the existing instance.
        add_stacks: i32,
        /// Reset the existing instance's remaining duration.
        refresh_duration: bool,
    },
}

/// Decides how a re-application interacts with an existing instance.
pub trait StackingPolicy: Send + Sync {
    /// Called with the oldest active instance of the definition.
    fn decide(&self, existing: &StateInstance, incoming: &StateParameters) -> StackingDecision;
}

/// Adds one stack and refreshes the duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddStackPolicy;

impl StackingPolicy for AddStackPolicy {
    fn decide(&self, _existing: &StateInstance, _incoming: &StateParameters) -> StackingDecision {
        StackingDecision::Absorb {
            add_stacks: 1,
            refresh_duration: true,
        }
    }
}

/// Refreshes the duration without stacking.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshDurationPolicy;

impl StackingPolicy for RefreshDurationPolicy {
    fn decide(&self, _existing: &StateInstance, _incoming: &StateParameters) -> StackingDecision {
        StackingDecision::Absorb {
            add_stacks: 0,
            refresh_duration: true,
        }
    }
}

/// Stacking policies keyed by name.
#[derive(Default, Clone)]
pub struct StackingRegistry {
    policies: BTreeMap<String, Arc<dyn StackingPolicy>>,
}

impl StackingRegistry {
    /// Name of [`AddStackPolicy`] in [`with_builtin_policies`](Self::with_builtin_policies).
    pub const ADD_STACK: &'static str = "AddStack";
    /// Name of [`RefreshDurationPolicy`] in [`with_builtin_policies`](Self::with_builtin_policies).
    pub const REFRESH_DURATION: &'static str = "RefreshDuration";

    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in policies.
    #[must_use]
    pub fn with_builtin_policies() -> Self {
        let mut registry = Self::new();
        registry.register(Self::ADD_STACK, Arc::new(AddStackPolicy));
        registry.register(Self::REFRESH_DURATION, Arc::new(RefreshDurationPolicy));
        registry
    }

    /// Registers a policy, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, policy: Arc<dyn StackingPolicy>) {
        self.policies.insert(name.into(), policy);
    }

    /// Looks up a policy.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn StackingPolicy>> {
        self.policies.get(name)
    }

    /// Returns the number of policies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Returns true if no policy is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl fmt::Debug for StackingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackingRegistry")
            .field("policies", &self.policies.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;
    use crate::state::{StateDefinition, StateInstanceId, StateKind};

    fn existing() -> StateInstance {
        StateInstance::new(
            Arc::new(StateDefinition::new("Bleed", StateKind::Buff).with_max_stacks(5)),
            StateInstanceId::new(1),
            EntityId::new(1),
            None,
            StateParameters::new(),
            0.0,
        )
    }

    #[test]
    fn builtins_are_registered() {
        let registry = StackingRegistry::with_builtin_policies();
        assert_eq!(registry.len(), 2);
        let add = registry.get(StackingRegistry::ADD_STACK).unwrap();
        assert_eq!(
            add.decide(&existing(), &StateParameters::new()),
            StackingDecision::Absorb {
                add_stacks: 1,
                refresh_duration: true
            }
        );
        assert!(registry.get("Unknown").is_none());
    }

    #[test]
    fn custom_policy() {
        struct Never;
        impl StackingPolicy for Never {
            fn decide(&self, _: &StateInstance, _: &StateParameters) -> StackingDecision {
                StackingDecision::CreateNew
            }
        }
        let mut registry = StackingRegistry::new();
        registry.register("Never", Arc::new(Never));
        let policy = registry.get("Never").unwrap();
        assert_eq!(
            policy.decide(&existing(), &StateParameters::new()),
            StackingDecision::CreateNew
        );
    }
}
