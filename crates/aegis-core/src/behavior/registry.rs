use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::scripts::{InstantEffect, ModifierAura, PeriodicEffect};
use super::BehaviorMachine;
use crate::state::StateDefinition;

/// Creates a fresh machine for a state definition.
pub type BehaviorFactory = dyn Fn(&StateDefinition) -> Box<dyn BehaviorMachine> + Send + Sync;

/// Behavior scripts keyed by name.
///
/// # Example
///
/// ```
/// use aegis_core::behavior::{BehaviorRegistry, scripts::ModifierAura};
/// use aegis_core::state::{StateDefinition, StateKind};
///
/// let mut registry = BehaviorRegistry::new();
/// registry.register("Aura", |_| Box::new(ModifierAura::new()));
///
/// let def = StateDefinition::new("Blessing", StateKind::Buff).with_behavior("Aura");
/// let machine = registry.create("Aura", &def).unwrap();
/// assert_eq!(machine.script_id(), ModifierAura::SCRIPT_ID);
/// ```
#[derive(Default, Clone)]
pub struct BehaviorRegistry {
    factories: BTreeMap<String, Arc<BehaviorFactory>>,
}

impl BehaviorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in scripts.
    ///
    /// - `ModifierAura`: [`ModifierAura`]
    /// - `PeriodicEffect`: [`PeriodicEffect`]
    /// - `InstantEffect`: [`InstantEffect`]
    #[must_use]
    pub fn with_builtin_scripts() -> Self {
        let mut registry = Self::new();
        registry.register(ModifierAura::SCRIPT_ID, |_| Box::new(ModifierAura::new()));
        registry.register(PeriodicEffect::SCRIPT_ID, |_| Box::new(PeriodicEffect::new()));
        registry.register(InstantEffect::SCRIPT_ID, |_| Box::new(InstantEffect));
        registry
    }

    /// Registers a factory, replacing any previous one with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&StateDefinition) -> Box<dyn BehaviorMachine> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Builds a machine for `definition` with the named script.
    #[must_use]
    pub fn create(&self, name: &str, definition: &StateDefinition) -> Option<Box<dyn BehaviorMachine>> {
        self.factories.get(name).map(|factory| factory(definition))
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Returns the number of scripts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if no script is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Iterates script names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl fmt::Debug for BehaviorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorRegistry")
            .field("scripts", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
