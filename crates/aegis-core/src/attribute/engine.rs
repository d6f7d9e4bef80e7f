//! Attribute recalculation.
//!
//! The engine turns a store's base values plus its modifiers into new values
//! and a precise list of changes:
//!
//! 1. **Merge**: instances are grouped by definition name and reduced with
//!    the group's [`MergerKind`](crate::modifier::MergerKind).
//! 2. **Sort**: merged instances are stably sorted by priority, lower first.
//! 3. **Execute**: each instance runs its executor on a working copy of the
//!    value map; the delta on the target attribute is credited to the
//!    instance's `source_name`.
//! 4. **Clamp**: touched values are clamped to their attribute's range.
//! 5. **Diff**: values that moved beyond the tolerance are written back and
//!    reported as one [`AttributeChange`] each.
//!
//! The base pass runs only the one-shot `BaseValue` modifiers it is handed.
//! The current pass always starts from the base values and runs every
//! persistent `CurrentValue` modifier of the store, so the current layer is a
//! pure function of (base values, active modifiers).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use aegis_core::attribute::{
//!     AttributeDefinition, AttributeEngine, AttributeInstanceId, AttributeStore, RangeRule,
//! };
//! use aegis_core::entity::EntityId;
//! use aegis_core::modifier::{
//!     ExecutorKind, ModifierDefinition, ModifierFactory, ModifierMode,
//! };
//!
//! let mut store = AttributeStore::new(EntityId::new(1));
//! let health = AttributeDefinition::new("Health").with_range(RangeRule::fixed(0.0, 100.0));
//! store.add_attribute(Arc::new(health), AttributeInstanceId::new(1), 100.0);
//!
//! let hit = Arc::new(ModifierDefinition::new(
//!     "Hit", "Health", ModifierMode::CurrentValue, ExecutorKind::Addition,
//! ));
//! let mut factory = ModifierFactory::new();
//! let modifier = factory.create(hit, "Goblin").with_magnitude(-150.0);
//!
//! let engine = AttributeEngine::default();
//! let report = engine.apply_modifiers(&mut store, vec![modifier], 0.0);
//!
//! assert_eq!(store.current_value("Health"), Some(0.0));
//! assert_eq!(report.current[0].old_value, 100.0);
//! assert_eq!(report.current[0].new_value, 0.0);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::{AttributeStore, AttributeValues};
use crate::arena::Arena;
use crate::config::CoreConfig;
use crate::entity::EntityId;
use crate::event::CombatEvent;
use crate::modifier::{merge_and_sort, ModifierInstance, ModifierMode};

// =============================================================================
// Change Payloads
// =============================================================================

/// One attribute's change from a recalculation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// Attribute name.
    pub attribute: String,
    /// Value before the pass.
    pub old_value: f32,
    /// Value after clamping.
    pub new_value: f32,
    /// Unclamped delta contributed by each source name.
    pub sources: BTreeMap<String, f32>,
}

impl AttributeChange {
    /// Returns `new_value - old_value`.
    #[must_use]
    pub fn delta(&self) -> f32 {
        self.new_value - self.old_value
    }
}

/// Changes produced by one engine call, split by layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecalculationReport {
    /// Base-value changes.
    pub base: Vec<AttributeChange>,
    /// Current-value changes.
    pub current: Vec<AttributeChange>,
}

impl RecalculationReport {
    /// Returns true if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.current.is_empty()
    }

    /// Finds the current-value change for `attribute`.
    #[must_use]
    pub fn current_change(&self, attribute: &str) -> Option<&AttributeChange> {
        self.current.iter().find(|c| c.attribute == attribute)
    }

    /// Finds the base-value change for `attribute`.
    #[must_use]
    pub fn base_change(&self, attribute: &str) -> Option<&AttributeChange> {
        self.base.iter().find(|c| c.attribute == attribute)
    }
}

type SourceDeltas = BTreeMap<String, BTreeMap<String, f32>>;

// =============================================================================
// Engine
// =============================================================================

/// Stateless recalculation engine.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AttributeEngine {
    tolerance: f32,
}

impl Default for AttributeEngine {
    fn default() -> Self {
        Self::new(CoreConfig::default().value_tolerance)
    }
}

impl AttributeEngine {
    /// Creates an engine with the given nearly-equal tolerance.
    #[must_use]
    pub const fn new(tolerance: f32) -> Self {
        Self { tolerance }
    }

    /// Creates an engine from the core configuration.
    #[must_use]
    pub const fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.value_tolerance)
    }

    /// Returns the nearly-equal tolerance.
    #[must_use]
    pub const fn tolerance(&self) -> f32 {
        self.tolerance
    }

    // -------------------------------------------------------------------------
    // Store-level operations
    // -------------------------------------------------------------------------

    /// Applies modifiers to a store.
    ///
    /// `BaseValue` modifiers run once against the base layer and are dropped.
    /// `CurrentValue` modifiers are stamped with `now` and stored; an instance
    /// already stored (same name and id) is replaced in place, keeping its
    /// original apply timestamp. Current values are recalculated afterwards
    /// in every case. An empty input does nothing.
    pub fn apply_modifiers(
        &self,
        store: &mut AttributeStore,
        modifiers: Vec<ModifierInstance>,
        now: f64,
    ) -> RecalculationReport {
        if modifiers.is_empty() {
            return RecalculationReport::default();
        }
        let (one_shot, persistent): (Vec<_>, Vec<_>) = modifiers
            .into_iter()
            .partition(|m| m.mode() == ModifierMode::BaseValue);

        let base = if one_shot.is_empty() {
            Vec::new()
        } else {
            self.recalculate_base_values(store, one_shot)
        };

        let active = store.active_modifiers_mut();
        for mut modifier in persistent {
            if let Some(existing) = active.iter_mut().find(|m| **m == modifier) {
                modifier.stamp(existing.apply_timestamp(), now);
                *existing = modifier;
            } else {
                modifier.stamp(now, now);
                active.push(modifier);
            }
        }

        let current = self.recalculate_current_values(store);
        RecalculationReport { base, current }
    }

    /// Removes stored modifiers by equality and recalculates if any was found.
    pub fn remove_modifiers(
        &self,
        store: &mut AttributeStore,
        modifiers: &[ModifierInstance],
    ) -> RecalculationReport {
        let active = store.active_modifiers_mut();
        let before = active.len();
        active.retain(|m| !modifiers.contains(m));
        if active.len() == before {
            return RecalculationReport::default();
        }
        RecalculationReport {
            base: Vec::new(),
            current: self.recalculate_current_values(store),
        }
    }

    /// Removes every stored modifier whose source name is `source`.
    pub fn remove_modifiers_from_source(
        &self,
        store: &mut AttributeStore,
        source: &str,
    ) -> RecalculationReport {
        let active = store.active_modifiers_mut();
        let before = active.len();
        active.retain(|m| m.source_name() != source);
        if active.len() == before {
            return RecalculationReport::default();
        }
        RecalculationReport {
            base: Vec::new(),
            current: self.recalculate_current_values(store),
        }
    }

    /// Replaces stored modifiers whose operands changed externally.
    ///
    /// Inputs not found in the store are ignored. Recalculates if any was
    /// replaced.
    pub fn handle_modifiers_updated(
        &self,
        store: &mut AttributeStore,
        modifiers: Vec<ModifierInstance>,
        now: f64,
    ) -> RecalculationReport {
        let active = store.active_modifiers_mut();
        let mut replaced = false;
        for mut modifier in modifiers {
            if let Some(existing) = active.iter_mut().find(|m| **m == modifier) {
                modifier.stamp(existing.apply_timestamp(), now);
                *existing = modifier;
                replaced = true;
            }
        }
        if !replaced {
            return RecalculationReport::default();
        }
        RecalculationReport {
            base: Vec::new(),
            current: self.recalculate_current_values(store),
        }
    }

    /// Runs one-shot modifiers against the base layer.
    ///
    /// Dynamic range bounds read the stored current values. Only attributes a
    /// modifier targeted are clamped and compared.
    pub fn recalculate_base_values(
        &self,
        store: &mut AttributeStore,
        modifiers: Vec<ModifierInstance>,
    ) -> Vec<AttributeChange> {
        let ordered = merge_and_sort(modifiers);
        let mut working = store.base_values();
        let mut shadow = working.clone();
        let mut deltas = SourceDeltas::new();
        let touched = execute_ordered(
            &ordered,
            &mut working,
            &mut shadow,
            ModifierMode::BaseValue,
            &mut deltas,
        );

        let bounds = store.current_values();
        let mut changes = Vec::new();
        for name in touched {
            let Some(candidate) = working.get(&name).copied() else { continue };
            let Some(stored) = store.base_value(&name) else { continue };
            let value = self.clamp(store, &name, candidate, &bounds);
            if self.nearly_equal(value, stored) {
                continue;
            }
            store.set_base_value(&name, value);
            changes.push(AttributeChange {
                sources: deltas.remove(&name).unwrap_or_default(),
                attribute: name,
                old_value: stored,
                new_value: value,
            });
        }
        if !changes.is_empty() {
            debug!(entity = %store.owner(), changed = changes.len(), "base values recalculated");
        }
        changes
    }

    /// Recomputes every current value from the base values and all stored
    /// modifiers.
    ///
    /// Dynamic range bounds read the unclamped working values, so the result
    /// does not depend on the order attributes are clamped in.
    pub fn recalculate_current_values(&self, store: &mut AttributeStore) -> Vec<AttributeChange> {
        let ordered = merge_and_sort(store.active_modifiers().iter().cloned());
        let mut base = store.base_values();
        let mut working = base.clone();
        let mut deltas = SourceDeltas::new();
        execute_ordered(
            &ordered,
            &mut base,
            &mut working,
            ModifierMode::CurrentValue,
            &mut deltas,
        );

        let bounds = working.clone();
        let mut changes = Vec::new();
        for (name, candidate) in working {
            let Some(stored) = store.current_value(&name) else { continue };
            let value = self.clamp(store, &name, candidate, &bounds);
            if self.nearly_equal(value, stored) {
                continue;
            }
            store.set_current_value(&name, value);
            changes.push(AttributeChange {
                sources: deltas.remove(&name).unwrap_or_default(),
                attribute: name,
                old_value: stored,
                new_value: value,
            });
        }
        if !changes.is_empty() {
            debug!(entity = %store.owner(), changed = changes.len(), "current values recalculated");
        }
        changes
    }

    fn clamp(&self, store: &AttributeStore, name: &str, candidate: f32, bounds: &AttributeValues) -> f32 {
        let Some(range) = store.range_of(name) else {
            return candidate;
        };
        match range.clamp(candidate, bounds) {
            Ok(value) => value,
            Err(missing) => {
                warn!(
                    entity = %store.owner(),
                    attribute = name,
                    bound = missing,
                    "range bound attribute missing; value left unclamped"
                );
                candidate
            }
        }
    }

    fn nearly_equal(&self, a: f32, b: f32) -> bool {
        (a - b).abs() <= self.tolerance
    }

    // -------------------------------------------------------------------------
    // Entity-level operations
    // -------------------------------------------------------------------------

    /// Applies modifiers to an entity and publishes the resulting events.
    ///
    /// Returns false if the entity is gone or has no attribute store.
    pub fn apply_to_entity(
        &self,
        arena: &mut Arena,
        entity: EntityId,
        modifiers: Vec<ModifierInstance>,
    ) -> bool {
        let now = arena.now();
        self.with_store(arena, entity, |engine, store| {
            engine.apply_modifiers(store, modifiers, now)
        })
    }

    /// Removes modifiers from an entity and publishes the resulting events.
    pub fn remove_from_entity(
        &self,
        arena: &mut Arena,
        entity: EntityId,
        modifiers: &[ModifierInstance],
    ) -> bool {
        self.with_store(arena, entity, |engine, store| {
            engine.remove_modifiers(store, modifiers)
        })
    }

    /// Removes every modifier from `source` on an entity.
    pub fn remove_source_from_entity(&self, arena: &mut Arena, entity: EntityId, source: &str) -> bool {
        self.with_store(arena, entity, |engine, store| {
            engine.remove_modifiers_from_source(store, source)
        })
    }

    /// Re-applies externally updated modifiers on an entity.
    pub fn update_on_entity(
        &self,
        arena: &mut Arena,
        entity: EntityId,
        modifiers: Vec<ModifierInstance>,
    ) -> bool {
        let now = arena.now();
        self.with_store(arena, entity, |engine, store| {
            engine.handle_modifiers_updated(store, modifiers, now)
        })
    }

    fn with_store(
        &self,
        arena: &mut Arena,
        entity: EntityId,
        op: impl FnOnce(&Self, &mut AttributeStore) -> RecalculationReport,
    ) -> bool {
        let Some(store) = arena.attributes_mut(entity) else {
            warn!(entity = %entity, "entity has no attribute store");
            return false;
        };
        let report = op(self, store);
        publish_report(arena, entity, report);
        true
    }
}

/// Publishes a report as one batched event per non-empty layer.
pub(crate) fn publish_report(arena: &mut Arena, owner: EntityId, report: RecalculationReport) {
    if !report.base.is_empty() {
        arena.publish(CombatEvent::AttributeBaseChanged {
            owner,
            changes: report.base,
        });
    }
    if !report.current.is_empty() {
        arena.publish(CombatEvent::AttributeCurrentChanged {
            owner,
            changes: report.current,
        });
    }
}

/// Executes modifiers in order, recording per-source deltas on `layer`.
///
/// Returns the set of attributes any modifier targeted.
fn execute_ordered(
    ordered: &[ModifierInstance],
    base: &mut AttributeValues,
    current: &mut AttributeValues,
    layer: ModifierMode,
    deltas: &mut SourceDeltas,
) -> BTreeSet<String> {
    let mut touched = BTreeSet::new();
    for modifier in ordered {
        let Some(executor) = modifier.definition().executor else {
            warn!(modifier = modifier.name(), "modifier has no executor; skipping");
            continue;
        };
        let target = modifier.target_attribute();
        let read = |base: &AttributeValues, current: &AttributeValues| match layer {
            ModifierMode::BaseValue => base.get(target).copied(),
            ModifierMode::CurrentValue => current.get(target).copied(),
        };
        let before = read(base, current);
        if !executor.execute(modifier, base, current) {
            continue;
        }
        touched.insert(target.to_string());
        if let (Some(before), Some(after)) = (before, read(base, current)) {
            let delta = after - before;
            trace!(
                modifier = modifier.name(),
                source = modifier.source_name(),
                attribute = target,
                delta,
                "modifier executed"
            );
            *deltas
                .entry(target.to_string())
                .or_default()
                .entry(modifier.source_name().to_string())
                .or_insert(0.0) += delta;
        }
    }
    touched
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::attribute::{AttributeDefinition, AttributeInstanceId, RangeRule};
    use crate::modifier::{ExecutorKind, MergerKind, ModifierDefinition, ModifierFactory};

    struct Fixture {
        store: AttributeStore,
        factory: ModifierFactory,
        engine: AttributeEngine,
    }

    impl Fixture {
        fn new(attributes: &[(AttributeDefinition, f32)]) -> Self {
            let mut store = AttributeStore::new(EntityId::new(1));
            for (i, (def, base)) in attributes.iter().enumerate() {
                store.add_attribute(Arc::new(def.clone()), AttributeInstanceId::new(i as u64), *base);
            }
            Self {
                store,
                factory: ModifierFactory::new(),
                engine: AttributeEngine::default(),
            }
        }

        fn modifier(
            &mut self,
            def: &Arc<ModifierDefinition>,
            source: &str,
            magnitude: f32,
        ) -> ModifierInstance {
            self.factory.create(Arc::clone(def), source).with_magnitude(magnitude)
        }
    }

    fn def(
        name: &str,
        target: &str,
        mode: ModifierMode,
        executor: ExecutorKind,
        priority: i32,
    ) -> Arc<ModifierDefinition> {
        Arc::new(ModifierDefinition::new(name, target, mode, executor).with_priority(priority))
    }

    fn health_fixture() -> Fixture {
        Fixture::new(&[(
            AttributeDefinition::new("Health").with_range(RangeRule::fixed(0.0, 100.0)),
            100.0,
        )])
    }

    mod apply_tests {
        use super::*;

        #[test]
        fn current_modifier_clamps_and_reports() {
            let mut fx = health_fixture();
            let hit = def("Hit", "Health", ModifierMode::CurrentValue, ExecutorKind::Addition, 0);
            let m = fx.modifier(&hit, "Goblin", -150.0);
            let report = fx.engine.apply_modifiers(&mut fx.store, vec![m], 1.0);

            assert_eq!(fx.store.current_value("Health"), Some(0.0));
            assert_eq!(fx.store.base_value("Health"), Some(100.0));
            let change = report.current_change("Health").unwrap();
            assert!((change.old_value - 100.0).abs() < 0.0001);
            assert!(change.new_value.abs() < 0.0001);
            assert!((change.sources["Goblin"] + 150.0).abs() < 0.0001);
            assert!(report.base.is_empty());
        }

        #[test]
        fn priority_order_is_sequential() {
            let mut fx = Fixture::new(&[(AttributeDefinition::new("Power"), 50.0)]);
            let add = def("Add", "Power", ModifierMode::CurrentValue, ExecutorKind::Addition, 0);
            let mul = def("Mul", "Power", ModifierMode::CurrentValue, ExecutorKind::MultiplyContinued, 1);
            let m_mul = fx.modifier(&mul, "b", 2.0);
            let m_add = fx.modifier(&add, "a", 10.0);
            fx.engine.apply_modifiers(&mut fx.store, vec![m_mul, m_add], 0.0);
            assert!((fx.store.current_value("Power").unwrap() - 120.0).abs() < 0.0001);
        }

        #[test]
        fn swapping_priorities_changes_result() {
            let mut fx = Fixture::new(&[(AttributeDefinition::new("Power"), 50.0)]);
            let add = def("Add", "Power", ModifierMode::CurrentValue, ExecutorKind::Addition, 1);
            let mul = def("Mul", "Power", ModifierMode::CurrentValue, ExecutorKind::MultiplyContinued, 0);
            let m_add = fx.modifier(&add, "a", 10.0);
            let m_mul = fx.modifier(&mul, "b", 2.0);
            fx.engine.apply_modifiers(&mut fx.store, vec![m_add, m_mul], 0.0);
            assert!((fx.store.current_value("Power").unwrap() - 110.0).abs() < 0.0001);
        }

        #[test]
        fn base_modifier_is_one_shot() {
            let mut fx = health_fixture();
            let dmg = def("Damage", "Health", ModifierMode::BaseValue, ExecutorKind::Addition, 0);
            let m = fx.modifier(&dmg, "Trap", -30.0);
            let report = fx.engine.apply_modifiers(&mut fx.store, vec![m], 0.0);

            assert!(fx.store.active_modifiers().is_empty());
            assert_eq!(fx.store.base_value("Health"), Some(70.0));
            assert_eq!(fx.store.current_value("Health"), Some(70.0));
            assert_eq!(report.base.len(), 1);
            assert_eq!(report.current.len(), 1);
        }

        #[test]
        fn reapplying_same_instance_updates_in_place() {
            let mut fx = Fixture::new(&[(AttributeDefinition::new("Armor"), 10.0)]);
            let buff = def("Buff", "Armor", ModifierMode::CurrentValue, ExecutorKind::Addition, 0);
            let m = fx.modifier(&buff, "s", 5.0);
            fx.engine.apply_modifiers(&mut fx.store, vec![m.clone()], 1.0);

            let mut again = m;
            again.set_operand("Magnitude", 7.0);
            fx.engine.apply_modifiers(&mut fx.store, vec![again], 4.0);

            assert_eq!(fx.store.active_modifiers().len(), 1);
            let stored = &fx.store.active_modifiers()[0];
            assert!((stored.apply_timestamp() - 1.0).abs() < 1e-9);
            assert!((stored.update_timestamp() - 4.0).abs() < 1e-9);
            assert!((fx.store.current_value("Armor").unwrap() - 17.0).abs() < 0.0001);
        }

        #[test]
        fn empty_input_is_noop() {
            let mut fx = health_fixture();
            let report = fx.engine.apply_modifiers(&mut fx.store, Vec::new(), 0.0);
            assert!(report.is_empty());
        }

        #[test]
        fn missing_target_is_skipped() {
            let mut fx = health_fixture();
            let ghost = def("Ghost", "Mana", ModifierMode::CurrentValue, ExecutorKind::Addition, 0);
            let m = fx.modifier(&ghost, "s", 5.0);
            let report = fx.engine.apply_modifiers(&mut fx.store, vec![m], 0.0);
            assert!(report.is_empty());
            assert_eq!(fx.store.current_value("Health"), Some(100.0));
        }

        #[test]
        fn additive_merge_sums_before_multiply() {
            let mut fx = Fixture::new(&[(AttributeDefinition::new("Speed"), 100.0)]);
            let haste = Arc::new(
                ModifierDefinition::new(
                    "Haste",
                    "Speed",
                    ModifierMode::CurrentValue,
                    ExecutorKind::MultiplyAdditive,
                )
                .with_merger(MergerKind::AdditiveSum),
            );
            let a = fx.modifier(&haste, "a", 0.1);
            let b = fx.modifier(&haste, "b", 0.2);
            fx.engine.apply_modifiers(&mut fx.store, vec![a, b], 0.0);
            assert!((fx.store.current_value("Speed").unwrap() - 130.0).abs() < 0.001);
        }

        #[test]
        fn continued_multiply_compounds() {
            let mut fx = Fixture::new(&[(AttributeDefinition::new("Speed"), 100.0)]);
            let slow = def("Slow", "Speed", ModifierMode::CurrentValue, ExecutorKind::MultiplyContinued, 0);
            let a = fx.modifier(&slow, "a", 0.9);
            let b = fx.modifier(&slow, "b", 0.9);
            fx.engine.apply_modifiers(&mut fx.store, vec![a, b], 0.0);
            assert!((fx.store.current_value("Speed").unwrap() - 81.0).abs() < 0.001);
        }

        #[test]
        fn sources_aggregate_additively() {
            let mut fx = Fixture::new(&[(AttributeDefinition::new("Armor"), 0.0)]);
            let buff = def("Buff", "Armor", ModifierMode::CurrentValue, ExecutorKind::Addition, 0);
            let a = fx.modifier(&buff, "Shield", 2.0);
            let b = fx.modifier(&buff, "Shield", 3.0);
            let c = fx.modifier(&buff, "Totem", 1.0);
            let report = fx.engine.apply_modifiers(&mut fx.store, vec![a, b, c], 0.0);
            let change = report.current_change("Armor").unwrap();
            assert!((change.sources["Shield"] - 5.0).abs() < 0.0001);
            assert!((change.sources["Totem"] - 1.0).abs() < 0.0001);
        }
    }

    mod removal_tests {
        use super::*;

        #[test]
        fn removing_restores_base() {
            let mut fx = Fixture::new(&[(AttributeDefinition::new("Armor"), 10.0)]);
            let buff = def("Buff", "Armor", ModifierMode::CurrentValue, ExecutorKind::Addition, 0);
            let m = fx.modifier(&buff, "s", 5.0);
            fx.engine.apply_modifiers(&mut fx.store, vec![m.clone()], 0.0);
            let report = fx.engine.remove_modifiers(&mut fx.store, &[m]);
            assert_eq!(fx.store.current_value("Armor"), Some(10.0));
            assert_eq!(report.current.len(), 1);
        }

        #[test]
        fn removing_unknown_does_not_recalculate() {
            let mut fx = Fixture::new(&[(AttributeDefinition::new("Armor"), 10.0)]);
            let buff = def("Buff", "Armor", ModifierMode::CurrentValue, ExecutorKind::Addition, 0);
            let m = fx.modifier(&buff, "s", 5.0);
            let report = fx.engine.remove_modifiers(&mut fx.store, &[m]);
            assert!(report.is_empty());
        }

        #[test]
        fn remove_by_source() {
            let mut fx = Fixture::new(&[(AttributeDefinition::new("Armor"), 10.0)]);
            let buff = def("Buff", "Armor", ModifierMode::CurrentValue, ExecutorKind::Addition, 0);
            let a = fx.modifier(&buff, "aura", 5.0);
            let b = fx.modifier(&buff, "potion", 1.0);
            fx.engine.apply_modifiers(&mut fx.store, vec![a, b], 0.0);
            fx.engine.remove_modifiers_from_source(&mut fx.store, "aura");
            assert_eq!(fx.store.active_modifiers().len(), 1);
            assert_eq!(fx.store.current_value("Armor"), Some(11.0));
        }
    }

    mod update_tests {
        use super::*;

        #[test]
        fn updated_operands_take_effect() {
            let mut fx = Fixture::new(&[(AttributeDefinition::new("Armor"), 10.0)]);
            let buff = def("Buff", "Armor", ModifierMode::CurrentValue, ExecutorKind::Addition, 0);
            let mut m = fx.modifier(&buff, "s", 5.0);
            fx.engine.apply_modifiers(&mut fx.store, vec![m.clone()], 0.0);
            m.set_operand("Magnitude", 9.0);
            let report = fx.engine.handle_modifiers_updated(&mut fx.store, vec![m], 2.0);
            assert_eq!(fx.store.current_value("Armor"), Some(19.0));
            assert_eq!(report.current.len(), 1);
        }

        #[test]
        fn unknown_update_is_ignored() {
            let mut fx = Fixture::new(&[(AttributeDefinition::new("Armor"), 10.0)]);
            let buff = def("Buff", "Armor", ModifierMode::CurrentValue, ExecutorKind::Addition, 0);
            let m = fx.modifier(&buff, "s", 5.0);
            let report = fx.engine.handle_modifiers_updated(&mut fx.store, vec![m], 2.0);
            assert!(report.is_empty());
            assert!(fx.store.active_modifiers().is_empty());
        }
    }

    mod range_tests {
        use super::*;

        #[test]
        fn dynamic_bound_follows_modified_maximum() {
            let mut fx = Fixture::new(&[
                (AttributeDefinition::new("MaxHealth"), 100.0),
                (
                    AttributeDefinition::new("Health").with_range(RangeRule::capped_by(0.0, "MaxHealth")),
                    100.0,
                ),
            ]);
            let curse = def("Curse", "MaxHealth", ModifierMode::CurrentValue, ExecutorKind::Addition, 0);
            let m = fx.modifier(&curse, "Witch", -40.0);
            fx.engine.apply_modifiers(&mut fx.store, vec![m.clone()], 0.0);
            assert_eq!(fx.store.current_value("Health"), Some(60.0));

            fx.engine.remove_modifiers(&mut fx.store, &[m]);
            assert_eq!(fx.store.current_value("Health"), Some(100.0));
        }

        #[test]
        fn missing_dynamic_bound_leaves_value_unclamped() {
            let mut fx = Fixture::new(&[(
                AttributeDefinition::new("Health").with_range(RangeRule::capped_by(0.0, "MaxHealth")),
                100.0,
            )]);
            let heal = def("Heal", "Health", ModifierMode::CurrentValue, ExecutorKind::Addition, 0);
            let m = fx.modifier(&heal, "s", 50.0);
            fx.engine.apply_modifiers(&mut fx.store, vec![m], 0.0);
            assert_eq!(fx.store.current_value("Health"), Some(150.0));
        }

        #[test]
        fn base_pass_clamps() {
            let mut fx = health_fixture();
            let dmg = def("Damage", "Health", ModifierMode::BaseValue, ExecutorKind::Addition, 0);
            let m = fx.modifier(&dmg, "Lava", -500.0);
            fx.engine.apply_modifiers(&mut fx.store, vec![m], 0.0);
            assert_eq!(fx.store.base_value("Health"), Some(0.0));
        }

        #[test]
        fn clamped_to_same_value_reports_nothing() {
            let mut fx = health_fixture();
            let heal = def("Heal", "Health", ModifierMode::CurrentValue, ExecutorKind::Addition, 0);
            let m = fx.modifier(&heal, "s", 25.0);
            let report = fx.engine.apply_modifiers(&mut fx.store, vec![m], 0.0);
            assert!(report.is_empty());
        }
    }

    mod determinism_tests {
        use super::*;

        #[test]
        fn recalculation_is_repeatable() {
            let mut fx = Fixture::new(&[(AttributeDefinition::new("Power"), 3.0)]);
            let add = def("Add", "Power", ModifierMode::CurrentValue, ExecutorKind::Addition, 2);
            let mul = def("Mul", "Power", ModifierMode::CurrentValue, ExecutorKind::MultiplyAdditive, 1);
            let mods = vec![fx.modifier(&add, "a", 1.25), fx.modifier(&mul, "b", 0.3)];
            fx.engine.apply_modifiers(&mut fx.store, mods, 0.0);
            let first = fx.store.current_value("Power");
            let again = fx.engine.recalculate_current_values(&mut fx.store);
            assert!(again.is_empty());
            assert_eq!(fx.store.current_value("Power"), first);
        }
    }
}
