//! Merging of same-named modifier instances.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ModifierInstance, MAGNITUDE};

/// How instances sharing a definition name are reduced before execution.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MergerKind {
    /// Every instance executes.
    NoMerge,
    /// One instance executes with the summed magnitude.
    AdditiveSum,
    /// Only the instance with the largest magnitude executes.
    UseMaximum,
    /// Only the most recently applied instance executes.
    UseNewest,
    /// Only the earliest applied instance executes.
    UseOldest,
}

impl MergerKind {
    /// Reduces a group of instances that share a definition name.
    ///
    /// Ties always go to the instance encountered first.
    #[must_use]
    pub fn merge(self, group: Vec<ModifierInstance>) -> Vec<ModifierInstance> {
        match self {
            Self::NoMerge => group,
            Self::AdditiveSum => additive_sum(group),
            Self::UseMaximum => pick(group, |candidate, best| {
                match (candidate.magnitude(), best.magnitude()) {
                    (Some(c), Some(b)) => c > b,
                    (Some(_), None) => true,
                    (None, _) => false,
                }
            }),
            Self::UseNewest => pick(group, |candidate, best| {
                candidate.apply_timestamp() > best.apply_timestamp()
            }),
            Self::UseOldest => pick(group, |candidate, best| {
                candidate.apply_timestamp() < best.apply_timestamp()
            }),
        }
    }
}

fn additive_sum(group: Vec<ModifierInstance>) -> Vec<ModifierInstance> {
    if group.len() <= 1 || group.iter().all(|m| m.magnitude().is_none()) {
        return group.into_iter().take(1).collect();
    }
    let total: f32 = group.iter().filter_map(ModifierInstance::magnitude).sum();
    group
        .into_iter()
        .take(1)
        .map(|mut first| {
            first.set_operand(MAGNITUDE, total);
            first
        })
        .collect()
}

/// Keeps the single instance for which `beats(candidate, best)` held last.
fn pick(
    group: Vec<ModifierInstance>,
    beats: impl Fn(&ModifierInstance, &ModifierInstance) -> bool,
) -> Vec<ModifierInstance> {
    let mut best: Option<ModifierInstance> = None;
    for candidate in group {
        let replace = best
            .as_ref()
            .map_or(true, |current| beats(&candidate, current));
        if replace {
            best = Some(candidate);
        }
    }
    best.into_iter().collect()
}

/// Groups `modifiers` by definition name, merges each group and sorts the
/// result by priority.
///
/// Groups keep the order in which their first member appeared, and the sort
/// is stable, so equal priorities execute in that order. A group whose first
/// member has no merge strategy is skipped with a warning.
#[must_use]
pub fn merge_and_sort<I>(modifiers: I) -> Vec<ModifierInstance>
where
    I: IntoIterator<Item = ModifierInstance>,
{
    let mut order: Vec<Vec<ModifierInstance>> = Vec::new();
    let mut index: BTreeMap<String, usize> = BTreeMap::new();
    for modifier in modifiers {
        let slot = *index.entry(modifier.name().to_string()).or_insert_with(|| {
            order.push(Vec::new());
            order.len() - 1
        });
        order[slot].push(modifier);
    }

    let mut merged = Vec::new();
    for group in order {
        let Some(first) = group.first() else { continue };
        let Some(merger) = first.definition().merger else {
            warn!(
                modifier = first.name(),
                count = group.len(),
                "modifier has no merge strategy; skipping group"
            );
            continue;
        };
        merged.extend(merger.merge(group));
    }
    merged.sort_by_key(ModifierInstance::priority);
    merged
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::modifier::{ExecutorKind, ModifierDefinition, ModifierInstanceId, ModifierMode};

    fn def(name: &str, priority: i32, merger: Option<MergerKind>) -> Arc<ModifierDefinition> {
        let mut d = ModifierDefinition::new(
            name,
            "Strength",
            ModifierMode::CurrentValue,
            ExecutorKind::Addition,
        )
        .with_priority(priority);
        d.merger = merger;
        Arc::new(d)
    }

    fn inst(def: &Arc<ModifierDefinition>, id: u64, magnitude: Option<f32>, at: f64) -> ModifierInstance {
        let mut m = ModifierInstance::new(Arc::clone(def), ModifierInstanceId::new(id), format!("src{id}"));
        if let Some(v) = magnitude {
            m.set_operand(MAGNITUDE, v);
        }
        m.stamp(at, at);
        m
    }

    mod merger_tests {
        use super::*;

        #[test]
        fn no_merge_passes_through() {
            let d = def("A", 0, Some(MergerKind::NoMerge));
            let out = MergerKind::NoMerge.merge(vec![inst(&d, 1, Some(1.0), 0.0), inst(&d, 2, Some(2.0), 0.0)]);
            assert_eq!(out.len(), 2);
        }

        #[test]
        fn additive_sum_produces_one_instance() {
            let d = def("A", 0, Some(MergerKind::AdditiveSum));
            let out = MergerKind::AdditiveSum.merge(vec![
                inst(&d, 1, Some(1.5), 0.0),
                inst(&d, 2, Some(2.0), 0.0),
                inst(&d, 3, None, 0.0),
                inst(&d, 4, Some(-0.5), 0.0),
            ]);
            assert_eq!(out.len(), 1);
            assert_eq!(out[0].instance_id(), ModifierInstanceId::new(1));
            assert!((out[0].magnitude().unwrap() - 3.0).abs() < 0.0001);
        }

        #[test]
        fn additive_sum_single_is_passthrough() {
            let d = def("A", 0, Some(MergerKind::AdditiveSum));
            let out = MergerKind::AdditiveSum.merge(vec![inst(&d, 1, Some(4.0), 0.0)]);
            assert_eq!(out.len(), 1);
            assert_eq!(out[0].magnitude(), Some(4.0));
            assert!(MergerKind::AdditiveSum.merge(Vec::new()).is_empty());
        }

        #[test]
        fn use_maximum_prefers_operand_and_first_on_tie() {
            let d = def("A", 0, Some(MergerKind::UseMaximum));
            let out = MergerKind::UseMaximum.merge(vec![
                inst(&d, 1, None, 0.0),
                inst(&d, 2, Some(3.0), 0.0),
                inst(&d, 3, Some(3.0), 0.0),
                inst(&d, 4, Some(-1.0), 0.0),
            ]);
            assert_eq!(out.len(), 1);
            assert_eq!(out[0].instance_id(), ModifierInstanceId::new(2));
        }

        #[test]
        fn use_maximum_empty_is_empty() {
            assert!(MergerKind::UseMaximum.merge(Vec::new()).is_empty());
        }

        #[test]
        fn use_maximum_without_operands_keeps_first() {
            let d = def("A", 0, Some(MergerKind::UseMaximum));
            let out = MergerKind::UseMaximum.merge(vec![inst(&d, 5, None, 0.0), inst(&d, 6, None, 0.0)]);
            assert_eq!(out[0].instance_id(), ModifierInstanceId::new(5));
        }

        #[test]
        fn newest_and_oldest_by_apply_timestamp() {
            let d = def("A", 0, Some(MergerKind::UseNewest));
            let group = vec![
                inst(&d, 1, Some(1.0), 2.0),
                inst(&d, 2, Some(1.0), 5.0),
                inst(&d, 3, Some(1.0), 5.0),
                inst(&d, 4, Some(1.0), 1.0),
            ];
            let newest = MergerKind::UseNewest.merge(group.clone());
            assert_eq!(newest[0].instance_id(), ModifierInstanceId::new(2));
            let oldest = MergerKind::UseOldest.merge(group);
            assert_eq!(oldest[0].instance_id(), ModifierInstanceId::new(4));
        }
    }

    mod merge_and_sort_tests {
        use super::*;

        #[test]
        fn groups_by_name_and_sorts_by_priority() {
            let late = def("Late", 5, Some(MergerKind::AdditiveSum));
            let early = def("Early", 1, Some(MergerKind::NoMerge));
            let out = merge_and_sort(vec![
                inst(&late, 1, Some(1.0), 0.0),
                inst(&early, 2, Some(1.0), 0.0),
                inst(&late, 3, Some(2.0), 0.0),
            ]);
            let names: Vec<_> = out.iter().map(ModifierInstance::name).collect();
            assert_eq!(names, vec!["Early", "Late"]);
            assert!((out[1].magnitude().unwrap() - 3.0).abs() < 0.0001);
        }

        #[test]
        fn equal_priority_keeps_first_appearance_order() {
            let b = def("B", 0, Some(MergerKind::NoMerge));
            let a = def("A", 0, Some(MergerKind::NoMerge));
            let out = merge_and_sort(vec![inst(&b, 1, Some(1.0), 0.0), inst(&a, 2, Some(1.0), 0.0)]);
            let names: Vec<_> = out.iter().map(ModifierInstance::name).collect();
            assert_eq!(names, vec!["B", "A"]);
        }

        #[test]
        fn group_without_merger_is_skipped() {
            let broken = def("Broken", 0, None);
            let fine = def("Fine", 0, Some(MergerKind::NoMerge));
            let out = merge_and_sort(vec![inst(&broken, 1, Some(1.0), 0.0), inst(&fine, 2, Some(1.0), 0.0)]);
            assert_eq!(out.len(), 1);
            assert_eq!(out[0].name(), "Fine");
        }
    }
}
