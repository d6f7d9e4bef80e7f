//! Application conditions.
//!
//! A [`StateDefinition`](crate::state::StateDefinition) may list conditions
//! that gate application. They are checked against the candidate instance
//! before anything is registered, reading the arena through an
//! [`ArenaView`].
//!
//! ```
//! use aegis_core::condition::{CompareOp, Condition, Subject};
//!
//! let json = r#"{ "AttributeCompare": {
//!     "subject": "Instigator", "attribute": "Mana", "op": "GreaterOrEqual", "value": 20.0
//! } }"#;
//! let condition: Condition = serde_json::from_str(json).unwrap();
//! assert_eq!(
//!     condition,
//!     Condition::AttributeCompare {
//!         subject: Subject::Instigator,
//!         attribute: "Mana".to_string(),
//!         op: CompareOp::GreaterOrEqual,
//!         value: 20.0,
//!     }
//! );
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entity::EntityId;
use crate::state::{StateDefId, StateInstance};
use crate::view::ArenaView;

/// Values closer than this compare equal.
const EQUALITY_TOLERANCE: f32 = 1.0e-4;

/// Numeric comparison operator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// `lhs < rhs`
    Less,
    /// `lhs <= rhs`
    LessOrEqual,
    /// `|lhs - rhs|` within tolerance
    Equal,
    /// `|lhs - rhs|` beyond tolerance
    NotEqual,
    /// `lhs >= rhs`
    GreaterOrEqual,
    /// `lhs > rhs`
    Greater,
}

impl CompareOp {
    /// Compares two values.
    #[must_use]
    pub fn compare(self, lhs: f32, rhs: f32) -> bool {
        match self {
            Self::Less => lhs < rhs,
            Self::LessOrEqual => lhs <= rhs,
            Self::Equal => (lhs - rhs).abs() <= EQUALITY_TOLERANCE,
            Self::NotEqual => (lhs - rhs).abs() > EQUALITY_TOLERANCE,
            Self::GreaterOrEqual => lhs >= rhs,
            Self::Greater => lhs > rhs,
        }
    }
}

/// Entity a condition reads from, relative to the candidate instance.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subject {
    /// The entity receiving the state.
    #[default]
    Owner,
    /// The entity applying the state.
    Instigator,
    /// The instance's target parameter.
    Target,
}

impl Subject {
    /// Resolves the subject for an instance.
    #[must_use]
    pub const fn resolve(self, instance: &StateInstance) -> Option<EntityId> {
        match self {
            Self::Owner => Some(instance.owner()),
            Self::Instigator => instance.instigator(),
            Self::Target => instance.target(),
        }
    }
}

/// Gate on state application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// Compares a subject's current attribute value with a constant.
    AttributeCompare {
        /// Entity to read.
        #[serde(default)]
        subject: Subject,
        /// Attribute name.
        attribute: String,
        /// Operator, attribute on the left.
        op: CompareOp,
        /// Right-hand side.
        value: f32,
    },
    /// Compares one of the candidate's numeric parameters with a constant.
    ParameterCompare {
        /// Parameter name.
        name: String,
        /// Operator, parameter on the left.
        op: CompareOp,
        /// Right-hand side.
        value: f32,
    },
    /// Requires a boolean parameter to hold `value`.
    BoolParameter {
        /// Parameter name.
        name: String,
        /// Expected value.
        value: bool,
    },
    /// Requires a subject's level to be at least `level`.
    MinimumLevel {
        /// Entity to read.
        #[serde(default)]
        subject: Subject,
        /// Lowest accepted level.
        level: i32,
    },
    /// Requires the owner's slot to have no active occupant.
    SlotFree {
        /// Slot tag.
        slot: String,
    },
    /// Requires a subject to hold an active instance of a state.
    HasState {
        /// Entity to read.
        #[serde(default)]
        subject: Subject,
        /// State id.
        state: StateDefId,
    },
    /// Inverts a condition.
    Not(Box<Condition>),
    /// Every condition holds (true when empty).
    All(Vec<Condition>),
    /// At least one condition holds (false when empty).
    Any(Vec<Condition>),
}

impl Condition {
    /// Evaluates the condition for a candidate instance.
    ///
    /// Missing entities, attributes and parameters make the condition fail.
    #[must_use]
    pub fn check(&self, view: ArenaView<'_>, instance: &StateInstance) -> bool {
        match self {
            Self::AttributeCompare {
                subject,
                attribute,
                op,
                value,
            } => {
                let Some(entity) = subject.resolve(instance) else {
                    return false;
                };
                match view.attribute_current(entity, attribute) {
                    Some(current) => op.compare(current, *value),
                    None => {
                        warn!(entity = %entity, attribute = %attribute, "condition reads a missing attribute");
                        false
                    }
                }
            }
            Self::ParameterCompare { name, op, value } => instance
                .numeric_parameter(name)
                .is_some_and(|parameter| op.compare(parameter, *value)),
            Self::BoolParameter { name, value } => instance.bool_parameter(name) == Some(*value),
            Self::MinimumLevel { subject, level } => subject
                .resolve(instance)
                .and_then(|entity| view.level(entity))
                .is_some_and(|current| current >= *level),
            Self::SlotFree { slot } => !view.is_slot_occupied(instance.owner(), slot),
            Self::HasState { subject, state } => subject
                .resolve(instance)
                .is_some_and(|entity| view.has_state(entity, state)),
            Self::Not(inner) => !inner.check(view, instance),
            Self::All(conditions) => conditions.iter().all(|c| c.check(view, instance)),
            Self::Any(conditions) => conditions.iter().any(|c| c.check(view, instance)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::arena::Arena;
    use crate::attribute::AttributeDefinition;
    use crate::entity::{EntityTag, LEVEL_ATTRIBUTE};
    use crate::state::{StateDefinition, StateInstanceId, StateKind, StateParameters};

    fn candidate(owner: EntityId, instigator: Option<EntityId>, params: StateParameters) -> StateInstance {
        StateInstance::new(
            Arc::new(StateDefinition::new("Probe", StateKind::Buff)),
            StateInstanceId::new(99),
            owner,
            instigator,
            params,
            0.0,
        )
    }

    fn arena() -> (Arena, EntityId, EntityId) {
        let mut arena = Arena::new();
        let hero = arena.spawn(EntityTag::Combatant, "hero");
        let mage = arena.spawn(EntityTag::Combatant, "mage");
        arena.add_attribute(hero, Arc::new(AttributeDefinition::new("Health")), 40.0);
        arena.add_attribute(mage, Arc::new(AttributeDefinition::new(LEVEL_ATTRIBUTE)), 7.0);
        (arena, hero, mage)
    }

    mod compare_tests {
        use super::*;

        #[test]
        fn operators() {
            assert!(CompareOp::Less.compare(1.0, 2.0));
            assert!(!CompareOp::Less.compare(2.0, 2.0));
            assert!(CompareOp::LessOrEqual.compare(2.0, 2.0));
            assert!(CompareOp::Equal.compare(0.1 + 0.2, 0.3));
            assert!(CompareOp::NotEqual.compare(1.0, 1.1));
            assert!(CompareOp::GreaterOrEqual.compare(3.0, 3.0));
            assert!(CompareOp::Greater.compare(3.1, 3.0));
        }
    }

    mod check_tests {
        use super::*;

        #[test]
        fn attribute_compare_reads_subject() {
            let (arena, hero, mage) = arena();
            let inst = candidate(hero, Some(mage), StateParameters::new());
            let low_health = Condition::AttributeCompare {
                subject: Subject::Owner,
                attribute: "Health".to_string(),
                op: CompareOp::Less,
                value: 50.0,
            };
            assert!(low_health.check(arena.view(), &inst));

            let mage_health = Condition::AttributeCompare {
                subject: Subject::Instigator,
                attribute: "Health".to_string(),
                op: CompareOp::Less,
                value: 50.0,
            };
            assert!(!mage_health.check(arena.view(), &inst));
        }

        #[test]
        fn missing_subject_fails() {
            let (arena, hero, _) = arena();
            let inst = candidate(hero, None, StateParameters::new());
            let condition = Condition::MinimumLevel {
                subject: Subject::Instigator,
                level: 1,
            };
            assert!(!condition.check(arena.view(), &inst));
        }

        #[test]
        fn level_and_parameters() {
            let (arena, hero, mage) = arena();
            let params = StateParameters::new()
                .with_numeric("Power", 12.0)
                .with_bool("Empowered", true);
            let inst = candidate(hero, Some(mage), params);

            let strong_caster = Condition::MinimumLevel {
                subject: Subject::Instigator,
                level: 5,
            };
            let power = Condition::ParameterCompare {
                name: "Power".to_string(),
                op: CompareOp::GreaterOrEqual,
                value: 10.0,
            };
            let empowered = Condition::BoolParameter {
                name: "Empowered".to_string(),
                value: true,
            };
            let all = Condition::All(vec![strong_caster, power, empowered]);
            assert!(all.check(arena.view(), &inst));

            let absent = Condition::ParameterCompare {
                name: "Missing".to_string(),
                op: CompareOp::Less,
                value: 1.0,
            };
            assert!(!absent.check(arena.view(), &inst));
            assert!(Condition::Not(Box::new(absent)).check(arena.view(), &inst));
        }

        #[test]
        fn empty_combinators() {
            let (arena, hero, _) = arena();
            let inst = candidate(hero, None, StateParameters::new());
            assert!(Condition::All(Vec::new()).check(arena.view(), &inst));
            assert!(!Condition::Any(Vec::new()).check(arena.view(), &inst));
        }

        #[test]
        fn slot_free_and_has_state_on_empty_owner() {
            let (arena, hero, _) = arena();
            let inst = candidate(hero, None, StateParameters::new());
            assert!(Condition::SlotFree {
                slot: "Stance".to_string()
            }
            .check(arena.view(), &inst));
            assert!(!Condition::HasState {
                subject: Subject::Owner,
                state: StateDefId::new("Stun"),
            }
            .check(arena.view(), &inst));
        }
    }
}
