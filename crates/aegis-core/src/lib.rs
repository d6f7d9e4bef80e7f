//! # Aegis Core
//!
//! Attribute, modifier, state and skill core for real-time combat
//! simulation.
//!
//! ## Architecture
//!
//! - **Attributes**: named numeric stats with a base and a derived current
//!   value, recalculated from ordered modifiers and clamped by range rules
//! - **Modifiers**: typed, ordered, mergeable value changes
//! - **States**: timed or conditional effects (buffs, debuffs, skill
//!   effects) driven by behavior scripts, with slots and stacking
//! - **Skills**: learned capabilities with levels, cooldowns and computed
//!   parameters that spawn a state when cast
//!
//! Everything lives in an [`Arena`](arena::Arena) owned by a
//! [`Simulation`](simulation::Simulation). Definitions are loaded once into
//! an immutable [`DefinitionRegistry`](definitions::DefinitionRegistry).
//!
//! ## Usage
//!
//! ```rust
//! use aegis_core::attribute::AttributeDefinition;
//! use aegis_core::definitions::DefinitionRegistry;
//! use aegis_core::entity::EntityTag;
//! use aegis_core::modifier::{ExecutorKind, ModifierDefinition, ModifierMode};
//! use aegis_core::simulation::Simulation;
//! use aegis_core::state::{GrantedModifier, StateDefinition, StateKind, StateParameters};
//!
//! let mut definitions = DefinitionRegistry::new();
//! definitions.register_attribute(AttributeDefinition::new("Speed")).unwrap();
//! definitions
//!     .register_modifier(ModifierDefinition::new(
//!         "SpeedBonus",
//!         "Speed",
//!         ModifierMode::CurrentValue,
//!         ExecutorKind::Addition,
//!     ))
//!     .unwrap();
//! definitions
//!     .register_state(
//!         StateDefinition::new("Haste", StateKind::Buff)
//!             .with_behavior("ModifierAura")
//!             .with_duration(2.0)
//!             .with_granted_modifier(GrantedModifier::new("SpeedBonus", 10.0)),
//!     )
//!     .unwrap();
//!
//! let mut sim = Simulation::new(definitions);
//! let hero = sim.spawn(EntityTag::Combatant, "hero");
//! sim.add_attribute(hero, "Speed", 5.0);
//!
//! sim.apply_state(hero, &"Haste".into(), None, StateParameters::new()).unwrap();
//! let speed = sim.arena().view().attribute_current(hero, "Speed").unwrap();
//! assert!((speed - 15.0).abs() < 0.0001);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod attribute;
pub mod behavior;
pub mod condition;
pub mod config;
pub mod definitions;
pub mod entity;
pub mod error;
pub mod event;
pub mod modifier;
pub mod simulation;
pub mod skill;
pub mod state;
pub mod view;

#[cfg(test)]
mod tests;

pub use arena::Arena;
pub use config::CoreConfig;
pub use definitions::{DefinitionRegistry, DefinitionSet};
pub use entity::{EntityId, EntityTag};
pub use event::{CombatEvent, EventKind};
pub use simulation::Simulation;
pub use view::ArenaView;
