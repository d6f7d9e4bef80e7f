//! Modifiers: timestamped, prioritized instructions that change one attribute.
//!
//! A [`ModifierDefinition`] names the target attribute, the value layer
//! ([`ModifierMode`]), the execution algorithm ([`ExecutorKind`]) and the
//! merge strategy ([`MergerKind`]). A [`ModifierInstance`] is one
//! application of a definition with its own operands.

mod definition;
mod executor;
mod instance;
mod merger;

pub use definition::{ModifierDefinition, ModifierMode};
pub use executor::ExecutorKind;
pub use instance::{ModifierFactory, ModifierInstance, ModifierInstanceId};
pub use merger::{merge_and_sort, MergerKind};

/// Name of the operand executors and mergers read.
pub const MAGNITUDE: &str = "Magnitude";
