//! Attributes: named numeric stats with a base and a current value.

mod definition;
mod engine;
mod store;

use std::collections::BTreeMap;

pub use definition::{AttributeDefinition, Bound, RangeRule};
pub use engine::{AttributeChange, AttributeEngine, RecalculationReport};
pub(crate) use engine::publish_report;
pub use store::{AttributeInstance, AttributeInstanceId, AttributeStore};

/// Attribute values keyed by attribute name.
pub type AttributeValues = BTreeMap<String, f32>;
