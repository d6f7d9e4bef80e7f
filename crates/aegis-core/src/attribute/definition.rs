//! Attribute definitions and range rules.

use serde::{Deserialize, Serialize};

use super::AttributeValues;

/// One side of an attribute's allowed range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Bound {
    /// No limit on this side.
    #[default]
    None,
    /// Fixed limit.
    Static(f32),
    /// Limit read from another attribute's current value (e.g. `MaxHealth`).
    Dynamic(String),
}

impl Bound {
    /// Resolves the bound against a value map.
    ///
    /// `Ok(None)` means unbounded; `Err(name)` means the dynamic source
    /// attribute is missing.
    fn resolve<'a>(&'a self, values: &AttributeValues) -> Result<Option<f32>, &'a str> {
        match self {
            Self::None => Ok(None),
            Self::Static(value) => Ok(Some(*value)),
            Self::Dynamic(name) => values.get(name).copied().map(Some).ok_or(name.as_str()),
        }
    }
}

/// Min/max rule for an attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeRule {
    /// Lower bound.
    #[serde(default)]
    pub min: Bound,
    /// Upper bound.
    #[serde(default)]
    pub max: Bound,
}

impl RangeRule {
    /// A rule with no bounds.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            min: Bound::None,
            max: Bound::None,
        }
    }

    /// A rule with two static bounds.
    #[must_use]
    pub const fn fixed(min: f32, max: f32) -> Self {
        Self {
            min: Bound::Static(min),
            max: Bound::Static(max),
        }
    }

    /// A rule with a static lower bound and an upper bound taken from another
    /// attribute.
    #[must_use]
    pub fn capped_by(min: f32, max_attribute: impl Into<String>) -> Self {
        Self {
            min: Bound::Static(min),
            max: Bound::Dynamic(max_attribute.into()),
        }
    }

    /// Clamps `candidate` into the resolved range.
    ///
    /// Dynamic bounds read `current_values`. Returns `Err` with the name of the
    /// missing source attribute when a dynamic bound cannot be resolved; the
    /// caller then leaves the value unclamped. When the bounds cross, the
    /// upper bound wins.
    ///
    /// # Errors
    ///
    /// Returns the missing attribute name when a dynamic bound cannot be
    /// resolved.
    pub fn clamp<'a>(
        &'a self,
        candidate: f32,
        current_values: &AttributeValues,
    ) -> Result<f32, &'a str> {
        let min = self.min.resolve(current_values)?;
        let max = self.max.resolve(current_values)?;
        let mut value = candidate;
        if let Some(min) = min {
            value = value.max(min);
        }
        if let Some(max) = max {
            value = value.min(max);
        }
        Ok(value)
    }
}

/// Immutable metadata for one attribute type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    /// Attribute name, unique within a registry.
    pub name: String,
    /// Allowed range.
    #[serde(default)]
    pub range: RangeRule,
    /// Grouping used by UI and tooling.
    #[serde(default)]
    pub category: Option<String>,
    /// Human-readable name.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl AttributeDefinition {
    /// Creates an unbounded definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range: RangeRule::unbounded(),
            category: None,
            display_name: None,
        }
    }

    /// Sets the range rule.
    #[must_use]
    pub fn with_range(mut self, range: RangeRule) -> Self {
        self.range = range;
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, f32)]) -> AttributeValues {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn unbounded_passes_through() {
        let rule = RangeRule::unbounded();
        assert_eq!(rule.clamp(-1.0e9, &AttributeValues::new()), Ok(-1.0e9));
    }

    #[test]
    fn static_bounds_clamp() {
        let rule = RangeRule::fixed(0.0, 100.0);
        let empty = AttributeValues::new();
        assert_eq!(rule.clamp(-50.0, &empty), Ok(0.0));
        assert_eq!(rule.clamp(150.0, &empty), Ok(100.0));
        assert_eq!(rule.clamp(42.0, &empty), Ok(42.0));
    }

    #[test]
    fn dynamic_bound_reads_other_attribute() {
        let rule = RangeRule::capped_by(0.0, "MaxHealth");
        let current = values(&[("MaxHealth", 80.0)]);
        assert_eq!(rule.clamp(100.0, &current), Ok(80.0));
    }

    #[test]
    fn missing_dynamic_source_aborts() {
        let rule = RangeRule::capped_by(0.0, "MaxHealth");
        assert_eq!(rule.clamp(100.0, &AttributeValues::new()), Err("MaxHealth"));
    }

    #[test]
    fn crossed_bounds_do_not_panic() {
        let rule = RangeRule::fixed(10.0, 5.0);
        assert_eq!(rule.clamp(7.0, &AttributeValues::new()), Ok(5.0));
    }

    #[test]
    fn clamp_is_idempotent() {
        let rule = RangeRule::fixed(-3.0, 3.0);
        let empty = AttributeValues::new();
        let once = rule.clamp(12.0, &empty).unwrap();
        assert_eq!(rule.clamp(once, &empty), Ok(once));
    }

    #[test]
    fn definition_deserializes_with_defaults() {
        let json = r#"{ "name": "Health", "range": { "min": { "type": "Static", "value": 0.0 }, "max": { "type": "Dynamic", "value": "MaxHealth" } } }"#;
        let def: AttributeDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.range, RangeRule::capped_by(0.0, "MaxHealth"));
        assert!(def.category.is_none());
    }
}
