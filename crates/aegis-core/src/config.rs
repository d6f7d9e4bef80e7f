//! Tunable constants for a simulation instance.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Core configuration.
///
/// Missing fields fall back to [`CoreConfig::default`] when deserialized.
///
/// # Example
///
/// ```
/// use aegis_core::config::CoreConfig;
///
/// let config: CoreConfig = serde_json::from_str(r#"{ "duration_tick_interval": 0.25 }"#).unwrap();
/// assert!((config.duration_tick_interval - 0.25).abs() < 0.0001);
/// assert!(config.record_events);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Seconds between duration and cooldown polling passes.
    pub duration_tick_interval: f32,
    /// Attribute values closer than this are considered unchanged.
    pub value_tolerance: f32,
    /// Real-time skill parameters closer than this to the cached value are not rewritten.
    pub realtime_epsilon: f32,
    /// Lower bound of the legacy cooldown level decay factor.
    pub min_cooldown_factor: f32,
    /// Legacy cooldown reduction per level above 1.
    pub cooldown_decay_per_level: f32,
    /// Keep published events in the bus log for `take_events`.
    pub record_events: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            duration_tick_interval: 0.1,
            value_tolerance: 1.0e-4,
            realtime_epsilon: 1.0e-4,
            min_cooldown_factor: 0.1,
            cooldown_decay_per_level: 0.05,
            record_events: true,
        }
    }
}

impl CoreConfig {
    /// Checks that every numeric field is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for negative or non-finite values and for a
    /// zero tick interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("duration_tick_interval", self.duration_tick_interval),
            ("value_tolerance", self.value_tolerance),
            ("realtime_epsilon", self.realtime_epsilon),
            ("min_cooldown_factor", self.min_cooldown_factor),
            ("cooldown_decay_per_level", self.cooldown_decay_per_level),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        if self.duration_tick_interval <= 0.0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        Ok(())
    }

    /// Legacy cooldown level factor: `max(min, 1 - decay * (level - 1))`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn legacy_cooldown_factor(&self, level: i32) -> f32 {
        let steps = (level.max(1) - 1) as f32;
        (1.0 - self.cooldown_decay_per_level * steps).max(self.min_cooldown_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(CoreConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_negative_tolerance() {
        let config = CoreConfig {
            value_tolerance: -1.0,
            ..CoreConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "value_tolerance",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_tick_interval() {
        let config = CoreConfig {
            duration_tick_interval: 0.0,
            ..CoreConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTickInterval));
    }

    #[test]
    fn rejects_nan() {
        let config = CoreConfig {
            realtime_epsilon: f32::NAN,
            ..CoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn legacy_cooldown_factor_decays_and_floors() {
        let config = CoreConfig::default();
        assert!((config.legacy_cooldown_factor(1) - 1.0).abs() < 0.0001);
        assert!((config.legacy_cooldown_factor(5) - 0.8).abs() < 0.0001);
        assert!((config.legacy_cooldown_factor(40) - 0.1).abs() < 0.0001);
        assert!((config.legacy_cooldown_factor(-3) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: CoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn serialization_roundtrip() {
        let config = CoreConfig {
            record_events: false,
            ..CoreConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let restored: CoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
