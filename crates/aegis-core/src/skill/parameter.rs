//! Numeric skill parameters: configuration, parsers and scaling.
//!
//! A parameter's value is computed in three steps:
//!
//! 1. The [`ParameterParser`] resolves a base scalar from static data and a
//!    level (the instigator's or the state's).
//! 2. Additive skill modifiers are summed in, then the result is multiplied
//!    by the product of the multiplicative ones.
//! 3. Built-in [`ParameterScaling`] picked from the parameter name applies.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::view::ArenaView;

/// Damage and healing grow by this fraction per skill level above 1.
pub const DAMAGE_SCALING_PER_LEVEL: f32 = 0.1;

// =============================================================================
// Curve
// =============================================================================

/// Piecewise-linear curve over sorted `(x, y)` keys.
///
/// Inputs outside the key range clamp to the first or last key.
///
/// ```
/// use aegis_core::skill::Curve;
///
/// let curve = Curve::new(vec![(1.0, 10.0), (3.0, 30.0)]);
/// assert_eq!(curve.evaluate(2.0), Some(20.0));
/// assert_eq!(curve.evaluate(9.0), Some(30.0));
/// assert_eq!(Curve::default().evaluate(1.0), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(f32, f32)>", into = "Vec<(f32, f32)>")]
pub struct Curve {
    keys: Vec<(f32, f32)>,
}

impl Curve {
    /// Creates a curve, sorting keys by `x` and dropping non-finite ones.
    #[must_use]
    pub fn new(mut keys: Vec<(f32, f32)>) -> Self {
        keys.retain(|(x, y)| x.is_finite() && y.is_finite());
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    /// Returns the keys in ascending `x` order.
    #[must_use]
    pub fn keys(&self) -> &[(f32, f32)] {
        &self.keys
    }

    /// Samples the curve. Returns `None` if it has no keys.
    #[must_use]
    pub fn evaluate(&self, x: f32) -> Option<f32> {
        let first = *self.keys.first()?;
        let last = *self.keys.last()?;
        if x <= first.0 {
            return Some(first.1);
        }
        if x >= last.0 {
            return Some(last.1);
        }
        let upper = self.keys.partition_point(|(key, _)| *key <= x);
        let (x0, y0) = self.keys[upper - 1];
        let (x1, y1) = self.keys[upper];
        if (x1 - x0).abs() <= f32::EPSILON {
            return Some(y1);
        }
        Some(y0 + (y1 - y0) * (x - x0) / (x1 - x0))
    }
}

impl From<Vec<(f32, f32)>> for Curve {
    fn from(keys: Vec<(f32, f32)>) -> Self {
        Self::new(keys)
    }
}

impl From<Curve> for Vec<(f32, f32)> {
    fn from(curve: Curve) -> Self {
        curve.keys
    }
}

// =============================================================================
// Parsers
// =============================================================================

/// Inputs available to a parser.
#[derive(Debug, Clone, Copy)]
pub struct ParseInput<'a> {
    /// Read access to the arena.
    pub view: ArenaView<'a>,
    /// Entity applying the effect; its level feeds instigator parsers.
    pub instigator: Option<EntityId>,
    /// Cast or effect target.
    pub target: Option<EntityId>,
    /// Level of the owning state, if one is known.
    pub state_level: Option<i32>,
}

impl ParseInput<'_> {
    fn instigator_level(&self) -> Option<i32> {
        self.instigator.and_then(|id| self.view.level(id))
    }
}

/// Resolves a base scalar for a numeric parameter.
///
/// Array parsers index by `level - 1`. Every variant falls back to
/// `default` when its level is unknown or out of range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterParser {
    /// A fixed value.
    Constant {
        /// The value.
        value: f32,
    },
    /// One value per instigator level.
    InstigatorLevelArray {
        /// Values for levels 1, 2, ...
        values: Vec<f32>,
        /// Fallback.
        #[serde(default)]
        default: f32,
    },
    /// Curve sampled at the instigator level.
    InstigatorLevelCurve {
        /// Curve over level.
        curve: Curve,
        /// Fallback.
        #[serde(default)]
        default: f32,
    },
    /// One value per state level.
    StateLevelArray {
        /// Values for levels 1, 2, ...
        values: Vec<f32>,
        /// Fallback.
        #[serde(default)]
        default: f32,
    },
    /// Curve sampled at the state level.
    StateLevelCurve {
        /// Curve over level.
        curve: Curve,
        /// Fallback.
        #[serde(default)]
        default: f32,
    },
}

impl ParameterParser {
    /// Resolves the base value.
    #[must_use]
    pub fn parse(&self, input: &ParseInput<'_>) -> f32 {
        match self {
            Self::Constant { value } => *value,
            Self::InstigatorLevelArray { values, default } => {
                index_by_level(values, input.instigator_level()).unwrap_or(*default)
            }
            Self::InstigatorLevelCurve { curve, default } => {
                sample_at_level(curve, input.instigator_level()).unwrap_or(*default)
            }
            Self::StateLevelArray { values, default } => {
                index_by_level(values, input.state_level).unwrap_or(*default)
            }
            Self::StateLevelCurve { curve, default } => {
                sample_at_level(curve, input.state_level).unwrap_or(*default)
            }
        }
    }
}

fn index_by_level(values: &[f32], level: Option<i32>) -> Option<f32> {
    let index = usize::try_from(level?.checked_sub(1)?).ok()?;
    values.get(index).copied()
}

#[allow(clippy::cast_precision_loss)]
fn sample_at_level(curve: &Curve, level: Option<i32>) -> Option<f32> {
    curve.evaluate(level? as f32)
}

/// Configuration of one numeric skill parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericParameterConfig {
    /// Base value source.
    pub parser: ParameterParser,
    /// Computed once at cast time instead of continuously.
    #[serde(default)]
    pub snapshot: bool,
}

impl NumericParameterConfig {
    /// A real-time parameter.
    #[must_use]
    pub const fn realtime(parser: ParameterParser) -> Self {
        Self {
            parser,
            snapshot: false,
        }
    }

    /// A snapshot parameter.
    #[must_use]
    pub const fn snapshot(parser: ParameterParser) -> Self {
        Self {
            parser,
            snapshot: true,
        }
    }

    /// A real-time constant.
    #[must_use]
    pub const fn constant(value: f32) -> Self {
        Self::realtime(ParameterParser::Constant { value })
    }
}

// =============================================================================
// Scaling
// =============================================================================

bitflags! {
    /// Built-in scaling classes of a numeric parameter.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ParameterScaling: u8 {
        /// Scales with skill level.
        const DAMAGE = 0b0000_0001;
        /// Scales with skill level.
        const HEALING = 0b0000_0010;
        /// Scales with the cooldown multiplier.
        const COOLDOWN = 0b0000_0100;
        /// Scales with the cost multiplier.
        const COST = 0b0000_1000;
    }
}

impl ParameterScaling {
    /// Classifies a parameter by name.
    ///
    /// ```
    /// use aegis_core::skill::ParameterScaling;
    ///
    /// assert_eq!(ParameterScaling::classify("FireDamage"), ParameterScaling::DAMAGE);
    /// assert_eq!(ParameterScaling::classify("ManaCost"), ParameterScaling::COST);
    /// assert!(ParameterScaling::classify("Radius").is_empty());
    /// ```
    #[must_use]
    pub fn classify(name: &str) -> Self {
        let mut scaling = Self::empty();
        if name.contains("Damage") {
            scaling |= Self::DAMAGE;
        }
        if name.contains("Heal") {
            scaling |= Self::HEALING;
        }
        if name.contains("Cooldown") {
            scaling |= Self::COOLDOWN;
        }
        if name.contains("Cost") {
            scaling |= Self::COST;
        }
        scaling
    }

    /// Applies the scaling to a value.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn apply(self, value: f32, level: i32, cooldown_multiplier: f32, cost_multiplier: f32) -> f32 {
        let mut value = value;
        if self.intersects(Self::DAMAGE | Self::HEALING) {
            value *= 1.0 + DAMAGE_SCALING_PER_LEVEL * (level.max(1) - 1) as f32;
        }
        if self.contains(Self::COOLDOWN) {
            value *= cooldown_multiplier;
        }
        if self.contains(Self::COST) {
            value *= cost_multiplier;
        }
        value
    }
}
