//! Skills: learned capabilities that grant a state when cast.
//!
//! A [`SkillInstance`] lives in its owner's [`SkillComponent`] independently
//! of any active effect. It tracks the level, the multipliers and the
//! numeric parameter configuration. [`SkillEngine::try_cast`] spawns the
//! skill's `Skill`-kind state with the computed parameters and starts the
//! cooldown.

mod component;
mod cooldown;
mod definition;
mod engine;
mod instance;
mod parameter;

pub use component::SkillComponent;
pub use cooldown::{CooldownRecord, CooldownTracker};
pub use definition::{SkillDefId, SkillDefinition};
pub use engine::{SkillEngine, COOLDOWN_PARAMETER};
pub use instance::{SkillInstance, SkillModifier, SkillModifierKind};
pub use parameter::{
    Curve, NumericParameterConfig, ParameterParser, ParameterScaling, ParseInput,
    DAMAGE_SCALING_PER_LEVEL,
};
