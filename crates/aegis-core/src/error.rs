//! Error types for the combat core.
//!
//! Every fallible public operation returns one of the enums below. Each error
//! reports an [`ErrorKind`] so callers can tell a designer mistake (bad data)
//! apart from a gameplay refusal that should be shown to the player.
//!
//! | kind | typical cause | caller action |
//! |---|---|---|
//! | `MissingData` | unknown definition, entity without components | ignore, fix data |
//! | `InvalidConfiguration` | malformed definition | ignore, fix data |
//! | `PreconditionViolation` | on cooldown, not learned, slot taken | show [`Display`](std::fmt::Display) text |
//! | `RuntimeExecutionFailure` | behavior machine failed | instance already cleaned up |

use thiserror::Error;

use crate::behavior::RunStatus;
use crate::entity::EntityId;
use crate::skill::SkillDefId;
use crate::state::StateDefId;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification shared by all core errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A definition, entity or component could not be found.
    MissingData,
    /// Data was found but is malformed.
    InvalidConfiguration,
    /// A gameplay rule refused the request.
    PreconditionViolation,
    /// A behavior machine failed while initializing or running.
    RuntimeExecutionFailure,
}

impl ErrorKind {
    /// Returns true for errors that carry a message meant for players.
    #[must_use]
    pub const fn is_user_facing(self) -> bool {
        matches!(self, Self::PreconditionViolation)
    }
}

// =============================================================================
// State Errors
// =============================================================================

/// Reasons an `ApplyState` request was refused or rolled back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplyStateError {
    /// No state definition is registered under this id.
    #[error("unknown state definition `{0}`")]
    UnknownState(StateDefId),

    /// The owner is gone or lacks attribute/state components.
    #[error("entity {0} cannot hold states")]
    MissingComponents(EntityId),

    /// Skill states are only granted by casting their skill.
    #[error("state `{0}` can only be granted by casting its skill")]
    WrongKind(StateDefId),

    /// One of the definition's application conditions failed.
    #[error("conditions for `{0}` are not met")]
    ConditionsNotMet(StateDefId),

    /// An exclusive slot is held by a state with higher precedence.
    #[error("slot `{slot}` is held by a higher priority state")]
    SlotOccupied {
        /// Slot tag.
        slot: String,
    },

    /// The definition names a behavior script nobody registered.
    #[error("unknown behavior script `{0}`")]
    UnknownBehavior(String),

    /// The behavior machine refused to initialize.
    #[error("behavior for `{0}` failed to initialize")]
    InitializationFailed(StateDefId),

    /// The behavior machine did not reach the running state.
    #[error("behavior for `{state}` did not start ({status:?})")]
    StartFailed {
        /// State definition id.
        state: StateDefId,
        /// Status returned by the machine.
        status: RunStatus,
    },
}

impl ApplyStateError {
    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownState(_) | Self::MissingComponents(_) | Self::UnknownBehavior(_) => {
                ErrorKind::MissingData
            }
            Self::WrongKind(_) => ErrorKind::InvalidConfiguration,
            Self::ConditionsNotMet(_) | Self::SlotOccupied { .. } => {
                ErrorKind::PreconditionViolation
            }
            Self::InitializationFailed(_) | Self::StartFailed { .. } => {
                ErrorKind::RuntimeExecutionFailure
            }
        }
    }
}

// =============================================================================
// Skill Errors
// =============================================================================

/// Reasons a cast was refused.
///
/// The `Display` output is the caller-facing reason string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CastError {
    /// The caster is gone or cannot learn skills.
    #[error("entity {0} has no skills")]
    NoSkillComponent(EntityId),

    /// The skill is not in the caster's catalog.
    #[error("skill `{0}` is not learned")]
    NotLearned(SkillDefId),

    /// The skill is still cooling down.
    #[error("skill `{skill}` is on cooldown ({remaining:.1}s remaining)")]
    OnCooldown {
        /// Skill id.
        skill: SkillDefId,
        /// Seconds left.
        remaining: f32,
    },

    /// The state granted by a previous cast is still active.
    #[error("skill `{0}` is already active")]
    AlreadyActive(SkillDefId),

    /// Granting the skill's state failed.
    #[error("skill `{skill}` could not grant its state: {source}")]
    State {
        /// Skill id.
        skill: SkillDefId,
        /// Underlying state error.
        source: ApplyStateError,
    },
}

impl CastError {
    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoSkillComponent(_) => ErrorKind::MissingData,
            Self::NotLearned(_) | Self::OnCooldown { .. } | Self::AlreadyActive(_) => {
                ErrorKind::PreconditionViolation
            }
            Self::State { source, .. } => source.kind(),
        }
    }
}

/// Errors from skill catalog management.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkillError {
    /// No skill definition is registered under this id.
    #[error("unknown skill definition `{0}`")]
    UnknownSkill(SkillDefId),

    /// The entity is gone or cannot learn skills.
    #[error("entity {0} has no skills")]
    NoSkillComponent(EntityId),

    /// The skill is already in the catalog.
    #[error("skill `{0}` is already learned")]
    AlreadyLearned(SkillDefId),

    /// The skill is not in the catalog.
    #[error("skill `{0}` is not learned")]
    NotLearned(SkillDefId),
}

impl SkillError {
    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownSkill(_) | Self::NoSkillComponent(_) => ErrorKind::MissingData,
            Self::AlreadyLearned(_) | Self::NotLearned(_) => ErrorKind::PreconditionViolation,
        }
    }
}

// =============================================================================
// Definition / Config Errors
// =============================================================================

/// Problems found while registering or validating definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// Two definitions of the same family share a name.
    #[error("duplicate {family} definition `{name}`")]
    Duplicate {
        /// Definition family ("attribute", "modifier", ...).
        family: &'static str,
        /// Offending name.
        name: String,
    },

    /// A skill grants a state that is not registered.
    #[error("skill `{skill}` grants unknown state `{state}`")]
    UnknownState {
        /// Skill id.
        skill: SkillDefId,
        /// Missing state id.
        state: StateDefId,
    },

    /// A skill grants a state whose kind is not `Skill`.
    #[error("skill `{skill}` grants `{state}`, which is not a skill state")]
    NotASkillState {
        /// Skill id.
        skill: SkillDefId,
        /// State id.
        state: StateDefId,
    },

    /// A state grants a modifier that is not registered.
    #[error("state `{state}` grants unknown modifier `{modifier}`")]
    UnknownModifier {
        /// State id.
        state: StateDefId,
        /// Missing modifier name.
        modifier: String,
    },

    /// A modifier has no target attribute.
    #[error("modifier `{0}` has no target attribute")]
    EmptyTarget(String),
}

impl DefinitionError {
    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidConfiguration
    }
}

/// Invalid [`CoreConfig`](crate::config::CoreConfig) values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A field must be finite and non-negative.
    #[error("`{field}` must be finite and non-negative, got {value}")]
    OutOfRange {
        /// Field name.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },

    /// Duration polling needs a positive interval.
    #[error("`duration_tick_interval` must be positive")]
    ZeroTickInterval,
}
