use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{StateDefId, StateDefinition};
use crate::behavior::RunStatus;
use crate::entity::EntityId;

// =============================================================================
// Identifiers and Enums
// =============================================================================

/// Unique identifier of a state instance within an arena.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateInstanceId(u64);

impl StateInstanceId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for StateInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateInstanceId({})", self.0)
    }
}

impl fmt::Display for StateInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle stage. `Expired` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateStage {
    /// Registered, behavior not started yet.
    #[default]
    Uninitialized,
    /// Behavior running.
    Active,
    /// Removed.
    Expired,
}

/// Why an instance was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalReason {
    /// Duration ran out.
    Expired,
    /// Cancelled by a caller or by the behavior itself.
    Cancelled,
    /// Behavior finished with success.
    Completed,
    /// Behavior failed.
    Failed,
    /// Displaced from an exclusive slot.
    Evicted,
    /// Its skill was forgotten.
    Forgotten,
    /// The owning entity was despawned.
    OwnerRemoved,
}

impl RemovalReason {
    /// Maps a terminal run status to a removal reason.
    #[must_use]
    pub const fn from_status(status: RunStatus) -> Self {
        match status {
            RunStatus::Succeeded => Self::Completed,
            RunStatus::Failed | RunStatus::NotStarted | RunStatus::Running => Self::Failed,
            RunStatus::Stopped => Self::Cancelled,
        }
    }
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// =============================================================================
// Parameters
// =============================================================================

/// Caller-supplied parameters for a new state instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateParameters {
    /// Instance level.
    pub level: i32,
    /// Optional target entity.
    pub target: Option<EntityId>,
    /// Numeric parameters; override the definition defaults.
    pub numeric: BTreeMap<String, f32>,
    /// Boolean parameters.
    pub bools: BTreeMap<String, bool>,
    /// Vector parameters.
    pub vectors: BTreeMap<String, Vec3>,
}

impl Default for StateParameters {
    fn default() -> Self {
        Self {
            level: 1,
            target: None,
            numeric: BTreeMap::new(),
            bools: BTreeMap::new(),
            vectors: BTreeMap::new(),
        }
    }
}

impl StateParameters {
    /// Level 1, no target, no values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the level.
    #[must_use]
    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Sets the target.
    #[must_use]
    pub fn with_target(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }

    /// Adds a numeric value.
    #[must_use]
    pub fn with_numeric(mut self, name: impl Into<String>, value: f32) -> Self {
        self.numeric.insert(name.into(), value);
        self
    }

    /// Adds a boolean value.
    #[must_use]
    pub fn with_bool(mut self, name: impl Into<String>, value: bool) -> Self {
        self.bools.insert(name.into(), value);
        self
    }

    /// Adds a vector value.
    #[must_use]
    pub fn with_vector(mut self, name: impl Into<String>, value: Vec3) -> Self {
        self.vectors.insert(name.into(), value);
        self
    }
}

// =============================================================================
// State Instance
// =============================================================================

/// Runtime record of one applied state.
#[derive(Debug, Clone)]
pub struct StateInstance {
    definition: Arc<StateDefinition>,
    id: StateInstanceId,
    owner: EntityId,
    instigator: Option<EntityId>,
    target: Option<EntityId>,
    level: i32,
    stack_count: i32,
    stage: StateStage,
    run_status: RunStatus,
    numeric: BTreeMap<String, f32>,
    bools: BTreeMap<String, bool>,
    vectors: BTreeMap<String, Vec3>,
    applied_at: f64,
}

impl StateInstance {
    /// Creates an uninitialized instance.
    ///
    /// Numeric parameters start from the definition defaults, overridden by
    /// `parameters`. The stack count starts at 1, or 0 when stacking is
    /// disabled.
    #[must_use]
    pub fn new(
        definition: Arc<StateDefinition>,
        id: StateInstanceId,
        owner: EntityId,
        instigator: Option<EntityId>,
        parameters: StateParameters,
        applied_at: f64,
    ) -> Self {
        let mut numeric = definition.default_parameters.clone();
        numeric.extend(parameters.numeric);
        let stack_count = i32::from(definition.max_stack_count > 0);
        Self {
            definition,
            id,
            owner,
            instigator,
            target: parameters.target,
            level: parameters.level.max(1),
            stack_count,
            stage: StateStage::Uninitialized,
            run_status: RunStatus::NotStarted,
            numeric,
            bools: parameters.bools,
            vectors: parameters.vectors,
            applied_at,
        }
    }

    /// Returns the definition.
    #[must_use]
    pub fn definition(&self) -> &Arc<StateDefinition> {
        &self.definition
    }

    /// Returns the definition id.
    #[must_use]
    pub fn def_id(&self) -> &StateDefId {
        &self.definition.id
    }

    /// Returns the instance id.
    #[must_use]
    pub const fn id(&self) -> StateInstanceId {
        self.id
    }

    /// Returns the owning entity.
    #[must_use]
    pub const fn owner(&self) -> EntityId {
        self.owner
    }

    /// Returns the entity that applied the state.
    #[must_use]
    pub const fn instigator(&self) -> Option<EntityId> {
        self.instigator
    }

    /// Returns the target entity.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Returns the level.
    #[must_use]
    pub const fn level(&self) -> i32 {
        self.level
    }

    /// Sets the level (at least 1).
    pub fn set_level(&mut self, level: i32) {
        self.level = level.max(1);
    }

    /// Returns the lifecycle stage.
    #[must_use]
    pub const fn stage(&self) -> StateStage {
        self.stage
    }

    /// Returns true while the behavior is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.stage == StateStage::Active
    }

    pub(crate) fn set_stage(&mut self, stage: StateStage) {
        self.stage = stage;
    }

    /// Returns the last status reported by the behavior machine.
    #[must_use]
    pub const fn run_status(&self) -> RunStatus {
        self.run_status
    }

    pub(crate) fn set_run_status(&mut self, status: RunStatus) {
        self.run_status = status;
    }

    /// Returns the world time the instance was created.
    #[must_use]
    pub const fn applied_at(&self) -> f64 {
        self.applied_at
    }

    /// Source name used for modifiers this instance grants.
    #[must_use]
    pub fn source_tag(&self) -> String {
        format!("state:{}#{}", self.definition.id, self.id)
    }

    // -------------------------------------------------------------------------
    // Stacking
    // -------------------------------------------------------------------------

    /// Returns true if the definition allows stacking.
    #[must_use]
    pub fn can_stack(&self) -> bool {
        self.definition.max_stack_count > 0
    }

    /// Returns the stack count.
    #[must_use]
    pub const fn stack_count(&self) -> i32 {
        self.stack_count
    }

    /// Sets the stack count, clamped to `[1, max]`, or 0 when stacking is
    /// disabled. Returns the stored count.
    pub fn set_stack_count(&mut self, count: i32) -> i32 {
        let max = self.definition.max_stack_count;
        self.stack_count = if max > 0 { count.max(1).min(max) } else { 0 };
        self.stack_count
    }

    /// Adds stacks. Returns the stored count.
    pub fn add_stack(&mut self, count: i32) -> i32 {
        self.set_stack_count(self.stack_count.saturating_add(count))
    }

    /// Removes stacks, never going below one. Returns the stored count.
    pub fn remove_stack(&mut self, count: i32) -> i32 {
        self.set_stack_count(self.stack_count.saturating_sub(count))
    }

    // -------------------------------------------------------------------------
    // Parameters
    // -------------------------------------------------------------------------

    /// Returns a numeric parameter.
    #[must_use]
    pub fn numeric_parameter(&self, name: &str) -> Option<f32> {
        self.numeric.get(name).copied()
    }

    /// Sets a numeric parameter.
    pub fn set_numeric_parameter(&mut self, name: impl Into<String>, value: f32) {
        self.numeric.insert(name.into(), value);
    }

    /// Returns every numeric parameter.
    #[must_use]
    pub const fn numeric_parameters(&self) -> &BTreeMap<String, f32> {
        &self.numeric
    }

    /// Returns a boolean parameter.
    #[must_use]
    pub fn bool_parameter(&self, name: &str) -> Option<bool> {
        self.bools.get(name).copied()
    }

    /// Sets a boolean parameter.
    pub fn set_bool_parameter(&mut self, name: impl Into<String>, value: bool) {
        self.bools.insert(name.into(), value);
    }

    /// Returns a vector parameter.
    #[must_use]
    pub fn vector_parameter(&self, name: &str) -> Option<Vec3> {
        self.vectors.get(name).copied()
    }

    /// Sets a vector parameter.
    pub fn set_vector_parameter(&mut self, name: impl Into<String>, value: Vec3) {
        self.vectors.insert(name.into(), value);
    }
}
