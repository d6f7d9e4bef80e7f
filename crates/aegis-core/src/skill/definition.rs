use std::collections::BTreeMap;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::NumericParameterConfig;
use crate::state::StateDefId;

/// Identifier of a skill definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillDefId(String);

impl SkillDefId {
    /// Creates an id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SkillDefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SkillDefId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

const fn default_max_level() -> i32 {
    1
}

/// Immutable description of a learnable skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    /// Skill id, unique within a registry.
    pub id: SkillDefId,
    /// `Skill`-kind state granted on cast.
    pub state: StateDefId,
    /// Highest level the skill can reach.
    #[serde(default = "default_max_level")]
    pub max_level: i32,
    /// Cooldown used when the skill has no `Cooldown` parameter.
    #[serde(default)]
    pub base_cooldown: f32,
    /// Numeric parameter configurations by name.
    #[serde(default)]
    pub parameters: BTreeMap<String, NumericParameterConfig>,
    /// Initial boolean parameters.
    #[serde(default)]
    pub bool_parameters: BTreeMap<String, bool>,
    /// Initial vector parameters.
    #[serde(default)]
    pub vector_parameters: BTreeMap<String, Vec3>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SkillDefinition {
    /// Creates a level-1 skill with no cooldown or parameters.
    #[must_use]
    pub fn new(id: impl Into<SkillDefId>, state: impl Into<StateDefId>) -> Self {
        Self {
            id: id.into(),
            state: state.into(),
            max_level: default_max_level(),
            base_cooldown: 0.0,
            parameters: BTreeMap::new(),
            bool_parameters: BTreeMap::new(),
            vector_parameters: BTreeMap::new(),
            tags: Vec::new(),
        }
    }

    /// Sets the maximum level.
    #[must_use]
    pub fn with_max_level(mut self, max_level: i32) -> Self {
        self.max_level = max_level.max(1);
        self
    }

    /// Sets the fallback cooldown.
    #[must_use]
    pub fn with_base_cooldown(mut self, seconds: f32) -> Self {
        self.base_cooldown = seconds;
        self
    }

    /// Adds a numeric parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, config: NumericParameterConfig) -> Self {
        self.parameters.insert(name.into(), config);
        self
    }

    /// Adds a boolean parameter.
    #[must_use]
    pub fn with_bool_parameter(mut self, name: impl Into<String>, value: bool) -> Self {
        self.bool_parameters.insert(name.into(), value);
        self
    }

    /// Adds a vector parameter.
    #[must_use]
    pub fn with_vector_parameter(mut self, name: impl Into<String>, value: Vec3) -> Self {
        self.vector_parameters.insert(name.into(), value);
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}
