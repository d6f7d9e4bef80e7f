use std::collections::BTreeMap;

use super::{CooldownTracker, SkillDefId, SkillInstance};

/// Per-entity learned-skill catalog and cooldowns.
#[derive(Debug, Clone, Default)]
pub struct SkillComponent {
    skills: BTreeMap<SkillDefId, SkillInstance>,
    cooldowns: CooldownTracker,
}

impl SkillComponent {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a learned skill.
    #[must_use]
    pub fn get(&self, skill: &SkillDefId) -> Option<&SkillInstance> {
        self.skills.get(skill)
    }

    /// Returns a learned skill mutably.
    ///
    /// Multipliers, skill modifiers and bool/vector parameters are edited
    /// through this; level changes go through
    /// [`SkillEngine::set_skill_level`](super::SkillEngine::set_skill_level)
    /// so they are announced.
    pub fn get_mut(&mut self, skill: &SkillDefId) -> Option<&mut SkillInstance> {
        self.skills.get_mut(skill)
    }

    /// Returns true if the skill is learned.
    #[must_use]
    pub fn contains(&self, skill: &SkillDefId) -> bool {
        self.skills.contains_key(skill)
    }

    /// Iterates learned skills in id order.
    pub fn iter(&self) -> impl Iterator<Item = &SkillInstance> {
        self.skills.values()
    }

    /// Returns the number of learned skills.
    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Returns true if nothing is learned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Returns the cooldown tracker.
    #[must_use]
    pub const fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    pub(crate) fn cooldowns_mut(&mut self) -> &mut CooldownTracker {
        &mut self.cooldowns
    }

    pub(crate) fn insert(&mut self, skill: SkillInstance) {
        self.skills.insert(skill.id().clone(), skill);
    }

    pub(crate) fn remove(&mut self, skill: &SkillDefId) -> Option<SkillInstance> {
        self.skills.remove(skill)
    }
}
