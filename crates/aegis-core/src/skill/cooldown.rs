use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::SkillDefId;

/// One running cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CooldownRecord {
    /// World time at which the cooldown ends.
    pub end_time: f64,
    /// Length of the cooldown when it was set.
    pub total_duration: f32,
}

impl CooldownRecord {
    /// Seconds left at `now`, never negative.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn remaining(&self, now: f64) -> f32 {
        (self.end_time - now).max(0.0) as f32
    }
}

/// Cooldowns of one entity, keyed by skill.
///
/// Expired records are harmless: every query compares against the supplied
/// time. [`prune`](Self::prune) drops them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CooldownTracker {
    records: BTreeMap<SkillDefId, CooldownRecord>,
}

impl CooldownTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a cooldown of `duration` seconds at `now`.
    ///
    /// A zero, negative or non-finite duration clears the cooldown instead.
    /// Returns the seconds remaining.
    pub fn set(&mut self, skill: &SkillDefId, now: f64, duration: f32) -> f32 {
        if !duration.is_finite() || duration <= 0.0 {
            self.records.remove(skill);
            return 0.0;
        }
        self.records.insert(
            skill.clone(),
            CooldownRecord {
                end_time: now + f64::from(duration),
                total_duration: duration,
            },
        );
        duration
    }

    /// Returns the record for a skill, if any.
    #[must_use]
    pub fn record(&self, skill: &SkillDefId) -> Option<&CooldownRecord> {
        self.records.get(skill)
    }

    /// Seconds left on a skill's cooldown at `now`.
    #[must_use]
    pub fn remaining(&self, skill: &SkillDefId, now: f64) -> f32 {
        self.records.get(skill).map_or(0.0, |record| record.remaining(now))
    }

    /// Returns true if the skill is cooling down at `now`.
    #[must_use]
    pub fn is_on_cooldown(&self, skill: &SkillDefId, now: f64) -> bool {
        self.remaining(skill, now) > 0.0
    }

    /// Moves a cooldown's end `seconds` earlier, clearing it once it ends at
    /// or before `now`.
    ///
    /// Returns the seconds remaining, or `None` if no cooldown was recorded.
    pub fn reduce(&mut self, skill: &SkillDefId, now: f64, seconds: f32) -> Option<f32> {
        let record = self.records.get_mut(skill)?;
        record.end_time -= f64::from(seconds.max(0.0));
        if record.end_time <= now {
            self.records.remove(skill);
            return Some(0.0);
        }
        Some(record.remaining(now))
    }

    /// Clears a cooldown. Returns true if one was recorded.
    pub fn clear(&mut self, skill: &SkillDefId) -> bool {
        self.records.remove(skill).is_some()
    }

    /// Drops records that ended at or before `now` and returns their skills.
    pub fn prune(&mut self, now: f64) -> Vec<SkillDefId> {
        let expired: Vec<SkillDefId> = self
            .records
            .iter()
            .filter(|(_, record)| record.end_time <= now)
            .map(|(skill, _)| skill.clone())
            .collect();
        for skill in &expired {
            self.records.remove(skill);
        }
        expired
    }

    /// Returns the number of recorded cooldowns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
