//! Component capability flags.
//!
//! An entity carries a subset of the three combat components. Operations on a
//! missing component are silent no-ops, so the flags decide which systems an
//! entity takes part in.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Which combat components an entity owns.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ComponentSet: u8 {
        /// Attribute store (stats, modifiers).
        const ATTRIBUTES = 0b0000_0001;
        /// State registries (buffs, statuses, skill effects).
        const STATES = 0b0000_0010;
        /// Learned-skill catalog and cooldowns.
        const SKILLS = 0b0000_0100;
    }
}

impl Default for ComponentSet {
    fn default() -> Self {
        Self::all()
    }
}
