//! Built-in behavior scripts.
//!
//! All three read the owning definition's
//! [`granted_modifiers`](crate::state::StateDefinition::granted_modifiers):
//!
//! - [`ModifierAura`]: holds the modifiers for as long as the state runs
//! - [`PeriodicEffect`]: re-applies them every `Interval` seconds
//! - [`InstantEffect`]: applies them once and finishes
//!
//! [`Passive`] is used for definitions that name no script.

mod aura;
mod instant;
mod periodic;

pub use aura::ModifierAura;
pub use instant::InstantEffect;
pub use periodic::PeriodicEffect;

use super::{BehaviorCommand, BehaviorContext, BehaviorMachine, RunStatus};
use crate::modifier::MAGNITUDE;
use crate::state::StateInstance;

/// Resolves the definition's granted modifiers into apply commands.
///
/// `Magnitude` comes from the named state parameter when one is configured
/// and present, and is multiplied by the stack count when the grant scales
/// with stacks.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn grant_commands(instance: &StateInstance) -> Vec<BehaviorCommand> {
    instance
        .definition()
        .granted_modifiers
        .iter()
        .map(|granted| {
            let mut operands = granted.operands.clone();
            if let Some(value) = granted
                .magnitude_parameter
                .as_deref()
                .and_then(|name| instance.numeric_parameter(name))
            {
                operands.insert(MAGNITUDE.to_string(), value);
            }
            if granted.scale_with_stacks && instance.stack_count() > 0 {
                if let Some(magnitude) = operands.get_mut(MAGNITUDE) {
                    *magnitude *= instance.stack_count() as f32;
                }
            }
            BehaviorCommand::ApplyModifier {
                target: granted.target,
                modifier: granted.modifier.clone(),
                operands,
            }
        })
        .collect()
}

/// Runs until removed and does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passive;

impl Passive {
    /// Script name.
    pub const SCRIPT_ID: &'static str = "Passive";
}

impl BehaviorMachine for Passive {
    fn script_id(&self) -> &str {
        Self::SCRIPT_ID
    }

    fn start(&mut self, _ctx: &mut BehaviorContext<'_>) -> RunStatus {
        RunStatus::Running
    }

    fn tick(&mut self, _ctx: &mut BehaviorContext<'_>, _dt: f32) -> RunStatus {
        RunStatus::Running
    }
}
