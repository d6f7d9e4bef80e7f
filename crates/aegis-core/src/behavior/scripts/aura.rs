use super::grant_commands;
use crate::behavior::{BehaviorCommand, BehaviorContext, BehaviorMachine, RunStatus};
use crate::state::RemovalReason;

/// Holds the definition's granted modifiers while the state runs.
///
/// Each tick the grants are re-resolved; if a stack count or a magnitude
/// parameter changed, the old modifiers are withdrawn and the new ones
/// applied. Stopping withdraws everything.
#[derive(Debug, Clone, Default)]
pub struct ModifierAura {
    applied: Vec<BehaviorCommand>,
}

impl ModifierAura {
    /// Script name.
    pub const SCRIPT_ID: &'static str = "ModifierAura";

    /// Creates an aura that has granted nothing yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BehaviorMachine for ModifierAura {
    fn script_id(&self) -> &str {
        Self::SCRIPT_ID
    }

    fn start(&mut self, ctx: &mut BehaviorContext<'_>) -> RunStatus {
        self.applied = grant_commands(ctx.instance());
        ctx.extend(self.applied.iter().cloned());
        RunStatus::Running
    }

    fn tick(&mut self, ctx: &mut BehaviorContext<'_>, _dt: f32) -> RunStatus {
        let grants = grant_commands(ctx.instance());
        if grants != self.applied {
            ctx.push(BehaviorCommand::RemoveGrantedModifiers { target: None });
            ctx.extend(grants.iter().cloned());
            self.applied = grants;
        }
        RunStatus::Running
    }

    fn stop(&mut self, ctx: &mut BehaviorContext<'_>, _reason: RemovalReason) -> RunStatus {
        ctx.push(BehaviorCommand::RemoveGrantedModifiers { target: None });
        self.applied.clear();
        RunStatus::Stopped
    }
}
