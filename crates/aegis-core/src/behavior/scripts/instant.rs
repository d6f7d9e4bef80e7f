use super::grant_commands;
use crate::behavior::{BehaviorContext, BehaviorMachine, RunStatus};

/// Applies the granted modifiers once and succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantEffect;

impl InstantEffect {
    /// Script name.
    pub const SCRIPT_ID: &'static str = "InstantEffect";
}

impl BehaviorMachine for InstantEffect {
    fn script_id(&self) -> &str {
        Self::SCRIPT_ID
    }

    fn start(&mut self, ctx: &mut BehaviorContext<'_>) -> RunStatus {
        let grants = grant_commands(ctx.instance());
        ctx.extend(grants);
        RunStatus::Succeeded
    }

    fn tick(&mut self, _ctx: &mut BehaviorContext<'_>, _dt: f32) -> RunStatus {
        RunStatus::Succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::instance;
    use super::*;
    use crate::arena::Arena;
    use crate::state::{GrantedModifier, StateDefinition, StateKind, StateParameters};

    #[test]
    fn applies_and_succeeds() {
        let arena = Arena::new();
        let def = StateDefinition::new("Potion", StateKind::State)
            .with_granted_modifier(GrantedModifier::new("Heal", 25.0))
            .with_granted_modifier(GrantedModifier::new("Cleanse", 1.0));
        let mut inst = instance(def, StateParameters::new());
        let mut ctx = BehaviorContext::new(arena.view(), &mut inst);
        assert_eq!(InstantEffect.start(&mut ctx), RunStatus::Succeeded);
        assert_eq!(ctx.commands().len(), 2);
    }
}
