use tracing::warn;

use super::grant_commands;
use crate::behavior::{BehaviorContext, BehaviorMachine, DataDependency, RunStatus};

/// Re-applies the granted modifiers every `Interval` seconds.
///
/// Requires the numeric parameter `Interval` (> 0). The boolean parameter
/// `TickOnStart` applies once immediately as well. A single tick applies at
/// most [`MAX_FIRES_PER_TICK`](Self::MAX_FIRES_PER_TICK) times.
#[derive(Debug, Clone, Default)]
pub struct PeriodicEffect {
    elapsed: f32,
}

impl PeriodicEffect {
    /// Script name.
    pub const SCRIPT_ID: &'static str = "PeriodicEffect";
    /// Numeric parameter holding the period in seconds.
    pub const INTERVAL: &'static str = "Interval";
    /// Boolean parameter requesting an application on start.
    pub const TICK_ON_START: &'static str = "TickOnStart";
    /// Upper bound on applications within a single tick.
    pub const MAX_FIRES_PER_TICK: u32 = 64;

    /// Creates an effect with no elapsed time.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn interval(ctx: &BehaviorContext<'_>) -> Option<f32> {
        ctx.instance()
            .numeric_parameter(Self::INTERVAL)
            .filter(|interval| interval.is_finite() && *interval > 0.0)
    }
}

impl BehaviorMachine for PeriodicEffect {
    fn script_id(&self) -> &str {
        Self::SCRIPT_ID
    }

    fn dependencies(&self) -> Vec<DataDependency> {
        vec![DataDependency::NumericParameter(Self::INTERVAL.to_string())]
    }

    fn start(&mut self, ctx: &mut BehaviorContext<'_>) -> RunStatus {
        if Self::interval(ctx).is_none() {
            return RunStatus::Failed;
        }
        self.elapsed = 0.0;
        if ctx.instance().bool_parameter(Self::TICK_ON_START) == Some(true) {
            let grants = grant_commands(ctx.instance());
            ctx.extend(grants);
        }
        RunStatus::Running
    }

    fn tick(&mut self, ctx: &mut BehaviorContext<'_>, dt: f32) -> RunStatus {
        let Some(interval) = Self::interval(ctx) else {
            return RunStatus::Failed;
        };
        self.elapsed += dt.max(0.0);
        let due = (self.elapsed / interval).floor();
        if due < 1.0 {
            return RunStatus::Running;
        }
        self.elapsed %= interval;

        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_precision_loss,
            clippy::cast_sign_loss
        )]
        let fires = {
            let cap = Self::MAX_FIRES_PER_TICK as f32;
            if due > cap {
                warn!(
                    instance = %ctx.instance().id(),
                    due,
                    interval,
                    "periodic effect capped; surplus applications dropped"
                );
            }
            due.min(cap) as u32
        };
        for _ in 0..fires {
            let grants = grant_commands(ctx.instance());
            ctx.extend(grants);
        }
        RunStatus::Running
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::instance;
    use super::*;
    use crate::arena::Arena;
    use crate::state::{GrantedModifier, StateDefinition, StateKind, StateParameters};

    fn burn() -> StateDefinition {
        StateDefinition::new("Burn", StateKind::Buff)
            .with_granted_modifier(GrantedModifier::new("Fire", -3.0))
    }

    #[test]
    fn applies_once_per_interval() {
        let arena = Arena::new();
        let mut inst = instance(burn(), StateParameters::new().with_numeric("Interval", 0.5));
        let mut effect = PeriodicEffect::new();

        let mut ctx = BehaviorContext::new(arena.view(), &mut inst);
        assert_eq!(effect.start(&mut ctx), RunStatus::Running);
        assert!(ctx.commands().is_empty());

        let mut ctx = BehaviorContext::new(arena.view(), &mut inst);
        effect.tick(&mut ctx, 0.3);
        assert!(ctx.commands().is_empty());

        let mut ctx = BehaviorContext::new(arena.view(), &mut inst);
        effect.tick(&mut ctx, 0.3);
        assert_eq!(ctx.commands().len(), 1);

        let mut ctx = BehaviorContext::new(arena.view(), &mut inst);
        effect.tick(&mut ctx, 1.0);
        assert_eq!(ctx.commands().len(), 2);
    }

    #[test]
    fn tiny_interval_is_capped_per_tick() {
        let arena = Arena::new();
        let mut inst = instance(burn(), StateParameters::new().with_numeric("Interval", 1.0e-9));
        let mut effect = PeriodicEffect::new();

        let mut ctx = BehaviorContext::new(arena.view(), &mut inst);
        assert_eq!(effect.start(&mut ctx), RunStatus::Running);

        let mut ctx = BehaviorContext::new(arena.view(), &mut inst);
        assert_eq!(effect.tick(&mut ctx, 0.1), RunStatus::Running);
        assert_eq!(
            ctx.commands().len(),
            PeriodicEffect::MAX_FIRES_PER_TICK as usize
        );
        assert!(effect.elapsed < 1.0e-9);
    }

    #[test]
    fn remainder_carries_into_next_tick() {
        let arena = Arena::new();
        let mut inst = instance(burn(), StateParameters::new().with_numeric("Interval", 0.25));
        let mut effect = PeriodicEffect::new();

        let mut ctx = BehaviorContext::new(arena.view(), &mut inst);
        effect.tick(&mut ctx, 0.6);
        assert_eq!(ctx.commands().len(), 2);

        let mut ctx = BehaviorContext::new(arena.view(), &mut inst);
        effect.tick(&mut ctx, 0.2);
        assert_eq!(ctx.commands().len(), 1);
    }

    #[test]
    fn tick_on_start() {
        let arena = Arena::new();
        let params = StateParameters::new()
            .with_numeric("Interval", 1.0)
            .with_bool("TickOnStart", true);
        let mut inst = instance(burn(), params);
        let mut effect = PeriodicEffect::new();
        let mut ctx = BehaviorContext::new(arena.view(), &mut inst);
        effect.start(&mut ctx);
        assert_eq!(ctx.commands().len(), 1);
    }

    #[test]
    fn non_positive_interval_fails() {
        let arena = Arena::new();
        let mut inst = instance(burn(), StateParameters::new().with_numeric("Interval", 0.0));
        let mut effect = PeriodicEffect::new();
        let mut ctx = BehaviorContext::new(arena.view(), &mut inst);
        assert_eq!(effect.start(&mut ctx), RunStatus::Failed);
    }

    #[test]
    fn declares_interval_dependency() {
        assert_eq!(
            PeriodicEffect::new().dependencies(),
            vec![DataDependency::NumericParameter("Interval".to_string())]
        );
    }
}
