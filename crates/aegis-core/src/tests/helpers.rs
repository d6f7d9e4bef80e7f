//! Test helper functions for setting up simulations and entities.
//!
//! This module provides factory functions and setup utilities that make
//! writing tests more ergonomic and consistent.

use crate::attribute::{AttributeDefinition, RangeRule};
use crate::definitions::DefinitionRegistry;
use crate::entity::{EntityId, EntityTag};
use crate::event::{CombatEvent, EventKind};
use crate::modifier::{ExecutorKind, ModifierDefinition, ModifierMode};
use crate::simulation::Simulation;
use crate::skill::{NumericParameterConfig, ParameterParser, SkillDefinition};
use crate::state::{GrantTarget, GrantedModifier, StackingRegistry, StateDefinition, StateKind};

// =============================================================================
// Logging
// =============================================================================

/// Routes `tracing` output through the test harness.
///
/// Safe to call from every test; only the first call installs the
/// subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

// =============================================================================
// Definitions
// =============================================================================

/// Builds the registry shared by the scenario tests.
///
/// Attributes:
/// - `Health` in [0, `MaxHealth`]
/// - `MaxHealth`, `Speed`, `Armor` unbounded
/// - `Level` for level-scaled parameters
///
/// States:
/// - `Haste`: 2s aura, +10 `Speed`
/// - `Burning`: 1s periodic, -5 `Health` base every 0.25s
/// - `Frenzy`: infinite aura stacking to 3 with `AddStack`, +1 `Armor` per stack
/// - `Guard`/`Fortress`: exclusive `Stance` slot, priorities 1 and 5
/// - `Heal`: instant +25 `Health` base
/// - `FireballState`: instant skill state hitting the target for `Damage`
/// - `DashState`: 1s passive skill state
///
/// Skills:
/// - `Fireball`: 5s cooldown parameter, level-scaled snapshot `Damage`
/// - `Dash`: 2s base cooldown, real-time `Distance` from the caster level
/// - `Sputter`: 4s base cooldown, state driven by the unregistered `Fizzle`
///   script
pub fn combat_definitions() -> DefinitionRegistry {
    let mut defs = DefinitionRegistry::new();

    defs.register_attribute(AttributeDefinition::new("MaxHealth"))
        .unwrap();
    defs.register_attribute(
        AttributeDefinition::new("Health").with_range(RangeRule::capped_by(0.0, "MaxHealth")),
    )
    .unwrap();
    defs.register_attribute(AttributeDefinition::new("Speed")).unwrap();
    defs.register_attribute(AttributeDefinition::new("Armor")).unwrap();
    defs.register_attribute(AttributeDefinition::new("Level")).unwrap();

    for (name, target, mode, executor) in [
        ("SpeedBonus", "Speed", ModifierMode::CurrentValue, ExecutorKind::Addition),
        ("ArmorBonus", "Armor", ModifierMode::CurrentValue, ExecutorKind::Addition),
        ("FireDamage", "Health", ModifierMode::BaseValue, ExecutorKind::Addition),
        ("Restore", "Health", ModifierMode::BaseValue, ExecutorKind::Addition),
        ("Wound", "Health", ModifierMode::CurrentValue, ExecutorKind::Addition),
        ("LevelUp", "Level", ModifierMode::CurrentValue, ExecutorKind::Addition),
    ] {
        defs.register_modifier(ModifierDefinition::new(name, target, mode, executor))
            .unwrap();
    }
    defs.register_modifier(
        ModifierDefinition::new("FlatSpeed", "Speed", ModifierMode::CurrentValue, ExecutorKind::Addition)
            .with_priority(0),
    )
    .unwrap();
    defs.register_modifier(
        ModifierDefinition::new(
            "DoubleSpeed",
            "Speed",
            ModifierMode::CurrentValue,
            ExecutorKind::MultiplyContinued,
        )
        .with_priority(1),
    )
    .unwrap();

    defs.register_state(
        StateDefinition::new("Haste", StateKind::Buff)
            .with_behavior("ModifierAura")
            .with_duration(2.0)
            .with_granted_modifier(GrantedModifier::new("SpeedBonus", 10.0)),
    )
    .unwrap();
    defs.register_state(
        StateDefinition::new("Burning", StateKind::Buff)
            .with_behavior("PeriodicEffect")
            .with_duration(1.05)
            .with_parameter("Interval", 0.25)
            .with_granted_modifier(GrantedModifier::new("FireDamage", -5.0)),
    )
    .unwrap();
    defs.register_state(
        StateDefinition::new("Frenzy", StateKind::Buff)
            .with_behavior("ModifierAura")
            .infinite()
            .with_max_stacks(3)
            .with_stacking(Some(StackingRegistry::ADD_STACK), Some(StackingRegistry::ADD_STACK))
            .with_granted_modifier(GrantedModifier::new("ArmorBonus", 1.0).scaled_with_stacks()),
    )
    .unwrap();
    defs.register_state(
        StateDefinition::new("Guard", StateKind::State)
            .infinite()
            .with_slot("Stance")
            .with_priority(1),
    )
    .unwrap();
    defs.register_state(
        StateDefinition::new("Fortress", StateKind::State)
            .infinite()
            .with_slot("Stance")
            .with_priority(5),
    )
    .unwrap();
    defs.register_state(
        StateDefinition::new("Heal", StateKind::State)
            .with_behavior("InstantEffect")
            .with_granted_modifier(GrantedModifier::new("Restore", 25.0)),
    )
    .unwrap();
    defs.register_state(
        StateDefinition::new("FireballState", StateKind::Skill)
            .with_behavior("InstantEffect")
            .with_granted_modifier(
                GrantedModifier::new("FireDamage", 0.0)
                    .with_magnitude_parameter("Damage")
                    .to(GrantTarget::Target),
            ),
    )
    .unwrap();
    defs.register_state(StateDefinition::new("DashState", StateKind::Skill).with_duration(1.0))
        .unwrap();
    defs.register_state(
        StateDefinition::new("SputterState", StateKind::Skill)
            .with_behavior("Fizzle")
            .with_duration(1.0),
    )
    .unwrap();

    defs.register_skill(
        SkillDefinition::new("Fireball", "FireballState")
            .with_max_level(5)
            .with_parameter("Cooldown", NumericParameterConfig::constant(5.0))
            .with_parameter("Damage", NumericParameterConfig::constant(-20.0)),
    )
    .unwrap();
    defs.register_skill(
        SkillDefinition::new("Dash", "DashState")
            .with_base_cooldown(2.0)
            .with_parameter(
                "Distance",
                NumericParameterConfig::realtime(ParameterParser::InstigatorLevelArray {
                    values: vec![4.0, 6.0, 8.0],
                    default: 2.0,
                }),
            ),
    )
    .unwrap();
    defs.register_skill(SkillDefinition::new("Sputter", "SputterState").with_base_cooldown(4.0))
        .unwrap();

    defs.set_slot_kind("Stance", crate::state::SlotKind::Exclusive);
    defs
}

/// Creates a simulation over [`combat_definitions`].
pub fn combat_simulation() -> Simulation {
    init_tracing();
    Simulation::new(combat_definitions())
}

// =============================================================================
// Entities
// =============================================================================

/// Spawns a combatant with full health and the standard attribute set.
pub fn spawn_fighter(sim: &mut Simulation, name: &str, health: f32) -> EntityId {
    let id = sim.spawn(EntityTag::Combatant, name);
    assert!(sim.add_attribute(id, "MaxHealth", health));
    assert!(sim.add_attribute(id, "Health", health));
    assert!(sim.add_attribute(id, "Speed", 5.0));
    assert!(sim.add_attribute(id, "Armor", 0.0));
    assert!(sim.add_attribute(id, "Level", 1.0));
    id
}

// =============================================================================
// Queries
// =============================================================================

/// Current value of an attribute.
pub fn current(sim: &Simulation, id: EntityId, attribute: &str) -> f32 {
    sim.arena()
        .view()
        .attribute_current(id, attribute)
        .unwrap_or_else(|| panic!("{id} has no {attribute}"))
}

/// Base value of an attribute.
pub fn base(sim: &Simulation, id: EntityId, attribute: &str) -> f32 {
    sim.arena()
        .view()
        .attribute_base(id, attribute)
        .unwrap_or_else(|| panic!("{id} has no {attribute}"))
}

/// Keeps only events of `kind`.
pub fn events_of(events: &[CombatEvent], kind: EventKind) -> Vec<CombatEvent> {
    events.iter().filter(|e| e.kind() == kind).cloned().collect()
}

/// Steps `steps` times with a fixed `dt`.
pub fn run(sim: &mut Simulation, steps: usize, dt: f32) {
    for _ in 0..steps {
        sim.step(dt);
    }
}
