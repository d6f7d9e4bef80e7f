use aegis_core::attribute::{AttributeDefinition, RangeRule};
use aegis_core::definitions::DefinitionRegistry;
use aegis_core::entity::{EntityId, EntityTag};
use aegis_core::modifier::{ExecutorKind, ModifierDefinition, ModifierMode};
use aegis_core::simulation::Simulation;
use aegis_core::skill::{NumericParameterConfig, ParameterParser, SkillDefId, SkillDefinition};
use aegis_core::state::{GrantedModifier, StateDefinition, StateKind, StateParameters};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn definitions() -> DefinitionRegistry {
    let mut defs = DefinitionRegistry::new();
    defs.register_attribute(AttributeDefinition::new("MaxHealth"))
        .unwrap();
    defs.register_attribute(
        AttributeDefinition::new("Health").with_range(RangeRule::capped_by(0.0, "MaxHealth")),
    )
    .unwrap();
    defs.register_attribute(AttributeDefinition::new("Speed")).unwrap();
    defs.register_attribute(AttributeDefinition::new("Level")).unwrap();
    defs.register_modifier(
        ModifierDefinition::new("Flat", "Speed", ModifierMode::CurrentValue, ExecutorKind::Addition)
            .with_priority(0),
    )
    .unwrap();
    defs.register_modifier(
        ModifierDefinition::new(
            "Scale",
            "Speed",
            ModifierMode::CurrentValue,
            ExecutorKind::MultiplyAdditive,
        )
        .with_priority(1),
    )
    .unwrap();
    defs.register_state(
        StateDefinition::new("Haste", StateKind::Buff)
            .with_behavior("ModifierAura")
            .infinite()
            .with_granted_modifier(GrantedModifier::new("Flat", 2.0)),
    )
    .unwrap();
    defs.register_state(StateDefinition::new("DashState", StateKind::Skill).infinite())
        .unwrap();
    defs.register_skill(SkillDefinition::new("Dash", "DashState").with_parameter(
        "Distance",
        NumericParameterConfig::realtime(ParameterParser::InstigatorLevelArray {
            values: vec![4.0, 6.0, 8.0],
            default: 2.0,
        }),
    ))
    .unwrap();
    defs
}

fn populated(count: usize) -> (Simulation, Vec<EntityId>) {
    let mut sim = Simulation::new(definitions());
    let dash = SkillDefId::new("Dash");
    let ids: Vec<EntityId> = (0..count)
        .map(|i| {
            let id = sim.spawn(EntityTag::Combatant, format!("unit-{i}"));
            sim.add_attribute(id, "MaxHealth", 100.0);
            sim.add_attribute(id, "Health", 100.0);
            sim.add_attribute(id, "Speed", 5.0);
            sim.add_attribute(id, "Level", 1.0);
            sim.apply_state(id, &"Haste".into(), None, StateParameters::new())
                .unwrap();
            sim.learn_skill(id, &dash, 1).unwrap();
            sim.try_cast_skill(id, &dash, None).unwrap();
            id
        })
        .collect();
    sim.take_events();
    (sim, ids)
}

fn bench_recalculate_current(c: &mut Criterion) {
    let (mut sim, ids) = populated(1);
    let id = ids[0];
    let modifiers: Vec<_> = (0..32)
        .map(|i| {
            let name = if i % 2 == 0 { "Flat" } else { "Scale" };
            #[allow(clippy::cast_precision_loss)]
            let magnitude = 0.1 * i as f32;
            sim.create_modifier(name, format!("gear-{i}"))
                .unwrap()
                .with_magnitude(magnitude)
        })
        .collect();
    sim.apply_modifiers(id, modifiers.clone());

    c.bench_function("recalculate_32_modifiers", |b| {
        b.iter(|| {
            sim.update_modifiers(id, black_box(modifiers.clone()));
            sim.take_events();
        })
    });
}

fn bench_step(c: &mut Criterion) {
    let (mut sim, _) = populated(256);

    c.bench_function("step_256_entities", |b| {
        b.iter(|| {
            sim.step(black_box(0.05));
            sim.take_events();
        })
    });
}

criterion_group!(benches, bench_recalculate_current, bench_step);
criterion_main!(benches);
