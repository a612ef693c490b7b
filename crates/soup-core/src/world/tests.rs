use super::growth::{Inheritance, SpawnIntent};
use super::*;
use crate::tile::TileKind;

fn quiet(mut config: SoupConfig) -> SoupConfig {
    config.initial_agents = 0;
    config.diffusion.rain_chance = 0.0;
    config.tree.branch_chance = 0.0;
    config
}

fn side_world() -> World {
    World::new(quiet(SoupConfig {
        width: 8,
        height: 10,
        ground_row: 6,
        ..SoupConfig::side_view()
    }))
}

/// Make a tile pass every growth gate.
fn prime(world: &mut World, x: usize, y: usize, growth: f32) {
    let tile = world.tile_mut(x, y).unwrap();
    tile.set_growth(growth);
    tile.set_mood(0.5);
    tile.raise_visits(5);
    tile.set_water(0.8);
    tile.set_nutrients(0.8);
}

fn kind(world: &World, x: usize, y: usize) -> TileKind {
    world.grid().get(x, y).unwrap().kind()
}

#[test]
fn seeded_soil_sprouts_trunk_and_roots() {
    let mut world = side_world();
    prime(&mut world, 3, 6, 0.3);
    world.clock_ms = 500.0;
    let applied = world.step_growth_phase();

    assert_eq!(applied, 2);
    assert_eq!(kind(&world, 3, 5), TileKind::Trunk);
    assert_eq!(kind(&world, 3, 6), TileKind::Root);
    assert_eq!(kind(&world, 3, 7), TileKind::Root);

    let trunk = world.grid().get(3, 5).unwrap();
    assert_eq!(trunk.growth(), 0.0);
    assert_eq!(trunk.visits(), 5);
    assert!((trunk.mood() - 0.4).abs() < 1e-6);
    assert!((trunk.water() - 0.795 * 0.8).abs() < 1e-5);
    assert_eq!(trunk.last_update_ms(), 500.0);
    assert!(trunk.solid() && trunk.climbable());
}

#[test]
fn unseeded_soil_and_air_never_grow() {
    let mut world = side_world();
    prime(&mut world, 2, 6, 0.0);
    prime(&mut world, 2, 3, 0.0);
    world.clock_ms = 500.0;
    world.step_growth_phase();
    assert_eq!(world.grid().get(2, 6).unwrap().growth(), 0.0);
    assert_eq!(world.grid().get(2, 3).unwrap().growth(), 0.0);
    assert_eq!(kind(&world, 2, 3), TileKind::Air);
}

#[test]
fn young_trunk_extends_upward() {
    let mut world = side_world();
    world.tile_mut(3, 5).unwrap().set_kind(TileKind::Trunk);
    prime(&mut world, 3, 5, 0.5);
    world.clock_ms = 500.0;
    world.step_growth_phase();
    assert_eq!(kind(&world, 3, 4), TileKind::Trunk);
    assert_eq!(kind(&world, 2, 4), TileKind::Air);
}

#[test]
fn capped_trunk_grows_leaves() {
    let mut world = side_world();
    world.config.tree.leaf_mirror_chance = 1.0;
    world.tile_mut(3, 5).unwrap().set_kind(TileKind::Trunk);
    prime(&mut world, 3, 5, 1.5);
    world.clock_ms = 500.0;
    world.step_growth_phase();
    assert_eq!(kind(&world, 3, 4), TileKind::Leaf);
    assert_eq!(kind(&world, 2, 4), TileKind::Leaf);
    assert_eq!(kind(&world, 4, 4), TileKind::Leaf);
}

#[test]
fn first_claim_on_a_target_wins() {
    let mut world = side_world();
    let target = world.grid().index(1, 2);
    let parent = Inheritance {
        mood: 0.5,
        water: 0.5,
        nutrients: 0.5,
        light: 1.0,
        visits: 3,
    };
    let intents = vec![
        SpawnIntent {
            target,
            kind: TileKind::Trunk,
            expected: TileKind::Air,
            parent,
        },
        SpawnIntent {
            target,
            kind: TileKind::Leaf,
            expected: TileKind::Air,
            parent,
        },
    ];
    assert_eq!(world.apply_spawn_intents(intents, 10.0), 1);
    assert_eq!(kind(&world, 1, 2), TileKind::Trunk);
}

#[test]
fn stale_intents_are_dropped() {
    let mut world = side_world();
    let target = world.grid().index(1, 8);
    let parent = Inheritance {
        mood: 0.5,
        water: 0.5,
        nutrients: 0.5,
        light: 1.0,
        visits: 3,
    };
    let intents = vec![SpawnIntent {
        target,
        kind: TileKind::Trunk,
        expected: TileKind::Air,
        parent,
    }];
    assert_eq!(world.apply_spawn_intents(intents, 10.0), 0);
    assert_eq!(kind(&world, 1, 8), TileKind::Soil);
}

#[test]
fn growth_waits_for_its_interval() {
    let mut world = World::new(quiet(SoupConfig::compact()));
    prime(&mut world, 4, 4, 0.2);
    world.clock_ms = 150.0;
    world.step_growth_phase();
    assert_eq!(world.grid().get(4, 4).unwrap().growth(), 0.2);

    world.clock_ms = 250.0;
    world.step_growth_phase();
    let tile = world.grid().get(4, 4).unwrap();
    assert!(tile.growth() > 0.2);
    assert_eq!(tile.height(), (tile.growth() * 10.0).floor() as i32);
    assert_eq!(tile.last_update_ms(), 250.0);

    // Not due again until another full interval has passed.
    let grown = tile.growth();
    world.clock_ms = 400.0;
    world.step_growth_phase();
    assert_eq!(world.grid().get(4, 4).unwrap().growth(), grown);
}

#[test]
fn growth_is_limited_by_scarcest_resource() {
    let mut world = World::new(quiet(SoupConfig::compact()));
    prime(&mut world, 2, 2, 0.0);
    prime(&mut world, 5, 5, 0.0);
    world.tile_mut(5, 5).unwrap().set_water(0.35);
    world.clock_ms = 250.0;
    world.step_growth_phase();
    let rich = world.grid().get(2, 2).unwrap().growth();
    let dry = world.grid().get(5, 5).unwrap().growth();
    // Neither tile is under an agent, so the idle decay applies too.
    let decay = world.config.growth.growth_decay;
    assert!((rich - 0.02 * 0.8 * decay).abs() < 1e-6);
    assert!((dry - 0.02 * 0.35 * decay).abs() < 1e-6);
}

#[test]
fn mature_tiles_spread_mood() {
    let mut world = World::new(quiet(SoupConfig::compact()));
    prime(&mut world, 4, 4, 1.0);
    world.clock_ms = 250.0;
    world.step_growth_phase();
    assert!(world.grid().get(5, 4).unwrap().mood() > 0.0);
    assert!(world.grid().get(3, 3).unwrap().mood() > 0.0);
    // Taller tiles push harder sideways than diagonally.
    assert!(world.grid().get(5, 4).unwrap().mood() > world.grid().get(5, 5).unwrap().mood());
}

#[test]
fn only_side_view_canopy_drops_litter() {
    let mut world = side_world();
    let source = world.grid().index(3, 5);
    world.tile_mut(3, 5).unwrap().set_kind(TileKind::Trunk);
    prime(&mut world, 3, 5, 1.8);
    world.tile_mut(3, 6).unwrap().set_nutrients(0.3);

    world.spread_from(source);
    assert_eq!(world.grid().get(3, 6).unwrap().nutrients(), 0.3);

    world.tile_mut(3, 5).unwrap().set_kind(TileKind::Leaf);
    world.spread_from(source);
    let litter = world.config().growth.litter_amount;
    assert!((world.grid().get(3, 6).unwrap().nutrients() - (0.3 + litter)).abs() < 1e-6);
    // Open air never collects litter.
    assert_eq!(world.grid().get(3, 4).unwrap().nutrients(), 0.0);
}

#[test]
fn untouched_tiles_decay() {
    let mut world = World::new(quiet(SoupConfig::compact()));
    {
        let tile = world.tile_mut(1, 1).unwrap();
        tile.set_mood(0.05);
        tile.set_growth(0.5);
    }
    world.clock_ms = 250.0;
    world.step_growth_phase();
    let tile = world.grid().get(1, 1).unwrap();
    assert!(tile.mood() < 0.05);
    assert!(tile.growth() < 0.5);
}

#[test]
fn fire_risk_accrues_holds_and_decays() {
    let mut world = World::new(quiet(SoupConfig::compact()));
    world.config.fire.fire_chance = 0.0;
    {
        let tile = world.tile_mut(2, 2).unwrap();
        tile.set_mood(-0.9);
        tile.set_growth(1.2);
    }
    world.step_fire_phase();
    assert!((world.grid().get(2, 2).unwrap().fire_risk() - 0.01).abs() < 1e-7);

    world.tile_mut(2, 2).unwrap().set_mood(-0.3);
    world.step_fire_phase();
    assert!((world.grid().get(2, 2).unwrap().fire_risk() - 0.01).abs() < 1e-7);

    world.tile_mut(2, 2).unwrap().set_mood(0.4);
    world.step_fire_phase();
    assert!((world.grid().get(2, 2).unwrap().fire_risk() - 0.0099).abs() < 1e-7);
}

#[test]
fn side_view_clearing_restores_base_kinds() {
    let mut world = side_world();
    world.config.fire.spread_chance = 1.0;
    for (x, y, kind) in [
        (3, 5, TileKind::Trunk),
        (3, 4, TileKind::Trunk),
        (3, 6, TileKind::Root),
    ] {
        let tile = world.tile_mut(x, y).unwrap();
        tile.set_kind(kind);
        tile.set_growth(1.5);
    }
    let nutrients_before = world.grid().get(3, 6).unwrap().nutrients();
    assert_eq!(world.ignite(3, 5), 3);
    assert_eq!(kind(&world, 3, 5), TileKind::Air);
    assert_eq!(kind(&world, 3, 4), TileKind::Air);
    assert_eq!(kind(&world, 3, 6), TileKind::Soil);
    assert_eq!(world.grid().get(3, 5).unwrap().nutrients(), 0.0);
    assert!(world.grid().get(3, 6).unwrap().nutrients() > nutrients_before - 1e-6);
    // Side-view heights are structural and survive a clearing.
    assert_eq!(world.grid().get(3, 4).unwrap().height(), 2);
}

#[test]
fn ignite_outside_grid_clears_nothing() {
    let mut world = World::new(quiet(SoupConfig::compact()));
    assert_eq!(world.ignite(8, 0), 0);
}

#[test]
fn set_config_rejects_geometry_changes() {
    let mut world = World::new(SoupConfig::compact());
    let mut tuned = SoupConfig::compact();
    tuned.growth.base_rate = 0.05;
    assert_eq!(world.set_config(tuned), Ok(()));
    assert_eq!(world.config().growth.base_rate, 0.05);

    let resized = SoupConfig {
        width: 9,
        ..SoupConfig::compact()
    };
    assert_eq!(world.set_config(resized), Err(WorldInitError::GeometryChanged));

    let mut invalid = SoupConfig::compact();
    invalid.fire.fire_chance = 2.0;
    assert!(matches!(
        world.set_config(invalid),
        Err(WorldInitError::Config(SimConfigError::InvalidProbability { .. }))
    ));
}

#[test]
fn invalid_config_is_rejected_at_init() {
    let config = SoupConfig {
        height: 0,
        ..SoupConfig::compact()
    };
    assert!(matches!(
        World::try_new(config),
        Err(WorldInitError::Config(SimConfigError::EmptyGrid { .. }))
    ));
}

#[test]
fn reset_rebuilds_world_but_never_reuses_ids() {
    let mut world = World::new(SoupConfig::compact());
    let first_ids: Vec<u32> = world.agents.iter().map(|a| a.id).collect();
    assert_eq!(first_ids, vec![0, 1, 2]);
    world.run(20, 16.0, 10);
    world.reset();
    assert_eq!(world.tick_index(), 0);
    assert_eq!(world.clock_ms(), 0.0);
    assert_eq!(world.query_stats().total_visits, 0);
    let second_ids: Vec<u32> = world.agents.iter().map(|a| a.id).collect();
    assert_eq!(second_ids, vec![3, 4, 5]);
}

#[test]
fn spawning_rejects_positions_outside_grid() {
    let mut world = World::new(quiet(SoupConfig::compact()));
    assert_eq!(world.spawn_agent(-0.5, 2.0), None);
    assert_eq!(world.spawn_agent(2.0, 8.0), None);
    assert_eq!(world.spawn_agent(f64::NAN, 1.0), None);
    assert_eq!(world.spawn_agent(7.9, 7.9), Some(0));
    assert_eq!(world.spawn_random_agent(), Some(1));
    assert_eq!(world.agents.len(), 2);
}

#[test]
fn side_view_refuses_spawns_inside_ground() {
    let mut world = side_world();
    assert_eq!(world.spawn_agent_with(3.5, 8.5, Emotion::Joy), None);
    world.tile_mut(2, 4).unwrap().set_kind(TileKind::Trunk);
    assert_eq!(world.spawn_agent_with(2.5, 4.5, Emotion::Joy), Some(0));
    assert_eq!(world.spawn_agent_with(5.5, 2.5, Emotion::Sorrow), Some(1));
    for _ in 0..50 {
        let id = world.spawn_random_agent().unwrap();
        let agent = world.agents.iter().find(|a| a.id == id).unwrap();
        assert!(agent.position[1] < 6.0);
    }
}

#[test]
fn spawned_side_view_agents_fall_and_keep_moving() {
    let mut world = side_world();
    world.config.kinematics.jump_chance = 0.0;
    world.config.influence.seed_chance = 0.0;
    world.spawn_agent_with(4.5, 1.5, Emotion::Joy).unwrap();
    world.agents[0].velocity = [0.5, 0.0];
    for _ in 0..200 {
        world.tick(16.0);
    }
    let agent = &world.agents[0];
    assert!(agent.grounded);
    assert!(agent.position[1] < 6.0);
    assert_ne!(agent.position, [4.5, 1.5]);
}

#[test]
fn next_agent_id_stops_at_u32_max() {
    let mut world = World::new(quiet(SoupConfig::compact()));
    world.next_agent_id = u32::MAX;
    assert_eq!(world.spawn_agent_with(1.0, 1.0, Emotion::Joy), None);
    assert!(world.agents.is_empty());
}

#[test]
fn query_tile_counts_nearby_agents() {
    let mut world = World::new(quiet(SoupConfig::compact()));
    world.spawn_agent_with(1.5, 1.5, Emotion::Joy);
    world.spawn_agent_with(2.5, 1.5, Emotion::Sorrow);
    world.spawn_agent_with(7.5, 7.5, Emotion::Joy);
    let snapshot = world.query_tile(1, 1).unwrap();
    assert_eq!(snapshot.nearby_agents, 2);
    assert!(world.query_tile(8, 8).is_none());
    assert_eq!(world.agents_near(7.5, 7.5, 0.5), vec![2]);
}

#[test]
fn try_run_validates_arguments() {
    let mut world = World::new(SoupConfig::compact());
    assert_eq!(
        world.try_run(10, 16.0, 0).unwrap_err(),
        ExperimentError::InvalidSampleEvery
    );
    assert_eq!(
        world.try_run(10, f64::NAN, 1).unwrap_err(),
        ExperimentError::InvalidTimestep
    );
    assert!(matches!(
        world.try_run(World::MAX_EXPERIMENT_TICKS + 1, 16.0, 1),
        Err(ExperimentError::TooManyTicks { .. })
    ));
    let summary = world.try_run(25, 16.0, 10).unwrap();
    assert_eq!(summary.schema_version, 1);
    let sampled: Vec<u64> = summary.samples.iter().map(|s| s.tick).collect();
    assert_eq!(sampled, vec![10, 20, 25]);
    assert_eq!(summary.final_agent_count, 3);
}

#[test]
fn step_metrics_count_kinds_and_emotions() {
    let mut world = side_world();
    world.spawn_agent_with(1.5, 1.5, Emotion::Joy);
    world.spawn_agent_with(2.5, 1.5, Emotion::Sorrow);
    world.spawn_agent_with(3.5, 1.5, Emotion::Sorrow);
    world.tile_mut(3, 5).unwrap().set_kind(TileKind::Trunk);
    let metrics = world.collect_step_metrics();
    assert_eq!(metrics.joy_agents, 1);
    assert_eq!(metrics.sorrow_agents, 2);
    assert_eq!(metrics.kind_count(TileKind::Trunk), 1);
    assert_eq!(metrics.kind_count(TileKind::Air), 8 * 6 - 1);
    assert_eq!(metrics.kind_count(TileKind::Soil), 8 * 4);
}
