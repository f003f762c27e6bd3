//! Game tick integration tests for spawning, control, line clears and culling.

use bevy_ecs::prelude::*;
use bevy_ecs::system::RunSystemOnce;

use tetrafall::components::block::{ActiveBlock, Block, BlockColor, Terrain};
use tetrafall::events::lineclear::LineClearedMessage;
use tetrafall::game;
use tetrafall::physics::{BodyDef, Material, Tetromino};
use tetrafall::resources::controlinput::ControlInput;
use tetrafall::resources::gameconfig::GameConfig;
use tetrafall::resources::gamestats::GameStats;
use tetrafall::resources::level::{CurrentLevel, LevelData, LevelSet, ScanArea};
use tetrafall::resources::physicsworld::PhysicsWorld;
use tetrafall::resources::worldtime::FRAME_DT;
use tetrafall::systems::control::active_block_control;
use tetrafall::systems::cull::cull_fallen_blocks;
use tetrafall::systems::lineclear::line_clear_scan;
use tetrafall::systems::score::score_line_clears;
use tetrafall::systems::time::update_world_time;

const EPSILON: f32 = 1e-2;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn builtin_level(index: usize) -> CurrentLevel {
    CurrentLevel::select(&LevelSet::builtin(), index).unwrap()
}

fn seeded_config() -> GameConfig {
    let mut config = GameConfig::new();
    config.seed = 7;
    config
}

fn make_world(config: GameConfig, level: CurrentLevel) -> World {
    let mut world = World::new();
    game::start_level(&mut world, config, level);
    world
}

/// Bare level: no terrain, one scan row at y=100 across x in [-50, 250].
fn flat_test_level(line_min_blocks: usize) -> CurrentLevel {
    CurrentLevel {
        index: 0,
        data: LevelData {
            name: "Test Row".into(),
            target_score: 1,
            line_min_blocks,
            ground_box: false,
            terrain_points: Vec::new(),
            scan_area: ScanArea {
                x: -50.0,
                y: 84.0,
                w: 300.0,
                h: 32.0,
            },
        },
    }
}

/// Spawn resting single-box pieces on the row y=100.
fn spawn_row(world: &mut World, xs: &[f32]) -> Vec<Entity> {
    xs.iter()
        .map(|&x| {
            let entity = world.spawn_empty().id();
            let body = {
                let mut physics = world.resource_mut::<PhysicsWorld>();
                let def = BodyDef::fixed(x, 100.0).with_owner(Block::owner_key(entity));
                let body = physics.create_body(&def).unwrap();
                physics
                    .attach_box(body, 32.0, 32.0, &Material::default(), false)
                    .unwrap();
                body
            };
            world.entity_mut(entity).insert(Block {
                body,
                kind: Tetromino::O,
                color: BlockColor::Blue,
            });
            entity
        })
        .collect()
}

fn run_once<M>(world: &mut World, system: impl IntoSystem<(), (), M>) {
    world.run_system_once(system).unwrap();
}

fn count<F: bevy_ecs::query::QueryFilter>(world: &mut World) -> usize {
    world.query_filtered::<Entity, F>().iter(world).count()
}

// ==================== SETUP TESTS ====================

#[test]
fn setup_builds_terrain_and_ground_box() {
    let mut world = make_world(seeded_config(), builtin_level(0));
    assert_eq!(count::<With<Terrain>>(&mut world), 2);
    assert_eq!(world.resource::<PhysicsWorld>().body_count(), 2);
}

#[test]
fn second_level_has_no_ground_box() {
    let mut world = make_world(seeded_config(), builtin_level(1));
    assert_eq!(count::<With<Terrain>>(&mut world), 1);
}

// ==================== SPAWN TESTS ====================

#[test]
fn pieces_spawn_on_interval_and_take_control() {
    let mut world = make_world(seeded_config(), builtin_level(0));
    let mut schedule = game::build_schedule();

    for _ in 0..59 {
        game::run_frame(&mut world, &mut schedule, FRAME_DT);
    }
    assert_eq!(count::<With<Block>>(&mut world), 0);

    game::run_frame(&mut world, &mut schedule, FRAME_DT);
    assert_eq!(count::<With<Block>>(&mut world), 1);
    assert_eq!(count::<With<ActiveBlock>>(&mut world), 1);

    for _ in 0..60 {
        game::run_frame(&mut world, &mut schedule, FRAME_DT);
    }
    assert_eq!(count::<With<Block>>(&mut world), 2);
    assert_eq!(count::<With<ActiveBlock>>(&mut world), 1);
    assert_eq!(world.resource::<GameStats>().blocks_spawned, 2);
}

#[test]
fn spawned_piece_starts_near_the_top_centre() {
    let mut world = make_world(seeded_config(), builtin_level(0));
    let mut schedule = game::build_schedule();
    for _ in 0..60 {
        game::run_frame(&mut world, &mut schedule, FRAME_DT);
    }

    let block = *world.query::<&Block>().iter(&world).next().unwrap();
    let physics = world.resource::<PhysicsWorld>();
    let pos = physics.position(block.body).unwrap();
    assert!((pos.x - 640.0).abs() <= 51.0, "x = {}", pos.x);
    assert!((pos.y - 620.0).abs() < 5.0, "y = {}", pos.y);
    assert_eq!(physics.shape_count(block.body).unwrap(), 4);
}

#[test]
fn same_seed_spawns_the_same_pieces() {
    let kinds = |seed: u64| {
        let mut config = GameConfig::new();
        config.seed = seed;
        config.spawn_interval = 1;
        let mut world = make_world(config, builtin_level(0));
        let mut schedule = game::build_schedule();
        for _ in 0..5 {
            game::run_frame(&mut world, &mut schedule, FRAME_DT);
        }
        let mut pieces: Vec<(u64, char)> = world
            .query::<(Entity, &Block)>()
            .iter(&world)
            .map(|(e, b)| (e.to_bits(), b.kind.letter()))
            .collect();
        pieces.sort();
        pieces.into_iter().map(|(_, k)| k).collect::<String>()
    };
    assert_eq!(kinds(42), kinds(42));
}

// ==================== CONTROL TESTS ====================

#[test]
fn control_steers_the_active_piece() {
    let mut world = make_world(seeded_config(), builtin_level(0));
    let entity = world.spawn_empty().id();
    let body = {
        let mut physics = world.resource_mut::<PhysicsWorld>();
        let body = physics.create_body(&BodyDef::dynamic(640.0, 600.0)).unwrap();
        physics.attach_tetromino(body, Tetromino::T, 32.0, 1.0).unwrap();
        body
    };
    world.entity_mut(entity).insert((
        Block {
            body,
            kind: Tetromino::T,
            color: BlockColor::Violet,
        },
        ActiveBlock,
    ));
    world.resource_mut::<ControlInput>().horizontal = 1.0;

    run_once(&mut world, active_block_control);

    let v = world.resource::<PhysicsWorld>().linear_velocity(body).unwrap();
    // 10 m/s and -2.4 m/s at 32 px/m.
    assert!(approx_eq(v.x, 320.0), "vx = {}", v.x);
    assert!(approx_eq(v.y, -76.8), "vy = {}", v.y);
}

#[test]
fn release_drops_control() {
    let mut world = make_world(seeded_config(), builtin_level(0));
    let mut schedule = game::build_schedule();
    for _ in 0..60 {
        game::run_frame(&mut world, &mut schedule, FRAME_DT);
    }
    assert_eq!(count::<With<ActiveBlock>>(&mut world), 1);

    world.resource_mut::<ControlInput>().release = true;
    run_once(&mut world, active_block_control);

    assert_eq!(count::<With<ActiveBlock>>(&mut world), 0);
    assert_eq!(count::<With<Block>>(&mut world), 1);
    assert!(!world.resource::<ControlInput>().release);
}

// ==================== LINE CLEAR TESTS ====================

#[test]
fn full_row_writes_a_message_and_scores() {
    let mut config = seeded_config();
    config.scan_interval = 1;
    let mut world = make_world(config, flat_test_level(6));
    let row = spawn_row(&mut world, &[0.0, 32.0, 64.0, 96.0, 128.0, 160.0]);

    update_world_time(&mut world, FRAME_DT);
    run_once(&mut world, line_clear_scan);
    run_once(&mut world, score_line_clears);

    let messages = world.resource::<Messages<LineClearedMessage>>();
    let mut cursor = messages.get_cursor();
    let written: Vec<&LineClearedMessage> = cursor.read(messages).collect();
    assert_eq!(written.len(), 1);
    assert!(approx_eq(written[0].y, 100.0));
    assert_eq!(written[0].blocks, 6);
    assert_eq!(written[0].pieces.len(), 6);

    let stats = world.resource::<GameStats>();
    assert_eq!(stats.score, 1);
    assert_eq!(stats.lines_cleared, 1);
    assert!(stats.level_complete);

    for entity in row {
        assert!(world.get_entity(entity).is_err(), "emptied piece should be despawned");
    }
    assert_eq!(world.resource::<PhysicsWorld>().body_count(), 1);
}

#[test]
fn short_row_is_left_alone() {
    let mut config = seeded_config();
    config.scan_interval = 1;
    let mut world = make_world(config, flat_test_level(6));
    spawn_row(&mut world, &[0.0, 32.0, 64.0, 96.0, 128.0]);

    update_world_time(&mut world, FRAME_DT);
    run_once(&mut world, line_clear_scan);
    run_once(&mut world, score_line_clears);

    assert!(world.resource::<Messages<LineClearedMessage>>().is_empty());
    assert_eq!(world.resource::<GameStats>().score, 0);
    assert_eq!(count::<With<Block>>(&mut world), 5);
}

#[test]
fn scan_waits_for_its_interval() {
    let mut config = seeded_config();
    config.scan_interval = 30;
    let mut world = make_world(config, flat_test_level(6));
    spawn_row(&mut world, &[0.0, 32.0, 64.0, 96.0, 128.0, 160.0]);

    update_world_time(&mut world, FRAME_DT);
    run_once(&mut world, line_clear_scan);
    assert_eq!(count::<With<Block>>(&mut world), 6);
}

// ==================== CULL TESTS ====================

#[test]
fn fallen_pieces_are_culled() {
    let mut world = make_world(seeded_config(), flat_test_level(6));
    let entity = world.spawn_empty().id();
    let body = {
        let mut physics = world.resource_mut::<PhysicsWorld>();
        let body = physics.create_body(&BodyDef::dynamic(100.0, -150.0)).unwrap();
        physics.attach_tetromino(body, Tetromino::I, 32.0, 1.0).unwrap();
        body
    };
    world.entity_mut(entity).insert(Block {
        body,
        kind: Tetromino::I,
        color: BlockColor::Red,
    });
    let kept = spawn_row(&mut world, &[0.0]);

    run_once(&mut world, cull_fallen_blocks);

    assert!(world.get_entity(entity).is_err());
    assert!(world.get_entity(kept[0]).is_ok());
    assert!(!world.resource::<PhysicsWorld>().contains(body));
    assert_eq!(world.resource::<GameStats>().blocks_culled, 1);
}

// ==================== FULL LOOP TESTS ====================

#[test]
fn long_run_keeps_state_consistent() {
    let mut world = make_world(seeded_config(), builtin_level(0));
    let mut schedule = game::build_schedule();
    for _ in 0..600 {
        game::run_frame(&mut world, &mut schedule, FRAME_DT);
    }

    let stats = world.resource::<GameStats>().clone();
    assert_eq!(stats.blocks_spawned, 10);
    assert!(count::<With<ActiveBlock>>(&mut world) <= 1);

    let blocks: Vec<Block> = world.query::<&Block>().iter(&world).copied().collect();
    let physics = world.resource::<PhysicsWorld>();
    for block in &blocks {
        assert!(physics.contains(block.body));
        assert!(physics.position(block.body).unwrap().y >= -100.0);
    }
    // Terrain bodies plus one body per live piece.
    assert_eq!(physics.body_count(), 2 + blocks.len());
    assert_eq!(physics.step_count(), 600);
}
