//! Physics scenarios run end to end against the public `World` API.

use std::time::Duration;

use tetrafall::physics::line_clear::ScanParams;
use tetrafall::physics::{
    BodyDef, BodyId, BodyKind, ManualClock, Material, OwnerKey, PhysicsError, ShapeInfo,
    SurfaceMaterial, Tetromino, Units, Vec2, World, WorldConfig,
};

const EPSILON: f32 = 1e-3;
const FRAME: Duration = Duration::from_millis(16);

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn make_world() -> (World, ManualClock) {
    let clock = ManualClock::new();
    let world = World::with_clock(WorldConfig::default(), clock.clone());
    (world, clock)
}

fn step_frames(world: &mut World, clock: &ManualClock, frames: usize) {
    for _ in 0..frames {
        clock.advance(FRAME);
        world.step().unwrap();
    }
}

/// Static, owned 32x32 boxes centred on `y` at each x.
fn place_row(world: &mut World, y: f32, xs: &[f32]) -> Vec<BodyId> {
    xs.iter()
        .enumerate()
        .map(|(i, &x)| {
            let def = BodyDef::new(BodyKind::Static, x, y).with_owner(OwnerKey(i as u64 + 1));
            let id = world.create_body(&def).unwrap();
            world
                .attach_box(id, 32.0, 32.0, &Material::default(), false)
                .unwrap();
            id
        })
        .collect()
}

/// Drop an O piece from `y` and step until it reports a collision.
fn drop_piece_until_collided(world: &mut World, clock: &ManualClock, y: f32) -> Option<BodyId> {
    let piece = world.create_body(&BodyDef::dynamic(100.0, y)).unwrap();
    world.attach_tetromino(piece, Tetromino::O, 32.0, 1.0).unwrap();
    for _ in 0..200 {
        step_frames(world, clock, 1);
        if world.has_collided(piece).unwrap() {
            return Some(piece);
        }
    }
    None
}

/// Three O pieces dropped side by side onto a ground box whose top is at
/// y=10, stepped until every piece sleeps. Their bottom rows rest on y=26.
fn settled_o_row(world: &mut World, clock: &ManualClock) -> Vec<BodyId> {
    let ground = world.create_body(&BodyDef::fixed(100.0, 0.0)).unwrap();
    world
        .attach_box(ground, 400.0, 20.0, &Material::default(), false)
        .unwrap();

    let pieces: Vec<BodyId> = [32.0, 100.0, 168.0]
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let def = BodyDef::dynamic(x, 43.0).with_owner(OwnerKey(i as u64 + 1));
            let id = world.create_body(&def).unwrap();
            world.attach_tetromino(id, Tetromino::O, 32.0, 1.0).unwrap();
            id
        })
        .collect();

    for _ in 0..1200 {
        step_frames(world, clock, 1);
        if pieces.iter().all(|&id| !world.is_awake(id).unwrap()) {
            break;
        }
    }
    for &id in &pieces {
        assert!(!world.is_awake(id).unwrap(), "piece {id:?} never came to rest");
    }
    pieces
}

// ==================== UNIT CONVERSION TESTS ====================

#[test]
fn display_sim_round_trip() {
    let units = Units::default();
    for v in [-1000.0_f32, -31.5, 0.0, 0.25, 32.0, 640.0, 12345.678] {
        assert!((units.to_display(units.to_sim(v)) - v).abs() <= v.abs() * 1e-6 + 1e-6);
    }
}

#[test]
fn custom_scale_is_used_by_the_world() {
    let world = World::new(WorldConfig::default().with_scale(64.0));
    assert!(approx_eq(world.units().pixels_per_meter(), 64.0));
    assert!(approx_eq(world.units().to_sim(64.0), 1.0));
}

// ==================== SHAPE FACTORY TESTS ====================

#[test]
fn every_tetromino_has_four_blocks_on_its_template() {
    let (mut world, _) = make_world();
    for piece in Tetromino::ALL {
        let id = world.create_body(&BodyDef::dynamic(0.0, 0.0)).unwrap();
        let shapes = world.attach_tetromino(id, piece, 32.0, 1.0).unwrap();
        assert_eq!(shapes.len(), 4, "{piece} should attach four shapes");
        assert_eq!(world.shape_count(id).unwrap(), 4);

        let info = world.shapes_info(id).unwrap();
        for (shape, (tx, ty)) in info.iter().zip(piece.template()) {
            match *shape {
                ShapeInfo::Polygon { x, y, w, h } => {
                    assert!(approx_eq(x, tx * 32.0), "{piece}: x {x} vs {}", tx * 32.0);
                    assert!(approx_eq(y, ty * 32.0), "{piece}: y {y} vs {}", ty * 32.0);
                    assert!(approx_eq(w, 32.0));
                    assert!(approx_eq(h, 32.0));
                }
                ShapeInfo::Segment { .. } => panic!("{piece} produced a segment"),
            }
        }
    }
}

#[test]
fn mass_is_available_before_the_first_step() {
    let (mut world, _) = make_world();
    let id = world.create_body(&BodyDef::dynamic(0.0, 0.0)).unwrap();
    world.attach_tetromino(id, Tetromino::O, 32.0, 1.0).unwrap();
    // Four 1 m x 1 m blocks at density 1.
    assert!(approx_eq(world.mass(id).unwrap(), 4.0));
}

#[test]
fn chain_needs_two_points() {
    let (mut world, _) = make_world();
    let id = world.create_body(&BodyDef::fixed(0.0, 0.0)).unwrap();
    let none = world
        .attach_chain(id, &[Vec2::new(0.0, 0.0)], false, Default::default())
        .unwrap();
    assert!(none.is_none());

    let points = [Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0), Vec2::new(100.0, 50.0)];
    assert!(world.attach_chain(id, &points, false, Default::default()).unwrap().is_some());
    assert_eq!(world.shapes_info(id).unwrap().len(), 2);
}

// ==================== STEPPER TESTS ====================

#[test]
fn step_clamps_long_pauses() {
    let (mut world, clock) = make_world();
    world.step().unwrap();
    clock.advance(Duration::from_millis(500));
    let report = world.step().unwrap();
    assert!(report.dt <= 0.032 + 1e-6, "advanced by {}", report.dt);
    assert!(report.dt > 0.0);
}

#[test]
fn step_within_the_same_tick_does_not_advance() {
    let (mut world, _) = make_world();
    let first = world.step().unwrap();
    assert!(approx_eq(first.dt, 0.032));
    let second = world.step().unwrap();
    assert_eq!(second.dt, 0.0);
    assert_eq!(world.step_count(), 2);
}

#[test]
fn unsupported_box_falls_and_stays_awake() {
    let (mut world, clock) = make_world();
    let id = world.create_body(&BodyDef::dynamic(100.0, 500.0)).unwrap();
    world
        .attach_box(id, 32.0, 32.0, &Material::default(), false)
        .unwrap();

    let mut last_y = world.position(id).unwrap().y;
    for _ in 0..30 {
        step_frames(&mut world, &clock, 1);
        let y = world.position(id).unwrap().y;
        assert!(y < last_y, "expected {y} < {last_y}");
        last_y = y;
    }
    assert!(world.is_awake(id).unwrap());
    assert!(world.linear_velocity(id).unwrap().y < 0.0);
}

#[test]
fn force_lasts_a_single_step() {
    let config = WorldConfig::default().with_gravity(0.0, 0.0);
    let clock = ManualClock::new();
    let mut world = World::with_clock(config, clock.clone());
    let id = world.create_body(&BodyDef::dynamic(0.0, 0.0)).unwrap();
    world
        .attach_box(id, 32.0, 32.0, &Material::default(), false)
        .unwrap();

    world.apply_force_center(id, 320.0, 0.0).unwrap();
    step_frames(&mut world, &clock, 1);
    let after_push = world.linear_velocity(id).unwrap().x;
    assert!(after_push > 0.0);

    step_frames(&mut world, &clock, 1);
    let coasting = world.linear_velocity(id).unwrap().x;
    assert!(coasting <= after_push + EPSILON, "force was applied twice");
}

// ==================== LINE-CLEAR TESTS ====================

#[test]
fn full_row_is_cleared_and_reported() {
    let (mut world, _) = make_world();
    let xs = [0.0, 32.0, 64.0, 96.0, 128.0, 160.0];
    let ids = place_row(&mut world, 100.0, &xs);

    let report = world
        .scan_line(Vec2::new(-50.0, 100.0), Vec2::new(250.0, 100.0), &ScanParams::default())
        .unwrap();

    assert!(report.was_cleared());
    assert_eq!(report.cleared_points.len(), 6);
    assert_eq!(report.bodies_to_split.len(), 6);
    for point in &report.cleared_points {
        assert!(approx_eq(point.y, 100.0));
    }
    for id in &ids {
        assert!(report.bodies_to_split.iter().any(|split| split.body == *id));
        assert!(world.shapes_info(*id).unwrap().is_empty());
    }
    let owners: Vec<u64> = report.bodies_to_split.iter().map(|s| s.owner.0).collect();
    let mut sorted = owners.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), owners.len(), "bodies must be reported once");
}

#[test]
fn five_blocks_do_not_make_a_line() {
    let (mut world, _) = make_world();
    let ids = place_row(&mut world, 100.0, &[0.0, 32.0, 64.0, 96.0, 128.0]);

    let report = world
        .scan_line(Vec2::new(-50.0, 100.0), Vec2::new(250.0, 100.0), &ScanParams::default())
        .unwrap();

    assert!(!report.was_cleared());
    assert!(report.bodies_to_split.is_empty());
    assert!(report.cleared_points.is_empty());
    for id in ids {
        assert_eq!(world.shape_count(id).unwrap(), 1);
    }
}

#[test]
fn only_the_largest_group_is_cleared() {
    let (mut world, _) = make_world();
    let left = place_row(&mut world, 100.0, &[0.0, 32.0, 64.0]);
    let right = place_row(&mut world, 100.0, &[200.0, 232.0, 264.0, 296.0]);

    let params = ScanParams::default().with_min_hits(4);
    let report = world
        .scan_line(Vec2::new(-50.0, 100.0), Vec2::new(400.0, 100.0), &params)
        .unwrap();

    assert_eq!(report.cleared_points.len(), 4);
    assert_eq!(report.all_hits.len(), 7);
    for id in left {
        assert_eq!(world.shape_count(id).unwrap(), 1);
    }
    for id in right {
        assert_eq!(world.shape_count(id).unwrap(), 0);
    }
}

#[test]
fn moving_blocks_are_ignored() {
    let (mut world, _) = make_world();
    place_row(&mut world, 100.0, &[0.0, 32.0, 64.0, 96.0, 128.0]);
    let moving = world
        .create_body(&BodyDef::dynamic(160.0, 100.0).with_velocity(64.0, 0.0))
        .unwrap();
    world
        .attach_box(moving, 32.0, 32.0, &Material::default(), false)
        .unwrap();

    let report = world
        .scan_line(Vec2::new(-50.0, 100.0), Vec2::new(250.0, 100.0), &ScanParams::default())
        .unwrap();

    assert!(!report.was_cleared());
    assert_eq!(report.all_hits.len(), 5);
}

#[test]
fn settled_pieces_lose_their_bottom_row() {
    let (mut world, clock) = make_world();
    let pieces = settled_o_row(&mut world, &clock);
    for &id in &pieces {
        assert!(approx_eq(world.mass(id).unwrap(), 4.0));
    }

    let report = world
        .scan_line(Vec2::new(-50.0, 26.0), Vec2::new(260.0, 26.0), &ScanParams::default())
        .unwrap();

    assert!(report.was_cleared());
    assert_eq!(report.all_hits.len(), 6);
    assert_eq!(report.cleared_points.len(), 6);
    for point in &report.cleared_points {
        assert!((point.y - 26.0).abs() < 1.0, "cleared block at y = {}", point.y);
    }

    assert_eq!(report.bodies_to_split.len(), 3);
    for (i, &id) in pieces.iter().enumerate() {
        let split = report
            .bodies_to_split
            .iter()
            .find(|split| split.body == id)
            .expect("piece missing from the split list");
        assert_eq!(split.owner, OwnerKey(i as u64 + 1));
        assert_eq!(world.shape_count(id).unwrap(), 2);
        assert!(approx_eq(world.mass(id).unwrap(), 2.0));
    }
}

#[test]
fn a_piece_knocked_loose_keeps_the_row_intact() {
    let (mut world, clock) = make_world();
    let pieces = settled_o_row(&mut world, &clock);
    world.apply_impulse_center(pieces[1], 0.0, 400.0).unwrap();
    assert!(world.linear_velocity(pieces[1]).unwrap().y > 0.0);

    let report = world
        .scan_line(Vec2::new(-50.0, 26.0), Vec2::new(260.0, 26.0), &ScanParams::default())
        .unwrap();

    assert!(!report.was_cleared());
    assert_eq!(report.all_hits.len(), 4);
    assert!(report.bodies_to_split.is_empty());
    for &id in &pieces {
        assert_eq!(world.shape_count(id).unwrap(), 4);
    }
}

#[test]
fn sensors_and_terrain_on_the_row_are_not_counted() {
    let (mut world, _) = make_world();
    place_row(&mut world, 100.0, &[0.0, 32.0, 64.0, 96.0, 128.0]);
    let sensor = world.create_body(&BodyDef::fixed(160.0, 100.0)).unwrap();
    world.attach_sensor_box(sensor, 32.0, 32.0).unwrap();
    let wall = world.create_body(&BodyDef::fixed(0.0, 0.0)).unwrap();
    world
        .attach_chain(
            wall,
            &[Vec2::new(200.0, 50.0), Vec2::new(200.0, 150.0)],
            false,
            SurfaceMaterial::default(),
        )
        .unwrap();

    let report = world
        .scan_line(Vec2::new(-50.0, 100.0), Vec2::new(250.0, 100.0), &ScanParams::default())
        .unwrap();

    assert!(!report.was_cleared());
    assert_eq!(report.all_hits.len(), 5);
    assert_eq!(world.shape_count(sensor).unwrap(), 1);
}

#[test]
fn row_placed_after_stepping_is_seen() {
    let (mut world, clock) = make_world();
    step_frames(&mut world, &clock, 5);
    place_row(&mut world, 100.0, &[0.0, 32.0, 64.0, 96.0, 128.0, 160.0]);

    let report = world
        .scan_line(Vec2::new(-50.0, 100.0), Vec2::new(250.0, 100.0), &ScanParams::default())
        .unwrap();

    assert_eq!(report.cleared_points.len(), 6);
}

#[test]
fn unowned_bodies_are_cleared_but_not_reported() {
    let (mut world, _) = make_world();
    let ids: Vec<BodyId> = [0.0, 32.0, 64.0, 96.0, 128.0, 160.0]
        .iter()
        .map(|&x| {
            let id = world.create_body(&BodyDef::fixed(x, 100.0)).unwrap();
            world
                .attach_box(id, 32.0, 32.0, &Material::default(), false)
                .unwrap();
            id
        })
        .collect();

    let report = world
        .scan_line(Vec2::new(-50.0, 100.0), Vec2::new(250.0, 100.0), &ScanParams::default())
        .unwrap();

    assert_eq!(report.cleared_points.len(), 6);
    assert!(report.bodies_to_split.is_empty());
    assert_eq!(world.shape_count(ids[0]).unwrap(), 0);
}

// ==================== COLLISION FLAG TESTS ====================

#[test]
fn landing_on_a_ground_box_flags_both_bodies() {
    let (mut world, clock) = make_world();
    let ground = world.create_body(&BodyDef::fixed(100.0, 0.0)).unwrap();
    world
        .attach_box(ground, 400.0, 20.0, &Material::default(), false)
        .unwrap();
    assert!(!world.has_collided(ground).unwrap());

    let piece = drop_piece_until_collided(&mut world, &clock, 150.0).expect("piece never landed");

    assert!(world.has_collided(piece).unwrap());
    assert!(world.has_collided(ground).unwrap());

    world.clear_collision_flags();
    assert!(!world.has_collided(piece).unwrap());
    assert!(!world.has_collided(ground).unwrap());
}

#[test]
fn landing_on_a_chain_flags_both_bodies() {
    let (mut world, clock) = make_world();
    let terrain = world.create_body(&BodyDef::fixed(0.0, 0.0)).unwrap();
    world
        .attach_chain(
            terrain,
            &[Vec2::new(-200.0, 10.0), Vec2::new(400.0, 10.0)],
            false,
            SurfaceMaterial::default(),
        )
        .unwrap();

    let piece = drop_piece_until_collided(&mut world, &clock, 150.0).expect("piece never landed");

    assert!(world.has_collided(piece).unwrap());
    assert!(world.has_collided(terrain).unwrap());

    world.reset_collided(piece).unwrap();
    assert!(!world.has_collided(piece).unwrap());
    assert!(world.has_collided(terrain).unwrap());
    world.reset_collided(terrain).unwrap();
    assert!(!world.has_collided(terrain).unwrap());
}

#[test]
fn free_fall_does_not_flag_a_collision() {
    let (mut world, clock) = make_world();
    let piece = world.create_body(&BodyDef::dynamic(100.0, 500.0)).unwrap();
    world.attach_tetromino(piece, Tetromino::T, 32.0, 1.0).unwrap();
    step_frames(&mut world, &clock, 30);
    assert!(!world.has_collided(piece).unwrap());
}

// ==================== SENSOR TESTS ====================

#[test]
fn sensor_count_returns_to_zero_after_a_block_passes() {
    let (mut world, clock) = make_world();
    let sensor = world.create_body(&BodyDef::fixed(100.0, 100.0)).unwrap();
    world.attach_sensor_box(sensor, 200.0, 20.0).unwrap();

    let block = world.create_body(&BodyDef::dynamic(100.0, 160.0)).unwrap();
    world.attach_tetromino(block, Tetromino::O, 32.0, 1.0).unwrap();

    let mut begins = 0;
    let mut ends = 0;
    for _ in 0..150 {
        clock.advance(FRAME);
        let report = world.step().unwrap();
        begins += report.sensor_begins;
        ends += report.sensor_ends;
        assert!(world.sensor_contact_count(sensor).unwrap() <= 4);
    }

    assert!(world.position(block).unwrap().y < 0.0);
    assert!(begins > 0, "block never touched the sensor");
    assert_eq!(begins, ends);
    assert_eq!(world.sensor_contact_count(sensor).unwrap(), 0);
}

// ==================== HANDLE LIFECYCLE TESTS ====================

#[test]
fn destroyed_body_handles_are_rejected() {
    let (mut world, _) = make_world();
    let id = world.create_body(&BodyDef::dynamic(0.0, 0.0)).unwrap();
    assert!(world.destroy_body(id));
    assert!(!world.destroy_body(id));
    assert_eq!(world.position(id), Err(PhysicsError::InvalidBody(id)));
    assert_eq!(world.body_count(), 0);
}

#[test]
fn destroyed_world_rejects_everything() {
    let (mut world, _) = make_world();
    let id = world.create_body(&BodyDef::dynamic(0.0, 0.0)).unwrap();
    world.destroy();
    world.destroy();
    assert!(world.is_destroyed());
    assert!(!world.destroy_body(id));
    assert_eq!(
        world.create_body(&BodyDef::dynamic(0.0, 0.0)),
        Err(PhysicsError::WorldDestroyed)
    );
    assert_eq!(world.step().map(|_| ()), Err(PhysicsError::WorldDestroyed));
}

#[test]
fn unknown_kind_is_an_error() {
    let err = "floating".parse::<BodyKind>().unwrap_err();
    assert_eq!(err, PhysicsError::UnknownBodyKind("floating".into()));
}
