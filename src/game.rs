//! Headless game setup and frame schedule.
//!
//! [`insert_resources`] populates an ECS world for one level, the [`setup`]
//! system builds the level geometry, and [`build_schedule`] returns the
//! per-frame systems in the order they must run. [`run_frame`] advances
//! everything by one fixed frame.

use bevy_ecs::message::Messages;
use bevy_ecs::prelude::*;
use log::{error, info};

use crate::components::block::Terrain;
use crate::events::lineclear::LineClearedMessage;
use crate::physics::{BodyDef, BodyId, Material, PhysicsResult, SurfaceMaterial};
use crate::resources::controlinput::ControlInput;
use crate::resources::gameconfig::GameConfig;
use crate::resources::gamestats::GameStats;
use crate::resources::level::CurrentLevel;
use crate::resources::physicsworld::PhysicsWorld;
use crate::resources::spawnrng::SpawnRng;
use crate::resources::worldtime::WorldTime;
use crate::systems::control::active_block_control;
use crate::systems::cull::cull_fallen_blocks;
use crate::systems::lineclear::line_clear_scan;
use crate::systems::physics::{clear_collision_flags, physics_step};
use crate::systems::score::{score_line_clears, update_line_cleared_messages};
use crate::systems::spawn::spawn_tetromino;
use crate::systems::time::update_world_time;

/// Height of the optional flat floor's centre, in pixels.
pub const GROUND_BOX_Y: f32 = 50.0;
pub const GROUND_BOX_HEIGHT: f32 = 10.0;

/// Insert every resource the game systems read.
pub fn insert_resources(world: &mut World, config: GameConfig, level: CurrentLevel) {
    world.insert_resource(PhysicsWorld::new(config.physics_config()));
    world.insert_resource(SpawnRng::new(config.seed));
    world.insert_resource(WorldTime::default().with_time_scale(1.0));
    world.insert_resource(GameStats::default());
    world.insert_resource(ControlInput::default());
    world.init_resource::<Messages<LineClearedMessage>>();
    world.insert_resource(level);
    world.insert_resource(config);
}

/// Build the static terrain for the current level.
pub fn setup(
    mut commands: Commands,
    mut physics: ResMut<PhysicsWorld>,
    level: Res<CurrentLevel>,
    config: Res<GameConfig>,
) {
    match build_terrain(&mut physics, &level, &config) {
        Ok(bodies) => {
            for body in bodies {
                commands.spawn(Terrain { body });
            }
            info!("Level {} '{}' ready", level.index, level.data.name);
        }
        Err(e) => error!("Failed to build level '{}': {}", level.data.name, e),
    }
}

fn build_terrain(
    physics: &mut PhysicsWorld,
    level: &CurrentLevel,
    config: &GameConfig,
) -> PhysicsResult<Vec<BodyId>> {
    let mut bodies = Vec::with_capacity(2);

    let chain = physics.create_body(&BodyDef::fixed(0.0, 0.0))?;
    physics.attach_chain(chain, &level.data.terrain(), false, SurfaceMaterial::default())?;
    bodies.push(chain);

    if level.data.ground_box {
        let width = config.screen_width as f32;
        let ground = physics.create_body(&BodyDef::fixed(width * 0.5, GROUND_BOX_Y))?;
        physics.attach_box(ground, width, GROUND_BOX_HEIGHT, &Material::default(), false)?;
        bodies.push(ground);
    }

    Ok(bodies)
}

/// Insert resources for `level` and build it.
pub fn start_level(world: &mut World, config: GameConfig, level: CurrentLevel) {
    insert_resources(world, config, level);
    let setup_system_id = world.register_system(setup);
    if let Err(e) = world.run_system(setup_system_id) {
        error!("Level setup did not run: {}", e);
    }
    world.flush();
}

/// The per-frame systems, in order.
pub fn build_schedule() -> Schedule {
    let mut update = Schedule::default();
    update.add_systems(
        (
            update_line_cleared_messages,
            active_block_control,
            physics_step,
            spawn_tetromino,
            line_clear_scan,
            score_line_clears,
            cull_fallen_blocks,
            clear_collision_flags,
        )
            .chain(),
    );
    update
}

/// Run one frame of `dt` seconds.
pub fn run_frame(world: &mut World, schedule: &mut Schedule, dt: f32) {
    update_world_time(world, dt);
    schedule.run(world);
    world.clear_trackers();
}
