//! Dropping new pieces into the level.

use bevy_ecs::prelude::*;
use log::{debug, error};

use crate::components::block::{ActiveBlock, Block, BlockColor};
use crate::physics::{BodyDef, BodyId, PhysicsResult, Tetromino};
use crate::resources::gameconfig::GameConfig;
use crate::resources::gamestats::GameStats;
use crate::resources::physicsworld::PhysicsWorld;
use crate::resources::spawnrng::SpawnRng;
use crate::resources::worldtime::WorldTime;

/// Pieces appear this far below the top of the screen.
pub const SPAWN_DROP: f32 = 100.0;
/// Horizontal spread around the screen centre.
pub const SPAWN_JITTER: i32 = 50;
const SPAWN_ANGLES: [f32; 4] = [0.0, 90.0, 180.0, 270.0];

/// Every `spawn_interval` frames, drop a random piece near the top centre
/// and hand control to it.
#[allow(clippy::too_many_arguments)]
pub fn spawn_tetromino(
    mut commands: Commands,
    mut physics: ResMut<PhysicsWorld>,
    mut rng: ResMut<SpawnRng>,
    mut stats: ResMut<GameStats>,
    config: Res<GameConfig>,
    time: Res<WorldTime>,
    active: Query<Entity, With<ActiveBlock>>,
) {
    if !time.every(config.spawn_interval) {
        return;
    }

    let kind = Tetromino::ALL[rng.0.usize(..Tetromino::ALL.len())];
    let color = BlockColor::ALL[rng.0.usize(..BlockColor::ALL.len())];
    let x = config.screen_width as f32 * 0.5 + rng.0.i32(-SPAWN_JITTER..SPAWN_JITTER) as f32;
    let y = config.screen_height as f32 - SPAWN_DROP;
    let angle = SPAWN_ANGLES[rng.0.usize(..SPAWN_ANGLES.len())];

    let entity = commands.spawn_empty().id();
    let def = BodyDef::dynamic(x, y)
        .with_angle(angle)
        .with_owner(Block::owner_key(entity));
    let body = match create_piece(&mut physics, &def, kind, &config) {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to spawn {} piece: {}", kind, e);
            commands.entity(entity).despawn();
            return;
        }
    };

    for previous in active.iter() {
        commands.entity(previous).remove::<ActiveBlock>();
    }
    commands
        .entity(entity)
        .insert((Block { body, kind, color }, ActiveBlock));
    stats.blocks_spawned += 1;
    debug!("Spawned {} piece at ({}, {}) angle {}", kind, x, y, angle);
}

fn create_piece(
    physics: &mut PhysicsWorld,
    def: &BodyDef,
    kind: Tetromino,
    config: &GameConfig,
) -> PhysicsResult<BodyId> {
    let body = physics.create_body(def)?;
    if let Err(e) = physics.attach_tetromino(body, kind, config.square_size, config.density) {
        physics.destroy_body(body);
        return Err(e);
    }
    Ok(body)
}
