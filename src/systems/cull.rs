use bevy_ecs::prelude::*;
use log::debug;

use crate::components::block::Block;
use crate::resources::gamestats::GameStats;
use crate::resources::physicsworld::PhysicsWorld;

/// Pieces below this height (pixels) have left the level.
pub const CULL_Y: f32 = -100.0;

/// Destroy and despawn pieces that fell out of the level.
pub fn cull_fallen_blocks(
    mut commands: Commands,
    mut physics: ResMut<PhysicsWorld>,
    mut stats: ResMut<GameStats>,
    blocks: Query<(Entity, &Block)>,
) {
    for (entity, block) in blocks.iter() {
        match physics.position(block.body) {
            Ok(pos) if pos.y >= CULL_Y => continue,
            Ok(pos) => debug!("Culling {} piece {:?} at y={}", block.kind, entity, pos.y),
            Err(e) => debug!("Culling {} piece {:?}: {}", block.kind, entity, e),
        }
        physics.destroy_body(block.body);
        commands.entity(entity).despawn();
        stats.blocks_culled += 1;
    }
}
