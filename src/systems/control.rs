//! Player control of the falling piece.

use bevy_ecs::prelude::*;
use log::{debug, warn};

use crate::components::block::{ActiveBlock, Block};
use crate::physics::{BodyId, PhysicsResult};
use crate::resources::controlinput::ControlInput;
use crate::resources::physicsworld::PhysicsWorld;

/// Horizontal speed, in m/s, for a full deflection of the control axis.
pub const STEER_SPEED: f32 = 10.0;
/// Vertical speed, in m/s, the active piece is held at while steered.
pub const FALL_SPEED: f32 = -2.4;
/// Degrees requested per frame of rotation input.
pub const ROTATE_STEP: f32 = 90.0;

/// Steer the active piece from [`ControlInput`].
///
/// The piece is held at a slow, steady fall and pushed sideways by the
/// horizontal axis. A release drops the [`ActiveBlock`] marker so the piece
/// falls freely from then on.
pub fn active_block_control(
    mut commands: Commands,
    mut input: ResMut<ControlInput>,
    mut physics: ResMut<PhysicsWorld>,
    active: Query<(Entity, &Block), With<ActiveBlock>>,
) {
    for (entity, block) in active.iter() {
        if input.release {
            debug!("Released {} piece {:?}", block.kind, entity);
            commands.entity(entity).remove::<ActiveBlock>();
            continue;
        }

        if let Err(e) = steer(&mut physics, block.body, &input) {
            warn!("Active piece {:?} lost its body: {}", entity, e);
            commands.entity(entity).remove::<ActiveBlock>();
        }
    }
    input.release = false;
}

fn steer(physics: &mut PhysicsWorld, body: BodyId, input: &ControlInput) -> PhysicsResult<()> {
    let horizontal = input.horizontal.clamp(-1.0, 1.0);
    physics.apply_impulse_for_velocity(body, horizontal * STEER_SPEED, FALL_SPEED)?;
    if input.rotation != 0.0 {
        physics.rotate(body, input.rotation.signum() * ROTATE_STEP)?;
    }
    Ok(())
}
