use bevy_ecs::prelude::*;
use log::error;

use crate::resources::physicsworld::PhysicsWorld;
use crate::resources::worldtime::WorldTime;

/// Advance the simulation by this frame's delta.
pub fn physics_step(mut physics: ResMut<PhysicsWorld>, time: Res<WorldTime>) {
    if let Err(e) = physics.step_by(time.delta) {
        error!("Physics step failed: {}", e);
    }
}

/// Forget this frame's collisions. Runs last so every system in the frame
/// sees the flags set by the step.
pub fn clear_collision_flags(mut physics: ResMut<PhysicsWorld>) {
    physics.clear_collision_flags();
}
