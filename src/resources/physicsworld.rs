//! ECS handle on the simulation.
//!
//! The game owns exactly one [`World`]; systems reach it through this
//! resource and call its API directly.

use std::ops::{Deref, DerefMut};

use bevy_ecs::prelude::*;

use crate::physics::{World, WorldConfig};

#[derive(Resource)]
pub struct PhysicsWorld(World);

impl PhysicsWorld {
    /// The game drives stepping with `step_by`, so the world's own clock is
    /// never read.
    pub fn new(config: WorldConfig) -> Self {
        Self(World::new(config))
    }
}

impl Deref for PhysicsWorld {
    type Target = World;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for PhysicsWorld {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
