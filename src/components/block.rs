//! Falling-piece components.
//!
//! Every piece in play is an entity carrying a [`Block`] that points at its
//! body in the [`PhysicsWorld`](crate::resources::physicsworld::PhysicsWorld).
//! The piece the player is steering additionally carries [`ActiveBlock`].

use bevy_ecs::prelude::Component;

use crate::physics::{BodyId, OwnerKey, Tetromino};

/// Display colours handed out to spawned pieces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockColor {
    Violet,
    Orange,
    Blue,
    Green,
    Yellow,
    Red,
}

impl BlockColor {
    pub const ALL: [BlockColor; 6] = [
        BlockColor::Violet,
        BlockColor::Orange,
        BlockColor::Blue,
        BlockColor::Green,
        BlockColor::Yellow,
        BlockColor::Red,
    ];

    pub fn rgba(&self) -> [u8; 4] {
        match self {
            BlockColor::Violet => [135, 60, 190, 255],
            BlockColor::Orange => [255, 161, 0, 255],
            BlockColor::Blue => [0, 121, 241, 255],
            BlockColor::Green => [0, 228, 48, 255],
            BlockColor::Yellow => [253, 249, 0, 255],
            BlockColor::Red => [230, 41, 55, 255],
        }
    }
}

/// A piece and the body that simulates it.
#[derive(Component, Clone, Copy, Debug)]
pub struct Block {
    pub body: BodyId,
    pub kind: Tetromino,
    pub color: BlockColor,
}

impl Block {
    /// Key that identifies this piece's entity inside the physics world.
    pub fn owner_key(entity: bevy_ecs::entity::Entity) -> OwnerKey {
        OwnerKey(entity.to_bits())
    }
}

/// Marker for the piece currently under player control.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct ActiveBlock;

/// Marker for static level geometry.
#[derive(Component, Clone, Copy, Debug)]
pub struct Terrain {
    pub body: BodyId,
}
