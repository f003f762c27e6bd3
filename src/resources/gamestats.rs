use bevy_ecs::prelude::*;

/// Running totals for the current session.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct GameStats {
    /// One point per cleared line.
    pub score: u32,
    pub lines_cleared: u32,
    pub blocks_spawned: u32,
    /// Pieces that fell off the bottom of the level.
    pub blocks_culled: u32,
    pub level_complete: bool,
}
