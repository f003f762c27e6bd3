//! Line-clear notifications.
//!
//! The line-clear system writes one [`LineClearedMessage`] per cleared row.
//! Scoring reads them later in the same frame.

use bevy_ecs::message::Message;
use bevy_ecs::prelude::Entity;

/// A full row of blocks was removed.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct LineClearedMessage {
    /// Height of the scan line, in pixels.
    pub y: f32,
    /// Number of individual blocks removed.
    pub blocks: usize,
    /// Piece entities that lost at least one block.
    pub pieces: Vec<Entity>,
}
