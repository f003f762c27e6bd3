//! Player intent for the falling piece.
//!
//! Headless hosts and scripts write this resource directly; the control
//! system turns it into impulses and rotation on the active piece.

use bevy_ecs::prelude::*;

#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlInput {
    /// -1.0 (left) ..= 1.0 (right).
    pub horizontal: f32,
    /// Rotation direction: -1.0, 0.0 or 1.0. Positive turns counter-clockwise.
    pub rotation: f32,
    /// Let go of the active piece early.
    pub release: bool,
}

impl ControlInput {
    pub fn is_idle(&self) -> bool {
        self.horizontal == 0.0 && self.rotation == 0.0 && !self.release
    }
}
