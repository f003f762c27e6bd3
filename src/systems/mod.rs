//! Game systems.
//!
//! Submodules overview
//! - [`control`] – steer the active piece from [`ControlInput`](crate::resources::controlinput::ControlInput)
//! - [`cull`] – remove pieces that fell out of the level
//! - [`lineclear`] – scan block rows and clear the full ones
//! - [`physics`] – advance the simulation and reset collision flags
//! - [`score`] – turn line-clear messages into points
//! - [`spawn`] – drop new pieces
//! - [`time`] – update simulation time and delta

pub mod control;
pub mod cull;
pub mod lineclear;
pub mod physics;
pub mod score;
pub mod spawn;
pub mod time;
