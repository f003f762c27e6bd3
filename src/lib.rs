//! tetrafall library.
//!
//! [`physics`] is the rigid-body core for falling-block games: unit
//! conversion, tetromino shapes, a body registry with gameplay context, a
//! clamped stepper and the line-clear scanner. The remaining modules are the
//! headless `bevy_ecs` game built on it and, behind the `lua` feature, the
//! script bindings and their stub generator.

pub mod components;
pub mod events;
pub mod game;
pub mod physics;
pub mod resources;
#[cfg(feature = "lua")]
pub mod stub_generator;
pub mod systems;
