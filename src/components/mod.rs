//! ECS components for entities.
//!
//! Submodules overview:
//! - [`block`] – falling pieces, the active-piece marker and level terrain

pub mod block;
