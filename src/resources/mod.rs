//! ECS resources made available to systems.
//!
//! Overview
//! - `controlinput` – player intent applied to the active piece
//! - `gameconfig` – settings loaded from `config.ini`
//! - `gamestats` – score and session counters
//! - `level` – terrain, scan area and scoring rules per level
//! - `lua_runtime` – embedded Lua interpreter and the script physics API
//! - `physicsworld` – the simulation shared by every system
//! - `spawnrng` – seeded random source for piece spawning
//! - `worldtime` – simulation time, delta and frame counter
pub mod controlinput;
pub mod gameconfig;
pub mod gamestats;
pub mod level;
#[cfg(feature = "lua")]
pub mod lua_runtime;
pub mod physicsworld;
pub mod spawnrng;
pub mod worldtime;
