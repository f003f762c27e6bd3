//! Lua scripting runtime for tetrafall.
//!
//! This module is a thin adapter over [`crate::physics`]: it marshals script
//! arguments into native calls and hands native results back as tables or
//! userdata. No game rules live here.
//!
//! # Architecture
//!
//! - [`runtime`] - Interpreter, the `engine` log table and the `physics` table
//! - [`world_api`] - `World` userdata
//! - [`body_api`] - `Body` userdata
//! - [`meta`] - Static API descriptions published as `engine.__meta`
//!
//! # Example
//!
//! ```lua
//! local world
//!
//! function setup()
//!     world = physics.new_world()
//!     local ground = world:create_body("static", 640, 40)
//!     ground:create_chain({ { x = 0, y = 0 }, { x = 1280, y = 0 } })
//! end
//!
//! function tick(frame, dt)
//!     world:step()
//!     world:clear_collision_flags()
//! end
//! ```

mod body_api;
mod meta;
mod runtime;
mod world_api;

pub use body_api::LuaBody;
pub use runtime::LuaRuntime;
pub use world_api::LuaWorld;
