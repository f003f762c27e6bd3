//! Lua runtime core implementation.
//!
//! This module contains the `LuaRuntime` struct which manages the Lua interpreter
//! and provides the `engine` and `physics` tables to Lua scripts.

use super::meta;
use super::world_api::LuaWorld;
use crate::physics::{ManualClock, World, WorldConfig};
use mlua::prelude::*;

use log::{error, info, warn};

/// Shared state accessible from Lua function closures.
/// This is stored in Lua's app_data.
pub(super) struct LuaAppData {
    /// Tick source handed to every world a script creates.
    clock: ManualClock,
}

/// Resource holding the Lua interpreter state.
///
/// This is a `NonSend` resource because the Lua state is not thread-safe.
/// It should be initialized once at startup and reused throughout the game.
pub struct LuaRuntime {
    lua: Lua,
    clock: ManualClock,
    frame: u64,
}

impl LuaRuntime {
    /// Creates a new Lua runtime and registers the `engine` and `physics` APIs.
    ///
    /// # Errors
    ///
    /// Returns an error if Lua initialization or API registration fails.
    pub fn new() -> LuaResult<Self> {
        let lua = Lua::new();

        // Set up the package path so `require` can find scripts in assets/scripts/
        lua.load(r#"package.path = "./assets/scripts/?.lua;./assets/scripts/?/init.lua;" .. package.path"#)
            .exec()?;

        let clock = ManualClock::new();
        lua.set_app_data(LuaAppData {
            clock: clock.clone(),
        });

        let runtime = Self {
            lua,
            clock,
            frame: 0,
        };
        runtime.register_base_api()?;
        runtime.register_physics_api()?;
        runtime.register_meta()?;

        Ok(runtime)
    }

    /// Registers the base `engine` table with logging functions.
    fn register_base_api(&self) -> LuaResult<()> {
        let engine = self.lua.create_table()?;

        // engine.log(message) - General purpose logging
        engine.set(
            "log",
            self.lua.create_function(|_, msg: String| {
                info!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;

        // engine.log_info(message) - Info level logging
        engine.set(
            "log_info",
            self.lua.create_function(|_, msg: String| {
                info!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;

        // engine.log_warn(message) - Warning level logging
        engine.set(
            "log_warn",
            self.lua.create_function(|_, msg: String| {
                warn!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;

        // engine.log_error(message) - Error level logging
        engine.set(
            "log_error",
            self.lua.create_function(|_, msg: String| {
                error!(target: "lua", "{}", msg);
                Ok(())
            })?,
        )?;

        self.lua.globals().set("engine", engine)?;

        Ok(())
    }

    /// Registers the global `physics` table.
    fn register_physics_api(&self) -> LuaResult<()> {
        let physics = self.lua.create_table()?;

        // physics.new_world(opts?) - Create a world bound to the runtime clock
        physics.set(
            "new_world",
            self.lua.create_function(|lua, opts: Option<LuaTable>| {
                let config = world_config(opts)?;
                let clock = lua
                    .app_data_ref::<LuaAppData>()
                    .ok_or_else(|| LuaError::runtime("LuaAppData not found"))?
                    .clock
                    .clone();
                info!(
                    "Script created a physics world ({} px/m, gravity {:?})",
                    config.pixels_per_meter, config.gravity
                );
                LuaWorld::new(lua, World::with_clock(config, clock))
            })?,
        )?;

        for constant in meta::CONSTANTS.iter().filter(|c| c.table == "physics") {
            physics.set(constant.name, constant.value)?;
        }

        self.lua.globals().set("physics", physics)?;

        Ok(())
    }

    fn register_meta(&self) -> LuaResult<()> {
        let engine: LuaTable = self.lua.globals().get("engine")?;
        engine.set("__meta", meta::build_meta(&self.lua)?)?;
        Ok(())
    }

    /// Loads and executes a Lua script from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the script has syntax/runtime errors.
    pub fn run_script(&self, path: &str) -> LuaResult<()> {
        let script = std::fs::read_to_string(path)
            .map_err(|e| LuaError::ExternalError(std::sync::Arc::new(e)))?;
        self.lua.load(&script).set_name(path).exec()
    }

    /// Calls a global Lua function by name with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the function doesn't exist or execution fails.
    pub fn call_function<A, R>(&self, name: &str, args: A) -> LuaResult<R>
    where
        A: IntoLuaMulti,
        R: FromLuaMulti,
    {
        let func: LuaFunction = self.lua.globals().get(name)?;
        func.call(args)
    }

    /// Checks if a global function exists.
    pub fn has_function(&self, name: &str) -> bool {
        self.lua.globals().get::<LuaFunction>(name).is_ok()
    }

    /// Calls the script's `setup()` if it defines one.
    pub fn setup(&self) -> LuaResult<()> {
        if self.has_function("setup") {
            self.call_function::<_, ()>("setup", ())?;
        }
        Ok(())
    }

    /// Advances the shared clock by `dt` and calls the script's
    /// `tick(frame, dt)` if it defines one.
    pub fn tick(&mut self, dt: f32) -> LuaResult<()> {
        self.clock.advance_secs(dt);
        self.frame += 1;
        if self.has_function("tick") {
            self.call_function::<_, ()>("tick", (self.frame, dt))?;
        }
        Ok(())
    }

    /// Frames ticked so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// The clock every script-created world steps by.
    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Returns a reference to the underlying Lua state.
    pub fn lua(&self) -> &Lua {
        &self.lua
    }
}

/// Reads `{ pixels_per_meter, gravity_x, gravity_y }`.
fn world_config(opts: Option<LuaTable>) -> LuaResult<WorldConfig> {
    let mut config = WorldConfig::default();
    let Some(opts) = opts else {
        return Ok(config);
    };

    if let Some(ppm) = opts.get::<Option<f32>>("pixels_per_meter")? {
        if !ppm.is_finite() || ppm <= 0.0 {
            return Err(LuaError::runtime(format!(
                "pixels_per_meter must be positive, got {ppm}"
            )));
        }
        config = config.with_scale(ppm);
    }
    let gx = opts.get::<Option<f32>>("gravity_x")?.unwrap_or(config.gravity.0);
    let gy = opts.get::<Option<f32>>("gravity_y")?.unwrap_or(config.gravity.1);
    Ok(config.with_gravity(gx, gy))
}
