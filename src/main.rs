//! tetrafall main entry point.
//!
//! A headless falling-block physics game built on:
//! - **rapier2d** for rigid-body simulation
//! - **bevy_ecs** for the native game loop
//! - **mlua + LuaJIT** for scripted games
//!
//! # Modes
//!
//! - Native (default): load `config.ini` and `assets/levels.json`, then run
//!   the bevy schedule for `--frames` fixed frames and report the score.
//! - Script (`--script PATH`): run a Lua game script, calling its `setup()`
//!   once and `tick(frame, dt)` every frame.
//! - `--create-lua-stubs [PATH]`: write editor annotations for the script
//!   API and exit.
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --level 1 --frames 1800 --seed 7
//! cargo run --release -- --script assets/scripts/main.lua
//! ```

use bevy_ecs::prelude::*;
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;

use tetrafall::game;
use tetrafall::resources::gameconfig::GameConfig;
use tetrafall::resources::gamestats::GameStats;
use tetrafall::resources::level::{CurrentLevel, DEFAULT_LEVELS_PATH, LevelSet};
use tetrafall::resources::worldtime::{FRAME_DT, WorldTime};
#[cfg(feature = "lua")]
use tetrafall::resources::lua_runtime::LuaRuntime;
#[cfg(feature = "lua")]
use tetrafall::stub_generator;

/// Headless falling-block physics game
#[derive(Parser)]
#[command(version, about = "Tetromino physics with line clears, native or scripted.")]
struct Cli {
    /// INI configuration file. Missing files fall back to defaults.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Level definitions (JSON). Missing files fall back to the built-in levels.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LEVELS_PATH)]
    levels: PathBuf,

    /// Level index, overriding the config file.
    #[arg(long)]
    level: Option<usize>,

    /// Number of 1/60 s frames to simulate.
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Spawn RNG seed, overriding the config file. 0 picks a random seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Run a Lua game script instead of the native game.
    #[cfg(feature = "lua")]
    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,

    /// Generate Lua LSP stubs from the script API metadata and exit.
    /// Optionally provide a path (default: assets/scripts/physics.lua).
    #[cfg(feature = "lua")]
    #[arg(long, value_name = "PATH")]
    create_lua_stubs: Option<Option<PathBuf>>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    #[cfg(feature = "lua")]
    {
        // Early-exit: generate Lua stubs and quit
        if let Some(maybe_path) = cli.create_lua_stubs.clone() {
            let path = maybe_path.unwrap_or_else(|| PathBuf::from("assets/scripts/physics.lua"));
            if let Err(e) = create_lua_stubs(&path) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
            println!("Lua stubs written to {}", path.display());
            return;
        }

        if let Some(script) = cli.script.clone() {
            if let Err(e) = run_script(&script, cli.frames) {
                error!("{}", e);
                std::process::exit(1);
            }
            return;
        }
    }

    let mut config = GameConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        warn!("{}; using defaults", e);
    }
    if let Some(level) = cli.level {
        config.level = level;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    if let Err(e) = run_native(config, &cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run_native(config: GameConfig, cli: &Cli) -> Result<(), String> {
    let levels = LevelSet::load_or_builtin(&cli.levels);
    let level = CurrentLevel::select(&levels, config.level)
        .ok_or_else(|| "No levels available".to_string())?;
    info!(
        "Starting '{}' for {} frames ({} px/m, {}x{})",
        level.data.name,
        cli.frames,
        config.physics.pixels_per_meter,
        config.screen_width,
        config.screen_height
    );

    // --------------- ECS world + resources ---------------
    let mut world = World::new();
    game::start_level(&mut world, config, level);

    let mut update = game::build_schedule();
    update
        .initialize(&mut world)
        .map_err(|e| format!("Failed to initialize schedule: {e}"))?;

    // --------------- Main loop ---------------
    let mut announced = false;
    for _ in 0..cli.frames {
        game::run_frame(&mut world, &mut update, FRAME_DT);
        if !announced && world.resource::<GameStats>().level_complete {
            announced = true;
            info!(
                "Target reached after {} frames",
                world.resource::<WorldTime>().frame_count
            );
        }
    }

    let stats = world.resource::<GameStats>();
    info!(
        "Final: score {}, lines {}, spawned {}, culled {}, complete {}",
        stats.score,
        stats.lines_cleared,
        stats.blocks_spawned,
        stats.blocks_culled,
        stats.level_complete
    );
    Ok(())
}

#[cfg(feature = "lua")]
fn create_lua_stubs(path: &std::path::Path) -> Result<(), String> {
    let runtime = LuaRuntime::new()
        .map_err(|e| format!("Failed to create Lua runtime for stub generation: {e}"))?;
    let content = stub_generator::generate_stubs(&runtime)?;
    stub_generator::write_stubs(path, &content)
}

/// Run a Lua game script headless at a fixed frame rate.
#[cfg(feature = "lua")]
fn run_script(path: &std::path::Path, frames: u64) -> Result<(), String> {
    let mut runtime = LuaRuntime::new().map_err(|e| format!("Failed to create Lua runtime: {e}"))?;
    let name = path.to_string_lossy();
    runtime
        .run_script(&name)
        .map_err(|e| format!("Failed to load {}: {}", name, e))?;
    runtime
        .setup()
        .map_err(|e| format!("setup() failed: {e}"))?;

    info!("Running {} for {} frames", name, frames);
    for _ in 0..frames {
        runtime
            .tick(FRAME_DT)
            .map_err(|e| format!("tick({}) failed: {}", runtime.frame(), e))?;
    }
    info!("Script finished after {} frames", runtime.frame());
    Ok(())
}
