//! Game configuration resource.
//!
//! Manages game settings loaded from an INI configuration file. Provides
//! defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [physics]
//! pixels_per_meter = 32
//! gravity_x = 0.0
//! gravity_y = -9.8
//! max_step = 0.032
//! substeps = 8
//!
//! [game]
//! level = 0
//! square_size = 32
//! density = 1.0
//! spawn_interval = 60
//! scan_interval = 30
//! seed = 0
//!
//! [screen]
//! width = 1280
//! height = 720
//!
//! [scan]
//! vertical_tolerance = 6.0
//! horizontal_tolerance = 38.4
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

use crate::physics::WorldConfig;
use crate::physics::line_clear::{DEFAULT_HORIZONTAL_TOLERANCE, DEFAULT_VERTICAL_TOLERANCE};

/// Default safe values for startup
const DEFAULT_SQUARE_SIZE: f32 = 32.0;
const DEFAULT_DENSITY: f32 = 1.0;
const DEFAULT_SPAWN_INTERVAL: u32 = 60;
const DEFAULT_SCAN_INTERVAL: u32 = 30;
const DEFAULT_SCREEN_WIDTH: u32 = 1280;
const DEFAULT_SCREEN_HEIGHT: u32 = 720;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Game configuration resource.
#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    /// Physics world settings.
    pub physics: WorldConfig,
    /// Index into the level list.
    pub level: usize,
    /// Edge length of one block, in pixels.
    pub square_size: f32,
    /// Density of spawned pieces.
    pub density: f32,
    /// Frames between spawns.
    pub spawn_interval: u32,
    /// Frames between line-clear scans.
    pub scan_interval: u32,
    /// RNG seed for spawns; 0 picks a random seed.
    pub seed: u64,
    pub screen_width: u32,
    pub screen_height: u32,
    pub vertical_tolerance: f32,
    pub horizontal_tolerance: f32,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            physics: WorldConfig::default(),
            level: 0,
            square_size: DEFAULT_SQUARE_SIZE,
            density: DEFAULT_DENSITY,
            spawn_interval: DEFAULT_SPAWN_INTERVAL,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            seed: 0,
            screen_width: DEFAULT_SCREEN_WIDTH,
            screen_height: DEFAULT_SCREEN_HEIGHT,
            vertical_tolerance: DEFAULT_VERTICAL_TOLERANCE,
            horizontal_tolerance: DEFAULT_HORIZONTAL_TOLERANCE,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config)?;

        info!(
            "Loaded config: {} px/m, gravity ({}, {}), level {}, {}x{} screen, spawn every {} frames",
            self.physics.pixels_per_meter,
            self.physics.gravity.0,
            self.physics.gravity.1,
            self.level,
            self.screen_width,
            self.screen_height,
            self.spawn_interval
        );

        Ok(())
    }

    /// Load configuration from INI text instead of a file.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config)
    }

    fn apply(&mut self, config: &Ini) -> Result<(), String> {
        // [physics] section
        if let Some(ppm) = config.getfloat("physics", "pixels_per_meter").ok().flatten() {
            if !ppm.is_finite() || ppm <= 0.0 {
                return Err(format!("physics.pixels_per_meter must be positive, got {}", ppm));
            }
            self.physics.pixels_per_meter = ppm as f32;
        }
        if let Some(gx) = config.getfloat("physics", "gravity_x").ok().flatten() {
            self.physics.gravity.0 = gx as f32;
        }
        if let Some(gy) = config.getfloat("physics", "gravity_y").ok().flatten() {
            self.physics.gravity.1 = gy as f32;
        }
        if let Some(max_step) = config.getfloat("physics", "max_step").ok().flatten() {
            self.physics.max_step = max_step as f32;
        }
        if let Some(substeps) = config.getuint("physics", "substeps").ok().flatten() {
            self.physics.substeps = substeps as usize;
        }

        // [game] section
        if let Some(level) = config.getuint("game", "level").ok().flatten() {
            self.level = level as usize;
        }
        if let Some(size) = config.getfloat("game", "square_size").ok().flatten() {
            if size.is_nan() || size <= 0.0 {
                return Err(format!("game.square_size must be positive, got {}", size));
            }
            self.square_size = size as f32;
        }
        if let Some(density) = config.getfloat("game", "density").ok().flatten() {
            self.density = density as f32;
        }
        if let Some(interval) = config.getuint("game", "spawn_interval").ok().flatten() {
            self.spawn_interval = interval as u32;
        }
        if let Some(interval) = config.getuint("game", "scan_interval").ok().flatten() {
            self.scan_interval = interval as u32;
        }
        if let Some(seed) = config.getuint("game", "seed").ok().flatten() {
            self.seed = seed;
        }

        // [screen] section
        if let Some(width) = config.getuint("screen", "width").ok().flatten() {
            self.screen_width = width as u32;
        }
        if let Some(height) = config.getuint("screen", "height").ok().flatten() {
            self.screen_height = height as u32;
        }

        // [scan] section
        if let Some(tol) = config.getfloat("scan", "vertical_tolerance").ok().flatten() {
            self.vertical_tolerance = tol as f32;
        }
        if let Some(tol) = config.getfloat("scan", "horizontal_tolerance").ok().flatten() {
            self.horizontal_tolerance = tol as f32;
        }

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        // [physics] section
        config.set("physics", "pixels_per_meter", Some(self.physics.pixels_per_meter.to_string()));
        config.set("physics", "gravity_x", Some(self.physics.gravity.0.to_string()));
        config.set("physics", "gravity_y", Some(self.physics.gravity.1.to_string()));
        config.set("physics", "max_step", Some(self.physics.max_step.to_string()));
        config.set("physics", "substeps", Some(self.physics.substeps.to_string()));

        // [game] section
        config.set("game", "level", Some(self.level.to_string()));
        config.set("game", "square_size", Some(self.square_size.to_string()));
        config.set("game", "density", Some(self.density.to_string()));
        config.set("game", "spawn_interval", Some(self.spawn_interval.to_string()));
        config.set("game", "scan_interval", Some(self.scan_interval.to_string()));
        config.set("game", "seed", Some(self.seed.to_string()));

        // [screen] section
        config.set("screen", "width", Some(self.screen_width.to_string()));
        config.set("screen", "height", Some(self.screen_height.to_string()));

        // [scan] section
        config.set("scan", "vertical_tolerance", Some(self.vertical_tolerance.to_string()));
        config.set("scan", "horizontal_tolerance", Some(self.horizontal_tolerance.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Settings for a fresh physics world.
    pub fn physics_config(&self) -> WorldConfig {
        self.physics
    }

    /// Get the screen size.
    pub fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }
}
