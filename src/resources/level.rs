//! Level definitions.
//!
//! A level is a static terrain chain, the rectangle the line-clear scan
//! sweeps, and the scoring rules. Levels are read from `assets/levels.json`;
//! when that file is missing the two built-in levels are used.
//!
//! ```json
//! {
//!   "levels": [
//!     {
//!       "name": "Bumpy Flats",
//!       "target_score": 10,
//!       "line_min_blocks": 10,
//!       "ground_box": true,
//!       "terrain_points": [[1010, 1000], [990, 820]],
//!       "scan_area": { "x": 200, "y": 76, "w": 880, "h": 600 }
//!     }
//!   ]
//! }
//! ```

use bevy_ecs::prelude::*;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::physics::Vec2;

pub const DEFAULT_LEVELS_PATH: &str = "./assets/levels.json";

/// Rectangle swept by the line-clear scan, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanArea {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl ScanArea {
    /// Heights of the horizontal scan lines, one per block row.
    pub fn rows(&self, square_size: f32) -> impl Iterator<Item = f32> + '_ {
        let count = if square_size > 0.0 {
            (self.h / square_size).floor().max(0.0) as usize
        } else {
            0
        };
        (0..count).map(move |i| self.y + square_size * (i as f32 + 0.5))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    pub name: String,
    /// Lines to clear before the level counts as complete.
    pub target_score: u32,
    /// Fewest blocks that make a line.
    pub line_min_blocks: usize,
    /// Add a flat static floor under the terrain.
    #[serde(default)]
    pub ground_box: bool,
    pub terrain_points: Vec<[f32; 2]>,
    pub scan_area: ScanArea,
}

impl LevelData {
    pub fn terrain(&self) -> Vec<Vec2> {
        self.terrain_points
            .iter()
            .map(|[x, y]| Vec2::new(*x, *y))
            .collect()
    }
}

/// Every level available to the game.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSet {
    pub levels: Vec<LevelData>,
}

impl Default for LevelSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LevelSet {
    /// The two stock levels, laid out for a 1280 pixel wide screen.
    pub fn builtin() -> Self {
        let points = |pts: &[(f32, f32)]| pts.iter().map(|&(x, y)| [x, y]).collect();
        Self {
            levels: vec![
                LevelData {
                    name: "Bumpy Flats".into(),
                    target_score: 10,
                    line_min_blocks: 10,
                    ground_box: true,
                    terrain_points: points(&[
                        // right wall
                        (1010.0, 1000.0),
                        (990.0, 820.0),
                        (950.0, 520.0),
                        (930.0, 80.0),
                        // ground
                        (900.0, 80.0),
                        (900.0, 100.0),
                        (860.0, 100.0),
                        (860.0, 80.0),
                        (520.0, 80.0),
                        (520.0, 120.0),
                        (480.0, 120.0),
                        (400.0, 140.0),
                        (380.0, 140.0),
                        // left wall
                        (350.0, 120.0),
                        (330.0, 520.0),
                        (290.0, 820.0),
                        (270.0, 1000.0),
                    ]),
                    scan_area: ScanArea {
                        x: 200.0,
                        y: 76.0,
                        w: 880.0,
                        h: 600.0,
                    },
                },
                LevelData {
                    name: "Jagged Peaks".into(),
                    target_score: 20,
                    line_min_blocks: 6,
                    ground_box: false,
                    terrain_points: points(&[
                        (1080.0, 820.0),
                        (1080.0, 150.0),
                        (1000.0, 350.0),
                        (850.0, 200.0),
                        (700.0, 400.0),
                        (540.0, 250.0),
                        (450.0, 300.0),
                        (300.0, 180.0),
                        (200.0, 100.0),
                        (200.0, 820.0),
                    ]),
                    scan_area: ScanArea {
                        x: 200.0,
                        y: 100.0,
                        w: 880.0,
                        h: 500.0,
                    },
                },
            ],
        }
    }

    /// Parse a level file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let set: LevelSet = serde_json::from_str(&json)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
        if set.levels.is_empty() {
            return Err(format!("{} defines no levels", path.display()));
        }
        info!("Loaded {} levels from {}", set.levels.len(), path.display());
        Ok(set)
    }

    /// Load `path`, falling back to the built-in levels.
    pub fn load_or_builtin(path: impl AsRef<Path>) -> Self {
        Self::load_from_file(path).unwrap_or_else(|e| {
            warn!("{}; using built-in levels", e);
            Self::builtin()
        })
    }

    pub fn get(&self, index: usize) -> Option<&LevelData> {
        self.levels.get(index)
    }
}

/// The level being played.
#[derive(Resource, Debug, Clone)]
pub struct CurrentLevel {
    pub index: usize,
    pub data: LevelData,
}

impl CurrentLevel {
    /// Pick level `index`, wrapping to the first level when out of range.
    pub fn select(levels: &LevelSet, index: usize) -> Option<Self> {
        let index = if index < levels.levels.len() {
            index
        } else {
            warn!("Level {} does not exist, starting level 0", index);
            0
        };
        levels.get(index).map(|data| Self {
            index,
            data: data.clone(),
        })
    }
}
