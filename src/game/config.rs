//! Tunables for the shooter core.
//!
//! Every field has a default taken from the module constants, and missing JSON
//! fields fall back to those defaults.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{
    bubble::SPECIAL_BUBBLE_CHANCE,
    effects::{AREA_CLEAR_RADIUS_CELLS, POP_STAGGER_SECS},
    elevation::ELEVATION_SECS,
    error::StageError,
    hex::BUBBLE_DIAMETER,
    trajectory::{DEFAULT_MAX_BOUNCES, MAX_RAY_LENGTH, PlayArea, WALL_OFFSET},
};

/// Y position of the launcher.
pub const SHOOTER_Y: f32 = -250.0;

/// Top of the visible play area.
pub const PLAY_TOP: f32 = 280.0;

/// Where the lowest bubble should rest after each shot.
pub const BASELINE_Y: f32 = 0.0;

/// Speed of the projectile in world units per second.
pub const PROJECTILE_SPEED: f32 = 600.0;

/// Duration of the ready/active exchange.
pub const SWAP_SECS: f32 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShooterConfig {
    pub bubble_diameter: f32,
    /// Launch point of every shot.
    pub shooter_x: f32,
    pub shooter_y: f32,
    /// Wall x-positions. `None` places the walls flush with the grid edges.
    pub left_wall: Option<f32>,
    pub right_wall: Option<f32>,
    /// Visible play boundary. Snaps above it are rejected and bubbles above it
    /// are hidden.
    pub play_top: f32,
    pub baseline_y: f32,
    pub max_bounces: u32,
    pub max_ray_length: f32,
    pub wall_offset: f32,
    pub projectile_speed: f32,
    pub pop_stagger_secs: f32,
    pub elevation_secs: f32,
    pub swap_secs: f32,
    /// AreaClear reach measured in bubble diameters, center to center.
    pub area_clear_radius_cells: f32,
    /// Chance that a random stage bubble is special.
    pub special_chance: f64,
    /// Fixed seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for ShooterConfig {
    fn default() -> Self {
        Self {
            bubble_diameter: BUBBLE_DIAMETER,
            shooter_x: 0.0,
            shooter_y: SHOOTER_Y,
            left_wall: None,
            right_wall: None,
            play_top: PLAY_TOP,
            baseline_y: BASELINE_Y,
            max_bounces: DEFAULT_MAX_BOUNCES,
            max_ray_length: MAX_RAY_LENGTH,
            wall_offset: WALL_OFFSET,
            projectile_speed: PROJECTILE_SPEED,
            pop_stagger_secs: POP_STAGGER_SECS,
            elevation_secs: ELEVATION_SECS,
            swap_secs: SWAP_SECS,
            area_clear_radius_cells: AREA_CLEAR_RADIUS_CELLS,
            special_chance: SPECIAL_BUBBLE_CHANCE,
            seed: None,
        }
    }
}

impl ShooterConfig {
    pub fn from_json(json: &str) -> Result<Self, StageError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn launch(&self) -> Vec2 {
        Vec2::new(self.shooter_x, self.shooter_y)
    }

    /// Play area for a grid `width` cells wide centred on x = 0.
    pub fn play_area(&self, width: i32) -> PlayArea {
        let half = width as f32 * self.bubble_diameter * 0.5;
        PlayArea {
            left: self.left_wall.unwrap_or(-half),
            right: self.right_wall.unwrap_or(half),
            top: self.play_top,
        }
    }

    pub fn area_clear_radius(&self) -> f32 {
        self.area_clear_radius_cells * self.bubble_diameter
    }
}
