//! Logic core for a hex-grid bubble shooter.
//!
//! Aim a bubble, bounce it off the walls, snap it into the grid, pop
//! same-type clusters of three or more and let special bubbles clear more.
//! Everything runs on plain data through [`ShooterEngine`]; add
//! [`HexBubblePlugin`] to drive it from a Bevy app with messages.

pub mod game;

use bevy::prelude::*;

pub use game::{
    BubbleId, BubbleType, BubbleTypeRegistry, HexCoord, ShooterConfig, ShooterEngine,
    ShooterEvent, ShooterState, ShooterSystems, SpecialKind, StageData,
};

/// Registers the shooter messages and systems.
pub struct HexBubblePlugin;

impl Plugin for HexBubblePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(game::plugin);
    }
}
