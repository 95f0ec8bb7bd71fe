//! Error types for stage loading, grid placement and firing.

use thiserror::Error;

use super::{hex::HexCoord, shooter::ShooterState};

/// Errors raised when mutating the grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid dimensions must not be negative, got {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },
    #[error("cell {0} is outside the grid")]
    OutOfBounds(HexCoord),
    #[error("cell {0} is already occupied")]
    Occupied(HexCoord),
}

/// Hard failures while building a stage. Everything else is skipped and logged.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("failed to read stage data: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse stage data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Why the shooter refused to fire or swap. Refusals never change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FireError {
    #[error("shooter is not armed (state: {0:?})")]
    NotArmed(ShooterState),
    #[error("current aim has no valid snap cell")]
    NoSnapTarget,
    #[error("no bubble is loaded")]
    NothingLoaded,
    #[error("swap needs both an active and a ready bubble")]
    NothingToSwap,
}
