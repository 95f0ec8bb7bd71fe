//! Container elevation - keeps the bubble field resting on the baseline.
//!
//! After every shot the grid is shifted vertically so the lowest bubble sits
//! on the playable baseline again: up when the field has grown below it, down
//! when popping has lifted it. The shift is a short ease-out tween.

use bevy::prelude::*;

use super::grid::HexGrid;

/// Duration of one corrective shift.
pub const ELEVATION_SECS: f32 = 0.2;

/// Shifts smaller than this are skipped.
const MIN_SHIFT: f32 = 1e-4;

/// An in-progress vertical move of the grid origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationTween {
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
}

/// Plan the corrective shift for the current grid, if one is needed.
pub fn plan(grid: &HexGrid, baseline: f32, duration: f32) -> Option<ElevationTween> {
    let lowest = grid.lowest_bubble_y()?;
    let shift = baseline - lowest;
    if shift.abs() < MIN_SHIFT {
        return None;
    }
    let from = grid.origin_y();
    debug!("Elevating grid by {shift:.1} (lowest bubble at {lowest:.1})");
    Some(ElevationTween {
        from,
        to: from + shift,
        elapsed: 0.0,
        duration,
    })
}

impl ElevationTween {
    pub fn target(&self) -> f32 {
        self.to
    }

    /// Advance the tween and move the grid. Returns `true` when it has landed
    /// on the target.
    pub fn tick(&mut self, dt: f32, grid: &mut HexGrid) -> bool {
        self.elapsed += dt;
        if self.duration <= 0.0 || self.elapsed >= self.duration {
            grid.set_origin_y(self.to);
            return true;
        }
        let t = ease_out_quint(self.elapsed / self.duration);
        grid.set_origin_y(self.from + (self.to - self.from) * t);
        false
    }

    /// Jump straight to the target.
    pub fn finish(self, grid: &mut HexGrid) {
        grid.set_origin_y(self.to);
    }
}

fn ease_out_quint(t: f32) -> f32 {
    1.0 - (1.0 - t.clamp(0.0, 1.0)).powi(5)
}
