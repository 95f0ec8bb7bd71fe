//! The hexagonal grid that holds all landed bubbles.
//!
//! Uses a HashMap for sparse storage - only occupied cells are stored. The map
//! is the single source of truth for which cells are occupied; each bubble's
//! world position is derived from its cell and the current layout.

use bevy::prelude::*;
use std::collections::HashMap;

use super::{
    bubble::Bubble,
    error::GridError,
    hex::{HexCoord, HexDirection, HexLayout},
};

/// The extents of the grid.
///
/// Even rows hold `width` cells; odd rows are shifted right by half a cell and
/// hold `width - 1`, so the brick pattern never sticks out past the walls.
/// `height` bounds authored placements only. Shots may land in any row below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub width: i32,
    pub height: i32,
}

impl GridBounds {
    pub fn new(width: i32, height: i32) -> Result<Self, GridError> {
        if width < 0 || height < 0 {
            return Err(GridError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Number of valid columns in a row.
    pub fn columns_in_row(&self, row: i32) -> i32 {
        if row.rem_euclid(2) == 1 {
            self.width - 1
        } else {
            self.width
        }
    }

    /// Check if a hex coordinate is within the authored extent.
    pub fn contains(&self, coord: HexCoord) -> bool {
        coord.row < self.height && self.allows_landing(coord)
    }

    /// Whether a bubble may occupy a cell. Rows grow downward without limit.
    pub fn allows_landing(&self, coord: HexCoord) -> bool {
        coord.row >= 0 && coord.col >= 0 && coord.col < self.columns_in_row(coord.row)
    }

    /// Iterate over all valid hex coordinates in reading order.
    pub fn iter(&self) -> impl Iterator<Item = HexCoord> {
        let bounds = *self;
        (0..bounds.height).flat_map(move |row| {
            (0..bounds.columns_in_row(row)).map(move |col| HexCoord::new(col, row))
        })
    }
}

impl Default for GridBounds {
    fn default() -> Self {
        Self {
            width: 11,
            height: 14,
        }
    }
}

/// The grid holding every landed bubble.
#[derive(Debug, Clone)]
pub struct HexGrid {
    bubbles: HashMap<HexCoord, Bubble>,
    bounds: GridBounds,
    layout: HexLayout,
    /// Bubbles whose center is above this y are hidden above the viewport.
    visible_top: f32,
}

impl HexGrid {
    pub fn new(bounds: GridBounds, layout: HexLayout) -> Self {
        Self {
            bubbles: HashMap::new(),
            bounds,
            layout,
            visible_top: f32::INFINITY,
        }
    }

    pub fn with_visible_top(mut self, visible_top: f32) -> Self {
        self.visible_top = visible_top;
        self
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn layout(&self) -> &HexLayout {
        &self.layout
    }

    pub fn visible_top(&self) -> f32 {
        self.visible_top
    }

    /// Whether `coord` is a cell a bubble can occupy.
    pub fn contains(&self, coord: HexCoord) -> bool {
        self.bounds.allows_landing(coord)
    }

    /// Check if a cell is occupied.
    pub fn is_occupied(&self, coord: HexCoord) -> bool {
        self.bubbles.contains_key(&coord)
    }

    /// Whether a world position is at or below the visible play boundary.
    pub fn is_visible(&self, pos: Vec2) -> bool {
        pos.y <= self.visible_top
    }

    pub fn get(&self, coord: HexCoord) -> Option<&Bubble> {
        self.bubbles.get(&coord)
    }

    pub fn get_mut(&mut self, coord: HexCoord) -> Option<&mut Bubble> {
        self.bubbles.get_mut(&coord)
    }

    /// Land a bubble in a cell. The grid takes ownership and places the
    /// bubble at the cell center.
    pub fn insert(&mut self, coord: HexCoord, mut bubble: Bubble) -> Result<(), GridError> {
        if !self.contains(coord) {
            return Err(GridError::OutOfBounds(coord));
        }
        if self.is_occupied(coord) {
            return Err(GridError::Occupied(coord));
        }
        bubble.coord = Some(coord);
        bubble.position = self.layout.cell_to_world(coord);
        self.bubbles.insert(coord, bubble);
        Ok(())
    }

    /// Remove a bubble from a position, handing ownership back.
    pub fn remove(&mut self, coord: HexCoord) -> Option<Bubble> {
        self.bubbles.remove(&coord)
    }

    /// Flag a bubble as queued for popping.
    ///
    /// Returns `false` when the cell is empty or the bubble is already marked.
    pub fn mark_for_pop(&mut self, coord: HexCoord) -> bool {
        match self.bubbles.get_mut(&coord) {
            Some(bubble) if !bubble.marked_for_pop => {
                bubble.marked_for_pop = true;
                true
            }
            _ => false,
        }
    }

    /// The in-bounds neighbor in one direction, if any.
    pub fn neighbor(&self, coord: HexCoord, direction: HexDirection) -> Option<HexCoord> {
        let neighbor = coord.neighbor(direction);
        self.contains(neighbor).then_some(neighbor)
    }

    /// In-bounds neighbors in angular order. Directions that leave the grid
    /// are skipped.
    pub fn neighbors(&self, coord: HexCoord) -> impl Iterator<Item = HexCoord> + '_ {
        HexDirection::ALL
            .into_iter()
            .filter_map(move |d| self.neighbor(coord, d))
    }

    pub fn cell_to_world(&self, coord: HexCoord) -> Vec2 {
        self.layout.cell_to_world(coord)
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    /// Iterate over all occupied cells.
    pub fn iter(&self) -> impl Iterator<Item = (&HexCoord, &Bubble)> {
        self.bubbles.iter()
    }

    /// Occupied coordinates in reading order, for deterministic traversal.
    pub fn sorted_coords(&self) -> Vec<HexCoord> {
        let mut coords: Vec<HexCoord> = self.bubbles.keys().copied().collect();
        coords.sort_by_key(HexCoord::reading_order);
        coords
    }

    /// Center y of the lowest bubble.
    pub fn lowest_bubble_y(&self) -> Option<f32> {
        self.bubbles
            .values()
            .map(|b| b.position.y)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Current y of row 0.
    pub fn origin_y(&self) -> f32 {
        self.layout.origin.y
    }

    /// Move the whole container vertically, keeping bubble positions in sync.
    pub fn set_origin_y(&mut self, y: f32) {
        self.layout.origin.y = y;
        let layout = self.layout;
        for (coord, bubble) in self.bubbles.iter_mut() {
            bubble.position = layout.cell_to_world(*coord);
        }
    }
}

impl Default for HexGrid {
    fn default() -> Self {
        Self::new(GridBounds::default(), HexLayout::default())
    }
}
