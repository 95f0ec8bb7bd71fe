//! Hexagonal coordinate system using offset coordinates (odd-r).
//!
//! Based on Red Blob Games' excellent guide:
//! https://www.redblobgames.com/grids/hexagons/
//!
//! Bubbles are packed in a "brick" layout: rows run downward from the top of
//! the container and odd rows are shifted right by half a bubble. Row `r + 1`
//! sits `diameter * sin 60°` below row `r`.

use bevy::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.register_type::<HexCoord>();
    app.register_type::<HexDirection>();
}

/// sin 60°, the vertical step between rows as a fraction of the diameter.
pub const SIN_60: f32 = 0.866_025_4;

/// cos 60°, the horizontal shift of odd rows as a fraction of the diameter.
pub const COS_60: f32 = 0.5;

/// Default bubble diameter in world units.
pub const BUBBLE_DIAMETER: f32 = 40.0;

/// The six neighbor directions, in counter-clockwise angular order starting
/// at East (0°).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum HexDirection {
    East,
    NorthEast,
    NorthWest,
    West,
    SouthWest,
    SouthEast,
}

impl HexDirection {
    /// All directions in angular order: 0°, 60°, ..., 300°.
    pub const ALL: [HexDirection; 6] = [
        HexDirection::East,
        HexDirection::NorthEast,
        HexDirection::NorthWest,
        HexDirection::West,
        HexDirection::SouthWest,
        HexDirection::SouthEast,
    ];

    /// Index of this direction in [`HexDirection::ALL`].
    pub const fn index(self) -> usize {
        match self {
            HexDirection::East => 0,
            HexDirection::NorthEast => 1,
            HexDirection::NorthWest => 2,
            HexDirection::West => 3,
            HexDirection::SouthWest => 4,
            HexDirection::SouthEast => 5,
        }
    }

    /// The direction pointing the other way.
    pub const fn opposite(self) -> Self {
        Self::ALL[(self.index() + 3) % 6]
    }

    /// World-space angle of this direction in degrees.
    pub fn degrees(self) -> f32 {
        self.index() as f32 * 60.0
    }

    /// Quantize an angle (degrees, any range) into the 60°-wide sector
    /// centred on one of the six directions.
    ///
    /// Sector `k` covers `[60k - 30, 60k + 30)`, so East owns `[330, 30)`.
    pub fn from_degrees(angle: f32) -> Self {
        let shifted = (angle + 30.0).rem_euclid(360.0);
        let sector = (shifted / 60.0).floor() as usize;
        Self::ALL[sector.min(5)]
    }
}

/// Offset hex coordinate (odd-r system).
///
/// - `col` increases to the right
/// - `row` increases downward
/// - odd rows are shifted right by half a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub struct HexCoord {
    pub col: i32,
    pub row: i32,
}

impl HexCoord {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    #[inline]
    pub const fn is_odd_row(&self) -> bool {
        self.row.rem_euclid(2) == 1
    }

    /// The neighbor in one direction, ignoring grid bounds.
    ///
    /// Odd rows are shifted right, so the diagonal offsets depend on parity.
    pub fn neighbor(&self, direction: HexDirection) -> HexCoord {
        let (col, row) = (self.col, self.row);
        if self.is_odd_row() {
            match direction {
                HexDirection::East => HexCoord::new(col + 1, row),
                HexDirection::NorthEast => HexCoord::new(col + 1, row - 1),
                HexDirection::NorthWest => HexCoord::new(col, row - 1),
                HexDirection::West => HexCoord::new(col - 1, row),
                HexDirection::SouthWest => HexCoord::new(col, row + 1),
                HexDirection::SouthEast => HexCoord::new(col + 1, row + 1),
            }
        } else {
            match direction {
                HexDirection::East => HexCoord::new(col + 1, row),
                HexDirection::NorthEast => HexCoord::new(col, row - 1),
                HexDirection::NorthWest => HexCoord::new(col - 1, row - 1),
                HexDirection::West => HexCoord::new(col - 1, row),
                HexDirection::SouthWest => HexCoord::new(col - 1, row + 1),
                HexDirection::SouthEast => HexCoord::new(col, row + 1),
            }
        }
    }

    /// All 6 neighboring coordinates in angular order, ignoring bounds.
    pub fn neighbors(&self) -> [HexCoord; 6] {
        HexDirection::ALL.map(|d| self.neighbor(d))
    }

    /// Sort key that orders coordinates top-to-bottom, then left-to-right.
    pub const fn reading_order(&self) -> (i32, i32) {
        (self.row, self.col)
    }
}

impl std::fmt::Display for HexCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// Maps grid coordinates to world positions and back.
///
/// `origin` is the world position of cell `(0, 0)`. World y grows upward, so
/// rows further down the grid have smaller y values.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct HexLayout {
    pub diameter: f32,
    pub origin: Vec2,
}

impl HexLayout {
    pub const fn new(diameter: f32, origin: Vec2) -> Self {
        Self { diameter, origin }
    }

    /// Layout for a grid `width` cells wide, centred on x = 0 with row 0 at
    /// `top_row_y`.
    pub fn centered(diameter: f32, width: i32, top_row_y: f32) -> Self {
        let origin_x = -((width - 1) as f32) * 0.5 * diameter;
        Self::new(diameter, Vec2::new(origin_x, top_row_y))
    }

    pub fn radius(&self) -> f32 {
        self.diameter * 0.5
    }

    /// Vertical distance between adjacent rows.
    pub fn row_step(&self) -> f32 {
        self.diameter * SIN_60
    }

    /// Center of a cell in world coordinates.
    pub fn cell_to_world(&self, coord: HexCoord) -> Vec2 {
        let row_offset = if coord.is_odd_row() {
            self.diameter * COS_60
        } else {
            0.0
        };
        Vec2::new(
            self.origin.x + coord.col as f32 * self.diameter + row_offset,
            self.origin.y - coord.row as f32 * self.row_step(),
        )
    }

    /// The nearest cell whose center lies within one radius of `pos`.
    ///
    /// Points in the gaps between three packed circles map to no cell.
    pub fn world_to_cell(&self, pos: Vec2) -> Option<HexCoord> {
        let approx_row = ((self.origin.y - pos.y) / self.row_step()).round() as i32;

        let mut best: Option<(f32, HexCoord)> = None;
        for row in approx_row - 1..=approx_row + 1 {
            let row_offset = if row.rem_euclid(2) == 1 {
                self.diameter * COS_60
            } else {
                0.0
            };
            let col = ((pos.x - self.origin.x - row_offset) / self.diameter).round() as i32;
            let coord = HexCoord::new(col, row);
            let distance = self.cell_to_world(coord).distance(pos);
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, coord));
            }
        }

        best.filter(|(distance, _)| *distance <= self.radius())
            .map(|(_, coord)| coord)
    }
}

impl Default for HexLayout {
    fn default() -> Self {
        Self::new(BUBBLE_DIAMETER, Vec2::ZERO)
    }
}
