//! Aiming - the reflected flight path of a shot and the cell it will snap to.
//!
//! The solver casts a ray from the launch point, bouncing off the side walls,
//! until it touches a landed bubble. The impact angle around the hit bubble
//! picks which of its six neighbors the shot occupies. Solving is pure: the
//! same grid and aim always produce the same [`Trajectory`].

use bevy::prelude::*;

use super::{
    grid::HexGrid,
    hex::{HexCoord, HexDirection},
};

/// Default number of wall bounces a shot may take before it must land.
pub const DEFAULT_MAX_BOUNCES: u32 = 3;

/// Default travel length of a single ray cast.
pub const MAX_RAY_LENGTH: f32 = 800.0;

/// How far a reflected ray restarts off the wall, so the same wall is not
/// detected again.
pub const WALL_OFFSET: f32 = 0.01;

/// Clearance a snapped bubble needs from each wall, as a fraction of the
/// diameter.
const SNAP_WALL_CLEARANCE: f32 = 0.4;

/// The region a shot travels through.
///
/// `left`/`right` are the wall lines the projectile center reflects off and
/// `top` is the visible play boundary. Nothing lands above `top`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayArea {
    pub left: f32,
    pub right: f32,
    pub top: f32,
}

/// One straight piece of a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
    /// The segment ends on a wall and the path reflects there.
    pub is_bounce: bool,
}

impl Segment {
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    pub fn direction(&self) -> Vec2 {
        (self.end - self.start).normalize_or_zero()
    }
}

/// Ordered segments from the launch point to where the shot stops.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    pub segments: Vec<Segment>,
}

impl Path {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn bounces(&self) -> usize {
        self.segments.iter().filter(|s| s.is_bounce).count()
    }

    pub fn end(&self) -> Option<Vec2> {
        self.segments.last().map(|s| s.end)
    }
}

/// Where a shot will land.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snap {
    pub cell: HexCoord,
    /// World center of `cell`.
    pub position: Vec2,
    /// The landed bubble the shot touched.
    pub hit: HexCoord,
}

/// Result of solving an aim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub path: Path,
    /// `None` when the shot must be re-aimed.
    pub snap: Option<Snap>,
}

/// Computes reflected paths against a grid snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectorySolver {
    pub area: PlayArea,
    pub max_bounces: u32,
    pub max_ray_length: f32,
    pub wall_offset: f32,
    /// Collision radius of landed bubbles as seen by the aim ray.
    pub hit_radius: f32,
}

enum Contact {
    Wall { normal: Vec2 },
    Ceiling,
    Bubble { coord: HexCoord },
}

impl TrajectorySolver {
    pub fn new(area: PlayArea, hit_radius: f32) -> Self {
        Self {
            area,
            max_bounces: DEFAULT_MAX_BOUNCES,
            max_ray_length: MAX_RAY_LENGTH,
            wall_offset: WALL_OFFSET,
            hit_radius,
        }
    }

    pub fn with_max_bounces(mut self, max_bounces: u32) -> Self {
        self.max_bounces = max_bounces;
        self
    }

    pub fn with_max_ray_length(mut self, max_ray_length: f32) -> Self {
        self.max_ray_length = max_ray_length;
        self
    }

    pub fn with_wall_offset(mut self, wall_offset: f32) -> Self {
        self.wall_offset = wall_offset;
        self
    }

    /// Solve the path for a shot fired from `origin` towards `direction`.
    ///
    /// Shots that do not point upward produce an empty trajectory.
    pub fn solve(&self, grid: &HexGrid, origin: Vec2, direction: Vec2) -> Trajectory {
        let mut dir = direction.normalize_or_zero();
        if dir.y <= 0.0 {
            return Trajectory::default();
        }

        let mut path = Path::default();
        let mut pos = origin;

        for cast in 0..=self.max_bounces {
            let Some((distance, contact)) = self.cast(grid, pos, dir) else {
                // Nothing within reach of this cast.
                path.segments.push(Segment {
                    start: pos,
                    end: pos + dir * self.max_ray_length,
                    is_bounce: false,
                });
                return Trajectory { path, snap: None };
            };

            let point = pos + dir * distance;
            match contact {
                Contact::Bubble { coord } => {
                    path.segments.push(Segment {
                        start: pos,
                        end: point,
                        is_bounce: false,
                    });
                    let snap = self.snap(grid, coord, point);
                    return Trajectory { path, snap };
                }
                Contact::Ceiling => {
                    path.segments.push(Segment {
                        start: pos,
                        end: point,
                        is_bounce: false,
                    });
                    return Trajectory { path, snap: None };
                }
                Contact::Wall { normal } => {
                    // The last cast stops at the wall instead of reflecting.
                    let is_bounce = cast < self.max_bounces;
                    path.segments.push(Segment {
                        start: pos,
                        end: point,
                        is_bounce,
                    });
                    if !is_bounce {
                        return Trajectory { path, snap: None };
                    }
                    dir = reflect(dir, normal).normalize_or_zero();
                    pos = point + dir * self.wall_offset;
                }
            }
        }

        Trajectory { path, snap: None }
    }

    /// Nearest contact along one ray within the cast length.
    fn cast(&self, grid: &HexGrid, pos: Vec2, dir: Vec2) -> Option<(f32, Contact)> {
        let mut nearest: Option<(f32, Contact)> = None;
        let mut consider = |distance: f32, contact: Contact| {
            if distance <= self.max_ray_length
                && nearest.as_ref().is_none_or(|(d, _)| distance < *d)
            {
                nearest = Some((distance, contact));
            }
        };

        if dir.x < 0.0 {
            let distance = (self.area.left - pos.x) / dir.x;
            if distance >= 0.0 {
                consider(distance, Contact::Wall { normal: Vec2::X });
            }
        } else if dir.x > 0.0 {
            let distance = (self.area.right - pos.x) / dir.x;
            if distance >= 0.0 {
                consider(distance, Contact::Wall { normal: Vec2::NEG_X });
            }
        }

        if dir.y > 0.0 && pos.y <= self.area.top {
            consider((self.area.top - pos.y) / dir.y, Contact::Ceiling);
        }

        // Reading order breaks exact ties so the result does not depend on
        // hash map iteration.
        let mut bubble_hit: Option<(f32, HexCoord)> = None;
        for (coord, bubble) in grid.iter() {
            if bubble.marked_for_pop {
                continue;
            }
            let Some(distance) = ray_circle(pos, dir, bubble.position, self.hit_radius) else {
                continue;
            };
            let closer = match bubble_hit {
                None => true,
                Some((best, best_coord)) => {
                    distance < best
                        || (distance == best && coord.reading_order() < best_coord.reading_order())
                }
            };
            if closer {
                bubble_hit = Some((distance, *coord));
            }
        }
        if let Some((distance, coord)) = bubble_hit {
            consider(distance, Contact::Bubble { coord });
        }

        nearest
    }

    /// Pick the neighbor of `hit` that faces the impact point, if a bubble may
    /// land there.
    fn snap(&self, grid: &HexGrid, hit: HexCoord, impact: Vec2) -> Option<Snap> {
        let center = grid.cell_to_world(hit);
        let outward = (impact - center).normalize_or_zero();
        let angle = outward.y.atan2(outward.x).to_degrees().rem_euclid(360.0);
        let cell = hit.neighbor(HexDirection::from_degrees(angle));

        if !grid.contains(cell) || grid.is_occupied(cell) {
            return None;
        }

        let position = grid.cell_to_world(cell);
        if position.y > self.area.top {
            return None;
        }

        let clearance = grid.layout().diameter * SNAP_WALL_CLEARANCE;
        if position.x - clearance < self.area.left || position.x + clearance > self.area.right {
            return None;
        }

        Some(Snap {
            cell,
            position,
            hit,
        })
    }
}

/// Reflect `dir` about a unit `normal`.
pub fn reflect(dir: Vec2, normal: Vec2) -> Vec2 {
    dir - 2.0 * dir.dot(normal) * normal
}

/// Distance along a unit ray to the surface of a circle, if it is hit ahead.
fn ray_circle(origin: Vec2, dir: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let m = origin - center;
    let b = m.dot(dir);
    let c = m.length_squared() - radius * radius;
    if c <= 0.0 {
        // Starting inside the circle counts as an immediate hit.
        return Some(0.0);
    }
    if b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some(-b - discriminant.sqrt())
}
