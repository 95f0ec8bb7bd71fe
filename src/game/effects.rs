//! Popping - the staggered pop sequence and the special bubble effects.
//!
//! A resolved cluster is split into normal and special bubbles. Normals pop
//! first, then specials, one every [`POP_STAGGER_SECS`]. A special's effect is
//! evaluated right after it pops and only ever enqueues more bubbles, so chains
//! of specials drain through the same queues instead of recursing.

use bevy::prelude::*;
use rand::Rng;
use std::collections::VecDeque;

use super::{
    bubble::SpecialKind,
    cluster::MatchSet,
    grid::HexGrid,
    hex::HexCoord,
    shooter::ShooterEvent,
};

/// Delay between two pops of the same sequence.
pub const POP_STAGGER_SECS: f32 = 0.1;

/// AreaClear reach in bubble diameters. 1.5 covers exactly the first ring.
pub const AREA_CLEAR_RADIUS_CELLS: f32 = 1.5;

/// Settings the pop sequence needs from the shooter config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopRules {
    pub stagger: f32,
    /// AreaClear reach in world units, center to center.
    pub area_radius: f32,
}

/// Bubbles a special effect wants popped, in reading order.
///
/// Marked bubbles are never selected. An empty result means the effect does
/// nothing.
pub fn effect_targets(
    kind: SpecialKind,
    trigger: Vec2,
    grid: &HexGrid,
    area_radius: f32,
    rng: &mut impl Rng,
) -> Vec<HexCoord> {
    let unmarked = grid
        .sorted_coords()
        .into_iter()
        .filter(|coord| grid.get(*coord).is_some_and(|b| !b.marked_for_pop));

    match kind {
        SpecialKind::None => Vec::new(),
        SpecialKind::AreaClear => unmarked
            .filter(|coord| grid.cell_to_world(*coord).distance(trigger) < area_radius)
            .collect(),
        SpecialKind::RandomClear => {
            let candidates: Vec<HexCoord> = unmarked
                .filter(|coord| grid.is_visible(grid.cell_to_world(*coord)))
                .collect();
            if candidates.is_empty() {
                return Vec::new();
            }
            vec![candidates[rng.random_range(0..candidates.len())]]
        }
    }
}

/// The queued pops of one resolution cycle.
///
/// Everything in the queues is marked on the grid, and nothing is queued
/// twice.
#[derive(Debug, Clone, Default)]
pub struct PopSequence {
    normal: VecDeque<HexCoord>,
    special: VecDeque<HexCoord>,
    /// Time banked towards the next pop.
    timer: f32,
    started: bool,
}

impl PopSequence {
    /// Queue a whole cluster.
    pub fn from_match(grid: &mut HexGrid, set: &MatchSet) -> Self {
        let mut sequence = Self::default();
        for &coord in &set.coords {
            sequence.enqueue(grid, coord);
        }
        sequence
    }

    /// Mark and queue one bubble. Returns `false` if it was already marked or
    /// the cell is empty.
    pub fn enqueue(&mut self, grid: &mut HexGrid, coord: HexCoord) -> bool {
        if !grid.mark_for_pop(coord) {
            return false;
        }
        let special = grid.get(coord).is_some_and(|b| b.is_special());
        if special {
            self.special.push_back(coord);
        } else {
            self.normal.push_back(coord);
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.normal.is_empty() && self.special.is_empty()
    }

    pub fn len(&self) -> usize {
        self.normal.len() + self.special.len()
    }

    /// Advance the stagger clock. The first pop happens on the first tick.
    ///
    /// Returns `true` once every queued bubble has popped.
    pub fn tick(
        &mut self,
        dt: f32,
        grid: &mut HexGrid,
        rules: PopRules,
        rng: &mut impl Rng,
        events: &mut Vec<ShooterEvent>,
    ) -> bool {
        if !self.started {
            self.started = true;
            self.pop_next(grid, rules, rng, events);
        } else {
            self.timer += dt;
        }

        while !self.is_empty() && self.timer >= rules.stagger {
            self.timer -= rules.stagger;
            self.pop_next(grid, rules, rng, events);
        }

        self.is_empty()
    }

    /// Pop the next bubble, normals before specials.
    fn pop_next(
        &mut self,
        grid: &mut HexGrid,
        rules: PopRules,
        rng: &mut impl Rng,
        events: &mut Vec<ShooterEvent>,
    ) {
        let Some(coord) = self.normal.pop_front().or_else(|| self.special.pop_front()) else {
            return;
        };
        let Some(bubble) = grid.remove(coord) else {
            return;
        };

        debug!("Popped {} {:?} at {}", bubble.id, bubble.bubble_type, coord);
        events.push(ShooterEvent::BubblePopped {
            id: bubble.id,
            bubble_type: bubble.bubble_type,
            position: bubble.position,
        });

        if !bubble.is_special() {
            return;
        }

        let targets = effect_targets(bubble.special, bubble.position, grid, rules.area_radius, rng);
        debug!("{:?} from {} queued {} bubbles", bubble.special, bubble.id, targets.len());
        for target in targets {
            if self.enqueue(grid, target) {
                events.push(ShooterEvent::PopIndicator {
                    from: bubble.position,
                    to: grid.cell_to_world(target),
                });
            }
        }
    }

    /// Drop the sequence, silently removing every bubble still waiting to pop
    /// so none stays marked on the grid.
    pub fn abort(self, grid: &mut HexGrid) -> usize {
        let mut removed = 0;
        for coord in self.normal.into_iter().chain(self.special) {
            if grid.remove(coord).is_some() {
                removed += 1;
            }
        }
        removed
    }
}
