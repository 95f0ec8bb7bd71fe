//! Cluster detection - finding matching bubbles.
//!
//! Uses flood fill (BFS) to find connected groups of same-type bubbles.
//! When a cluster of 3+ is found, it is handed to the pop sequence.

use bevy::prelude::*;
use std::collections::{HashSet, VecDeque};

use super::{bubble::BubbleType, grid::HexGrid, hex::HexCoord};

/// Minimum cluster size to pop (match-3).
pub const MIN_CLUSTER_SIZE: usize = 3;

/// Connected same-type bubbles found from one seed.
///
/// Used once by the pop sequence and then dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    pub bubble_type: Option<BubbleType>,
    /// Members in BFS order, seed first.
    pub coords: Vec<HexCoord>,
}

impl MatchSet {
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }
}

/// Find all connected bubbles of the seed's type using flood fill (BFS).
///
/// Only landed, visible and unmarked bubbles take part. Clusters smaller than
/// [`MIN_CLUSTER_SIZE`] come back empty.
pub fn find_cluster(grid: &HexGrid, seed: HexCoord) -> MatchSet {
    let matches = |coord: HexCoord, bubble_type: BubbleType| {
        grid.get(coord).is_some_and(|b| {
            b.bubble_type == bubble_type && !b.marked_for_pop && grid.is_visible(b.position)
        })
    };

    let Some(bubble_type) = grid.get(seed).map(|b| b.bubble_type) else {
        return MatchSet::default();
    };
    if !matches(seed, bubble_type) {
        return MatchSet::default();
    }

    let mut cluster = Vec::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();

    visited.insert(seed);
    queue.push_back(seed);

    while let Some(coord) = queue.pop_front() {
        cluster.push(coord);
        for neighbor in grid.neighbors(coord) {
            if visited.insert(neighbor) && matches(neighbor, bubble_type) {
                queue.push_back(neighbor);
            }
        }
    }

    if cluster.len() < MIN_CLUSTER_SIZE {
        return MatchSet::default();
    }

    debug!(
        "Found cluster of {} {:?} bubbles at {}",
        cluster.len(),
        bubble_type,
        seed
    );

    MatchSet {
        bubble_type: Some(bubble_type),
        coords: cluster,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        bubble::{BubbleSpawner, SpecialKind},
        grid::GridBounds,
        hex::HexLayout,
    };

    fn grid_from(cells: &[(i32, i32, BubbleType)]) -> HexGrid {
        let mut grid = HexGrid::new(GridBounds::new(11, 10).unwrap(), HexLayout::default());
        let mut spawner = BubbleSpawner::default();
        for &(col, row, bubble_type) in cells {
            grid.insert(
                HexCoord::new(col, row),
                spawner.spawn(bubble_type, SpecialKind::None, Vec2::ZERO),
            )
            .unwrap();
        }
        grid
    }

    #[test]
    fn pair_is_not_a_cluster() {
        let grid = grid_from(&[(0, 0, BubbleType::Red), (1, 0, BubbleType::Red)]);
        assert!(find_cluster(&grid, HexCoord::new(0, 0)).is_empty());
    }

    #[test]
    fn cluster_follows_same_type_adjacency_only() {
        let grid = grid_from(&[
            (0, 0, BubbleType::Red),
            (1, 0, BubbleType::Red),
            (2, 0, BubbleType::Cyan),
            (3, 0, BubbleType::Red),
            (0, 1, BubbleType::Red),
            (1, 2, BubbleType::Red),
        ]);

        let set = find_cluster(&grid, HexCoord::new(1, 0));
        assert_eq!(set.bubble_type, Some(BubbleType::Red));
        let mut coords = set.coords.clone();
        coords.sort_by_key(HexCoord::reading_order);
        // (3, 0) is cut off by the cyan bubble. (1, 2) hangs off (0, 1).
        assert_eq!(
            coords,
            vec![
                HexCoord::new(0, 0),
                HexCoord::new(1, 0),
                HexCoord::new(0, 1),
                HexCoord::new(1, 2),
            ]
        );
        for coord in &set.coords {
            assert_eq!(grid.get(*coord).unwrap().bubble_type, BubbleType::Red);
        }
    }

    #[test]
    fn marked_bubbles_do_not_match() {
        let mut grid = grid_from(&[
            (0, 0, BubbleType::Red),
            (1, 0, BubbleType::Red),
            (2, 0, BubbleType::Red),
        ]);
        assert_eq!(find_cluster(&grid, HexCoord::new(0, 0)).len(), 3);
        grid.mark_for_pop(HexCoord::new(2, 0));
        assert!(find_cluster(&grid, HexCoord::new(0, 0)).is_empty());
    }

    #[test]
    fn hidden_bubbles_do_not_match() {
        let grid = grid_from(&[
            (0, 0, BubbleType::Red),
            (1, 0, BubbleType::Red),
            (0, 1, BubbleType::Red),
        ])
        .with_visible_top(-10.0);
        // Row 0 sits at y = 0, above the visible top.
        assert!(find_cluster(&grid, HexCoord::new(0, 1)).is_empty());
    }

    #[test]
    fn empty_seed_finds_nothing() {
        let grid = grid_from(&[(1, 0, BubbleType::Red)]);
        assert!(find_cluster(&grid, HexCoord::new(5, 5)).is_empty());
    }

    #[test]
    fn result_is_deterministic() {
        let grid = grid_from(&[
            (2, 2, BubbleType::Green),
            (3, 2, BubbleType::Green),
            (2, 3, BubbleType::Green),
            (3, 3, BubbleType::Green),
            (2, 4, BubbleType::Green),
        ]);
        let first = find_cluster(&grid, HexCoord::new(2, 2));
        assert_eq!(first.len(), 5);
        for _ in 0..10 {
            assert_eq!(find_cluster(&grid, HexCoord::new(2, 2)), first);
        }
    }
}
