//! Match detection
//!
//! A match is three or more equal colors in a straight vertical or
//! horizontal line. Every cell of a match is cleared together with each
//! filled cell touching it, whatever its color.

use crate::board::{Grid, GRID_HEIGHT, GRID_WIDTH};
use std::collections::BTreeSet;

/// Shortest run that counts as a match
pub const MIN_RUN: usize = 3;

/// Cells removed by one resolve pass, as (row, col)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlastZone {
    cells: BTreeSet<(usize, usize)>,
}

impl BlastZone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, row: usize, col: usize) -> bool {
        self.cells.insert((row, col))
    }

    #[cfg(test)]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.cells.contains(&(row, col))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells.iter().copied()
    }
}

impl FromIterator<(usize, usize)> for BlastZone {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

fn color_at(grid: &Grid, row: usize, col: usize) -> Option<crate::color::BlockColor> {
    grid.get(row as i32, col as i32).and_then(|cell| cell.color())
}

/// Every cell that belongs to a run of at least `MIN_RUN` equal colors
pub fn find_runs(grid: &Grid) -> BlastZone {
    let mut matched = BlastZone::new();

    // Vertical runs
    for col in 0..GRID_WIDTH {
        let mut row = 0;
        while row < GRID_HEIGHT {
            let Some(color) = color_at(grid, row, col) else {
                row += 1;
                continue;
            };
            let mut end = row + 1;
            while end < GRID_HEIGHT && color_at(grid, end, col) == Some(color) {
                end += 1;
            }
            if end - row >= MIN_RUN {
                for r in row..end {
                    matched.insert(r, col);
                }
            }
            row = end;
        }
    }

    // Horizontal runs
    for row in 0..GRID_HEIGHT {
        let mut col = 0;
        while col < GRID_WIDTH {
            let Some(color) = color_at(grid, row, col) else {
                col += 1;
                continue;
            };
            let mut end = col + 1;
            while end < GRID_WIDTH && color_at(grid, row, end) == Some(color) {
                end += 1;
            }
            if end - col >= MIN_RUN {
                for c in col..end {
                    matched.insert(row, c);
                }
            }
            col = end;
        }
    }

    matched
}

/// Matched cells plus every filled 4-neighbor of a matched cell.
/// Empty when the grid has no match.
pub fn find_blast_zone(grid: &Grid) -> BlastZone {
    let matched = find_runs(grid);
    let mut zone = matched.clone();

    for (row, col) in matched.iter() {
        let (r, c) = (row as i32, col as i32);
        for (nr, nc) in [(r - 1, c), (r + 1, c), (r, c - 1), (r, c + 1)] {
            if grid.is_occupied(nr, nc) {
                zone.insert(nr as usize, nc as usize);
            }
        }
    }

    zone
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;
    use crate::color::BlockColor::{self, *};

    fn fill(grid: &mut Grid, cells: &[(i32, i32, BlockColor)]) {
        for &(row, col, color) in cells {
            grid.set(row, col, Cell::Filled(color));
        }
    }

    #[test]
    fn test_empty_grid_has_no_zone() {
        assert!(find_blast_zone(&Grid::new()).is_empty());
    }

    #[test]
    fn test_two_in_a_row_is_not_a_match() {
        let mut grid = Grid::new();
        fill(&mut grid, &[(19, 0, Red), (19, 1, Red), (18, 0, Red)]);
        assert!(find_blast_zone(&grid).is_empty());
    }

    #[test]
    fn test_horizontal_triple_on_empty_grid() {
        let mut grid = Grid::new();
        fill(&mut grid, &[(10, 2, Blue), (10, 3, Blue), (10, 4, Blue)]);
        let zone = find_blast_zone(&grid);
        let expected: BlastZone = [(10, 2), (10, 3), (10, 4)].into_iter().collect();
        assert_eq!(zone, expected);
    }

    #[test]
    fn test_blast_radius_takes_any_color_neighbor() {
        let mut grid = Grid::new();
        fill(
            &mut grid,
            &[
                (19, 2, Blue),
                (19, 3, Blue),
                (19, 4, Blue),
                (18, 3, Red),    // above the middle
                (19, 5, Green),  // right of the run
                (17, 3, Yellow), // two away, untouched
            ],
        );
        let zone = find_blast_zone(&grid);
        assert_eq!(zone.len(), 5);
        assert!(zone.contains(18, 3));
        assert!(zone.contains(19, 5));
        assert!(!zone.contains(17, 3));
        // Empty neighbors never join
        assert!(!zone.contains(18, 2));
    }

    #[test]
    fn test_run_of_five_clears_all_five() {
        let mut grid = Grid::new();
        for col in 0..5 {
            grid.set(19, col, Cell::Filled(Purple));
        }
        let zone = find_runs(&grid);
        assert_eq!(zone.len(), 5);
        assert_eq!(find_blast_zone(&grid).len(), 5);
    }

    #[test]
    fn test_long_vertical_run() {
        let mut grid = Grid::new();
        for row in 14..20 {
            grid.set(row, 7, Cell::Filled(Green));
        }
        assert_eq!(find_runs(&grid).len(), 6);
    }

    #[test]
    fn test_cross_counts_shared_cell_once() {
        let mut grid = Grid::new();
        fill(
            &mut grid,
            &[
                (17, 4, Red),
                (18, 4, Red),
                (19, 4, Red),
                (19, 3, Red),
                (19, 5, Red),
            ],
        );
        let zone = find_blast_zone(&grid);
        assert_eq!(zone.len(), 5);
    }

    #[test]
    fn test_separate_runs_found_in_one_pass() {
        let mut grid = Grid::new();
        for row in 17..20 {
            grid.set(row, 0, Cell::Filled(Yellow));
            grid.set(row, 2, Cell::Filled(Yellow));
        }
        let zone = find_blast_zone(&grid);
        assert_eq!(zone.len(), 6);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let mut grid = Grid::new();
        fill(
            &mut grid,
            &[(19, 0, Red), (19, 1, Red), (19, 2, Red), (18, 1, Blue), (18, 2, Green)],
        );
        assert_eq!(find_blast_zone(&grid), find_blast_zone(&grid.clone()));
    }
}
