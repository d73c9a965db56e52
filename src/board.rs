//! Game grid representation, piece placement and column gravity

use crate::color::BlockColor;
use crate::matcher::BlastZone;
use crate::piece::Piece;

/// Grid dimensions
pub const GRID_WIDTH: usize = 10;
pub const GRID_HEIGHT: usize = 20;

/// A cell on the grid - either empty or filled with a color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(BlockColor),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Cell::Filled(_))
    }

    /// The color held by this cell, if any
    pub fn color(&self) -> Option<BlockColor> {
        match self {
            Cell::Filled(color) => Some(*color),
            Cell::Empty => None,
        }
    }
}

/// The playing grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// Stored as [row][col], row 0 is the top row
    cells: [[Cell; GRID_WIDTH]; GRID_HEIGHT],
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    /// Create a new empty grid
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; GRID_WIDTH]; GRID_HEIGHT],
        }
    }

    /// Get the cell at a position (row, col)
    /// Returns None if out of bounds
    pub fn get(&self, row: i32, col: i32) -> Option<Cell> {
        if row < 0 || col < 0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        if row >= GRID_HEIGHT || col >= GRID_WIDTH {
            return None;
        }
        Some(self.cells[row][col])
    }

    /// Set a cell at a position
    /// Returns false if out of bounds
    pub fn set(&mut self, row: i32, col: i32, cell: Cell) -> bool {
        if row < 0 || col < 0 {
            return false;
        }
        let (row, col) = (row as usize, col as usize);
        if row >= GRID_HEIGHT || col >= GRID_WIDTH {
            return false;
        }
        self.cells[row][col] = cell;
        true
    }

    /// True if the position is inside the grid and holds a block
    pub fn is_occupied(&self, row: i32, col: i32) -> bool {
        self.get(row, col).is_some_and(|cell| cell.is_filled())
    }

    /// Write a piece's colors into the grid at its current position.
    /// Cells below the bottom row are dropped.
    pub fn place(&mut self, piece: &Piece) {
        for (row, col, color) in piece.cells() {
            if row < GRID_HEIGHT as i32 {
                self.set(row, col, Cell::Filled(color));
            }
        }
    }

    /// Empty every cell in the blast zone
    pub fn clear(&mut self, zone: &BlastZone) {
        for (row, col) in zone.iter() {
            self.cells[row][col] = Cell::Empty;
        }
    }

    /// Let every column fall so that its blocks rest at the bottom with no
    /// gaps, keeping their top-to-bottom order
    pub fn compact(&mut self) {
        for col in 0..GRID_WIDTH {
            let mut empty_below = 0;
            for row in (0..GRID_HEIGHT).rev() {
                if self.cells[row][col].is_empty() {
                    empty_below += 1;
                } else if empty_below > 0 {
                    self.cells[row + empty_below][col] = self.cells[row][col];
                    self.cells[row][col] = Cell::Empty;
                }
            }
        }
    }

    /// Check if the grid is completely empty
    pub fn is_empty(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(|cell| cell.is_empty()))
    }

    /// Number of filled cells
    #[cfg(test)]
    pub fn filled_count(&self) -> usize {
        self.cells
            .iter()
            .map(|row| row.iter().filter(|cell| cell.is_filled()).count())
            .sum()
    }

    /// Iterate over rows from top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell; GRID_WIDTH]> {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::BlockColor::*;

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new();
        assert!(grid.is_empty());
        assert_eq!(grid.rows().count(), GRID_HEIGHT);
        assert!(grid.rows().all(|row| row.len() == GRID_WIDTH));
    }

    #[test]
    fn test_set_and_get() {
        let mut grid = Grid::new();
        assert!(grid.set(5, 5, Cell::Filled(Red)));
        assert_eq!(grid.get(5, 5), Some(Cell::Filled(Red)));
        assert!(grid.is_occupied(5, 5));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut grid = Grid::new();
        assert_eq!(grid.get(-1, 0), None);
        assert_eq!(grid.get(0, -1), None);
        assert_eq!(grid.get(GRID_HEIGHT as i32, 0), None);
        assert_eq!(grid.get(0, GRID_WIDTH as i32), None);
        assert!(!grid.set(GRID_HEIGHT as i32, 0, Cell::Filled(Red)));
        assert!(grid.is_empty());
    }

    #[test]
    fn test_place_writes_colors_top_to_bottom() {
        let mut grid = Grid::new();
        let piece = Piece::at(4, 3, [Red, Green, Blue]);
        grid.place(&piece);
        assert_eq!(grid.get(4, 3), Some(Cell::Filled(Red)));
        assert_eq!(grid.get(5, 3), Some(Cell::Filled(Green)));
        assert_eq!(grid.get(6, 3), Some(Cell::Filled(Blue)));
        assert_eq!(grid.filled_count(), 3);
    }

    #[test]
    fn test_place_clips_below_bottom() {
        let mut grid = Grid::new();
        let piece = Piece::at(GRID_HEIGHT as i32 - 1, 0, [Red, Green, Blue]);
        grid.place(&piece);
        assert_eq!(grid.get(GRID_HEIGHT as i32 - 1, 0), Some(Cell::Filled(Red)));
        assert_eq!(grid.filled_count(), 1);
    }

    #[test]
    fn test_compact_closes_gaps_and_keeps_order() {
        let mut grid = Grid::new();
        grid.set(2, 0, Cell::Filled(Red));
        grid.set(7, 0, Cell::Filled(Green));
        grid.set(15, 0, Cell::Filled(Blue));
        grid.set(19, 1, Cell::Filled(Yellow));

        grid.compact();

        let bottom = GRID_HEIGHT as i32 - 1;
        assert_eq!(grid.get(bottom - 2, 0), Some(Cell::Filled(Red)));
        assert_eq!(grid.get(bottom - 1, 0), Some(Cell::Filled(Green)));
        assert_eq!(grid.get(bottom, 0), Some(Cell::Filled(Blue)));
        assert_eq!(grid.get(bottom, 1), Some(Cell::Filled(Yellow)));
        assert_eq!(grid.filled_count(), 4);

        // No column has an empty cell beneath a filled one
        for col in 0..GRID_WIDTH as i32 {
            let mut seen_block = false;
            for row in 0..GRID_HEIGHT as i32 {
                let filled = grid.is_occupied(row, col);
                assert!(!(seen_block && !filled), "gap in column {col}");
                seen_block |= filled;
            }
        }
    }

    #[test]
    fn test_clear_empties_zone() {
        let mut grid = Grid::new();
        grid.set(19, 0, Cell::Filled(Red));
        grid.set(19, 1, Cell::Filled(Red));
        let zone: BlastZone = [(19, 0)].into_iter().collect();
        grid.clear(&zone);
        assert!(grid.get(19, 0).unwrap().is_empty());
        assert!(grid.is_occupied(19, 1));
    }
}
