//! Active falling piece logic
//!
//! A piece is a vertical stack of three colored cells in a single column.
//! Every movement builds a candidate piece, checks it against the grid, and
//! only then replaces the current one.

use crate::board::{Grid, GRID_HEIGHT, GRID_WIDTH};
use crate::color::BlockColor;

/// Number of cells in a piece
pub const PIECE_LEN: usize = 3;

/// An active falling piece
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    /// Row of the top cell, row 0 is the top of the grid
    pub row: i32,
    /// Column shared by all three cells
    pub col: i32,
    /// Colors from the top cell to the bottom cell
    pub colors: [BlockColor; PIECE_LEN],
}

impl Piece {
    /// Column every new piece spawns in
    pub const SPAWN_COL: i32 = (GRID_WIDTH / 2) as i32;

    /// Create a new piece at the spawn position
    pub fn new(colors: [BlockColor; PIECE_LEN]) -> Self {
        Self::at(0, Self::SPAWN_COL, colors)
    }

    /// Create a piece with its top cell at (row, col)
    pub fn at(row: i32, col: i32, colors: [BlockColor; PIECE_LEN]) -> Self {
        Self { row, col, colors }
    }

    /// Absolute (row, col, color) of each cell, top to bottom
    pub fn cells(&self) -> [(i32, i32, BlockColor); PIECE_LEN] {
        let mut cells = [(0, 0, self.colors[0]); PIECE_LEN];
        for (i, color) in self.colors.iter().enumerate() {
            cells[i] = (self.row + i as i32, self.col, *color);
        }
        cells
    }

    /// Whether this piece may occupy its position on the grid.
    ///
    /// Fails if the column is outside the grid, a cell is below the bottom
    /// row, or a cell overlaps a block. There is no top bound: pieces never
    /// rise above row 0.
    pub fn is_valid(&self, grid: &Grid) -> bool {
        if self.col < 0 || self.col >= GRID_WIDTH as i32 {
            return false;
        }
        self.cells().iter().all(|&(row, col, _)| {
            row < GRID_HEIGHT as i32 && !grid.is_occupied(row, col)
        })
    }

    /// Candidate moved sideways by `dx` columns
    pub fn shifted(&self, dx: i32) -> Self {
        Self { col: self.col + dx, ..*self }
    }

    /// Candidate one row lower
    pub fn lowered(&self) -> Self {
        Self { row: self.row + 1, ..*self }
    }

    /// Candidate with colors cycled downward: [a, b, c] becomes [c, a, b]
    pub fn rotated(&self) -> Self {
        let [a, b, c] = self.colors;
        Self { colors: [c, a, b], ..*self }
    }

    /// Replace self with the candidate if it is valid
    fn try_replace(&mut self, candidate: Self, grid: &Grid) -> bool {
        if candidate.is_valid(grid) {
            *self = candidate;
            true
        } else {
            false
        }
    }

    /// Try to move left, returns true if successful
    pub fn move_left(&mut self, grid: &Grid) -> bool {
        self.try_replace(self.shifted(-1), grid)
    }

    /// Try to move right, returns true if successful
    pub fn move_right(&mut self, grid: &Grid) -> bool {
        self.try_replace(self.shifted(1), grid)
    }

    /// Try to move down one row, returns true if successful
    pub fn move_down(&mut self, grid: &Grid) -> bool {
        self.try_replace(self.lowered(), grid)
    }

    /// Try to rotate the colors, returns true if successful
    pub fn rotate(&mut self, grid: &Grid) -> bool {
        self.try_replace(self.rotated(), grid)
    }

    /// Hard drop - move down as far as possible and return rows dropped
    pub fn hard_drop(&mut self, grid: &Grid) -> u32 {
        let mut distance = 0;
        while self.move_down(grid) {
            distance += 1;
        }
        distance
    }

    /// Row the top cell would rest on after a hard drop
    pub fn landing_row(&self, grid: &Grid) -> i32 {
        let mut ghost = *self;
        ghost.hard_drop(grid);
        ghost.row
    }
}
