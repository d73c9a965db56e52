//! Clearing blast zones and chain reactions
//!
//! A pass removes the blast zone and lets every column fall. Falling blocks
//! may line up into new matches, so passes repeat until one finds nothing.

use crate::board::Grid;
use crate::matcher::{find_blast_zone, BlastZone};

/// Result of resolving a grid to rest
#[derive(Debug, Clone)]
pub struct Chain {
    /// The grid once no match remains
    pub grid: Grid,
    /// Number of cells cleared by each pass, in order
    pub passes: Vec<usize>,
}

#[cfg(test)]
impl Chain {
    /// Cells cleared over the whole chain
    pub fn cells_cleared(&self) -> usize {
        self.passes.iter().sum()
    }

    /// Score earned over the whole chain
    pub fn points(&self) -> u64 {
        self.cells_cleared() as u64 * crate::score::POINTS_PER_CELL
    }
}

/// Remove the zone's cells and compact every column
pub fn apply_pass(grid: &mut Grid, zone: &BlastZone) {
    grid.clear(zone);
    grid.compact();
}

/// Run passes until the grid holds no match.
///
/// Terminates: every pass with a non-empty zone removes at least one block
/// from a finite grid.
pub fn resolve_chain(mut grid: Grid) -> Chain {
    let mut passes = Vec::new();
    loop {
        let zone = find_blast_zone(&grid);
        if zone.is_empty() {
            return Chain { grid, passes };
        }
        passes.push(zone.len());
        apply_pass(&mut grid, &zone);
    }
}
