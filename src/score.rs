//! Score tracking
//!
//! Every cell removed by a resolve pass is worth a fixed number of points.
//! Chains earn nothing extra beyond the cells they clear.

/// Points awarded per cleared cell
pub const POINTS_PER_CELL: u64 = 10;

/// Scoring and play statistics for one game
#[derive(Debug, Clone, Default)]
pub struct Score {
    /// Current score
    pub points: u64,
    /// Total cells cleared
    pub cells: u32,
    /// Number of resolve passes that cleared something
    pub passes: u32,
    /// Pieces settled onto the grid
    pub pieces: u32,
    /// Most passes triggered by a single settle
    pub best_chain: u32,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pass that clears `cells` cells and return the points earned
    pub fn add_pass(&mut self, cells: usize) -> u64 {
        let earned = cells as u64 * POINTS_PER_CELL;
        self.points += earned;
        self.cells += cells as u32;
        self.passes += 1;
        earned
    }

    /// Record a settled piece
    pub fn add_piece(&mut self) {
        self.pieces += 1;
    }

    /// Record the length of a finished chain.
    /// Returns a label for display when the chain had more than one pass.
    pub fn finish_chain(&mut self, passes: u32) -> Option<String> {
        self.best_chain = self.best_chain.max(passes);
        (passes > 1).then(|| format!("Chain x{}", passes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_scores_ten_per_cell() {
        let mut score = Score::new();
        assert_eq!(score.add_pass(3), 30);
        assert_eq!(score.points, 30);
        assert_eq!(score.cells, 3);
    }

    #[test]
    fn test_score_never_decreases() {
        let mut score = Score::new();
        let mut last = score.points;
        for cells in [3, 5, 0, 7, 12] {
            score.add_pass(cells);
            assert!(score.points >= last);
            assert_eq!(score.points - last, cells as u64 * 10);
            last = score.points;
        }
    }

    #[test]
    fn test_chain_label() {
        let mut score = Score::new();
        assert_eq!(score.finish_chain(1), None);
        assert_eq!(score.finish_chain(3).as_deref(), Some("Chain x3"));
        score.finish_chain(2);
        assert_eq!(score.best_chain, 3);
    }
}
