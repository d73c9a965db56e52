//! Block color palette
//!
//! Five colors, each equally likely when a piece is generated.

use rand::distributions::{Distribution, Standard};
use rand::Rng;
use ratatui::style::Color;

/// One of the five block colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
}

impl BlockColor {
    /// Every color in palette order
    pub const ALL: [BlockColor; 5] = [
        BlockColor::Red,
        BlockColor::Blue,
        BlockColor::Green,
        BlockColor::Yellow,
        BlockColor::Purple,
    ];

    /// Terminal color used to draw this block
    pub fn color(&self) -> Color {
        match self {
            BlockColor::Red => Color::Rgb(0xf8, 0x71, 0x71),
            BlockColor::Blue => Color::Rgb(0x60, 0xa5, 0xfa),
            BlockColor::Green => Color::Rgb(0x4a, 0xde, 0x80),
            BlockColor::Yellow => Color::Rgb(0xfa, 0xcc, 0x15),
            BlockColor::Purple => Color::Rgb(0xa7, 0x8b, 0xfa),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlockColor::Red => "red",
            BlockColor::Blue => "blue",
            BlockColor::Green => "green",
            BlockColor::Yellow => "yellow",
            BlockColor::Purple => "purple",
        }
    }
}

impl Distribution<BlockColor> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> BlockColor {
        BlockColor::ALL[rng.gen_range(0..BlockColor::ALL.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    #[test]
    fn test_palette_is_distinct() {
        let unique: HashSet<_> = BlockColor::ALL.iter().map(|c| c.color()).collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_sampling_reaches_every_color() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let seen: HashSet<BlockColor> = (0..500).map(|_| rng.r#gen()).collect();
        assert_eq!(seen.len(), BlockColor::ALL.len());
    }
}
