//! Palette Module
//! Deterministically shuffled bar colors.

use plotters::style::RGBColor;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Pastel qualitative palette (9 colors).
pub const PASTEL1: [RGBColor; 9] = [
    RGBColor(251, 180, 174), // Red
    RGBColor(179, 205, 227), // Blue
    RGBColor(204, 235, 197), // Green
    RGBColor(222, 203, 228), // Purple
    RGBColor(254, 217, 166), // Orange
    RGBColor(255, 255, 204), // Yellow
    RGBColor(229, 216, 189), // Tan
    RGBColor(253, 218, 236), // Pink
    RGBColor(242, 242, 242), // Grey
];

/// Ordered colors. Index 0 is reserved for unsegmented bars.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<RGBColor>,
}

impl Palette {
    pub fn new(colors: Vec<RGBColor>) -> Self {
        Self { colors }
    }

    /// Permute `colors` with a PRNG seeded from `seed`, so repeated runs agree.
    pub fn shuffled(colors: &[RGBColor], seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut colors = colors.to_vec();
        colors.shuffle(&mut rng);
        Self { colors }
    }

    pub fn colors(&self) -> &[RGBColor] {
        &self.colors
    }

    pub fn whole_bar(&self) -> Option<RGBColor> {
        self.colors.first().copied()
    }

    /// Color of the `position`-th segment in a stack.
    pub fn segment(&self, position: usize) -> Option<RGBColor> {
        self.colors.get(1 + position).copied()
    }

    /// How many segments a single stack can color.
    pub fn segment_capacity(&self) -> usize {
        self.colors.len().saturating_sub(1)
    }
}
