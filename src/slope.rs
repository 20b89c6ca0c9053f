//! Slope-based terrain classification.
//!
//! The heightmap is differentiated along both axes (central differences inside,
//! one-sided differences on the border), and the gradient magnitude of each
//! cell picks one of four categories from contiguous threshold ranges.

use crate::config::SlopeThresholds;
use crate::tilemap::Tilemap;

/// Terrain class of a cell, ordered from flattest to steepest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum TerrainCategory {
    /// Soft surface, nearly level. Only category that gets decorations.
    #[default]
    FlatSoft = 0,
    /// Soft surface on gentle slopes.
    RollingSoft = 1,
    /// Hard surface with a mixed stone finish.
    SlopedHard = 2,
    /// Hard surface on cliffs.
    SteepHard = 3,
}

impl TerrainCategory {
    pub const ALL: [TerrainCategory; 4] = [
        TerrainCategory::FlatSoft,
        TerrainCategory::RollingSoft,
        TerrainCategory::SlopedHard,
        TerrainCategory::SteepHard,
    ];

    /// Stable numeric code (0..=3).
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Category for a gradient magnitude. The first matching range wins:
    /// `[0, rolling)`, `[rolling, sloped)`, `[sloped, steep)`, `[steep, inf)`.
    pub fn from_magnitude(magnitude: f64, thresholds: &SlopeThresholds) -> Self {
        if magnitude < thresholds.rolling {
            TerrainCategory::FlatSoft
        } else if magnitude < thresholds.sloped {
            TerrainCategory::RollingSoft
        } else if magnitude < thresholds.steep {
            TerrainCategory::SlopedHard
        } else {
            TerrainCategory::SteepHard
        }
    }
}

/// First differences of a heightmap along both axes.
pub struct GradientField {
    /// Change per cell along the row index.
    pub d_row: Tilemap<f64>,
    /// Change per cell along the column index.
    pub d_col: Tilemap<f64>,
    /// Euclidean norm of the two components.
    pub magnitude: Tilemap<f64>,
}

/// Difference at `k` along an axis of length `n`, reading values through `at`.
fn axis_difference(k: usize, n: usize, at: impl Fn(usize) -> f64) -> f64 {
    if n < 2 {
        0.0
    } else if k == 0 {
        at(1) - at(0)
    } else if k == n - 1 {
        at(n - 1) - at(n - 2)
    } else {
        (at(k + 1) - at(k - 1)) / 2.0
    }
}

/// Compute the gradient of `heightmap`.
pub fn gradient(heightmap: &Tilemap<f64>) -> GradientField {
    let (rows, cols) = (heightmap.rows, heightmap.cols);

    let d_row = Tilemap::from_fn(rows, cols, |i, j| {
        axis_difference(i, rows, |k| *heightmap.get(k, j))
    });
    let d_col = Tilemap::from_fn(rows, cols, |i, j| {
        axis_difference(j, cols, |k| *heightmap.get(i, k))
    });
    let magnitude =
        Tilemap::from_fn(rows, cols, |i, j| d_row.get(i, j).hypot(*d_col.get(i, j)));

    GradientField { d_row, d_col, magnitude }
}

/// Classify every cell of `heightmap` by its gradient magnitude.
pub fn classify(
    heightmap: &Tilemap<f64>,
    thresholds: &SlopeThresholds,
) -> Tilemap<TerrainCategory> {
    let field = gradient(heightmap);
    let magnitude = &field.magnitude;
    Tilemap::from_fn(magnitude.rows, magnitude.cols, |i, j| {
        TerrainCategory::from_magnitude(*magnitude.get(i, j), thresholds)
    })
}

/// Cell count per category, indexed by category code.
pub fn category_histogram(categories: &Tilemap<TerrainCategory>) -> [usize; 4] {
    let mut counts = [0usize; 4];
    for category in categories.values() {
        counts[category.code() as usize] += 1;
    }
    counts
}
