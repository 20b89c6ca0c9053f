use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rayon::prelude::*;
use tracing::debug;

use crate::config::NoiseParams;
use crate::error::{Result, TerrainError};
use crate::seeds::TerrainSeeds;
use crate::tilemap::Tilemap;

// =============================================================================
// NOISE FIELD
// =============================================================================

/// Deterministic terrain height over integer grid coordinates.
///
/// Two fBm Perlin samplers with different seeds and octave counts form a fine
/// detail band and a broad shape band:
///
/// ```text
/// height(i, j) = (fine(i/s1, j/s1) + 0.5) * A1 + (broad(i/s2, j/s2) + 0.5) * A2
/// ```
///
/// Each sampler's `[-1, 1]` output is halved first, so the `+ 0.5` rebias
/// keeps both bands non-negative.
pub struct NoiseField {
    fine: Fbm<Perlin>,
    broad: Fbm<Perlin>,
    params: NoiseParams,
}

impl NoiseField {
    pub fn new(seeds: &TerrainSeeds, params: &NoiseParams) -> Self {
        let fine = Fbm::<Perlin>::new(seeds.fine_noise).set_octaves(params.octaves_fine);
        let broad = Fbm::<Perlin>::new(seeds.broad_noise).set_octaves(params.octaves_broad);
        Self {
            fine,
            broad,
            params: params.clone(),
        }
    }

    /// Height at cell `(i, j)`. Pure function of the seeds, parameters and coordinates.
    pub fn height(&self, i: usize, j: usize) -> f64 {
        let p = &self.params;
        let (x, y) = (i as f64, j as f64);

        let fine = 0.5 * self.fine.get([x / p.scale_fine, y / p.scale_fine]);
        let broad = 0.5 * self.broad.get([x / p.scale_broad, y / p.scale_broad]);

        (fine + 0.5) * p.amplitude_fine + (broad + 0.5) * p.amplitude_broad
    }

    /// Like [`height`](Self::height), but rejects non-finite samples.
    pub fn try_height(&self, i: usize, j: usize) -> Result<f64> {
        let h = self.height(i, j);
        if h.is_finite() {
            Ok(h)
        } else {
            Err(TerrainError::generation(
                "heightmap",
                format!("non-finite sample {h} at row {i}, col {j}"),
            ))
        }
    }

    /// One full row of `cols` heights.
    fn row(&self, i: usize, cols: usize) -> Result<Vec<f64>> {
        (0..cols).map(|j| self.try_height(i, j)).collect()
    }
}

// =============================================================================
// HEIGHTMAP BUILD
// =============================================================================

/// Build a `size` x `size` heightmap, one rayon task per row.
///
/// `threads: None` runs on the global pool (one worker per core); `Some(n)`
/// runs on a dedicated pool of `n` workers. Rows share nothing but the
/// read-only field, so the result does not depend on the pool size. Any
/// failing row fails the whole build.
pub fn build_heightmap(
    size: usize,
    field: &NoiseField,
    threads: Option<usize>,
) -> Result<Tilemap<f64>> {
    // Indexed parallel collect keeps rows in index order.
    let compute_rows = || -> Result<Vec<Vec<f64>>> {
        (0..size)
            .into_par_iter()
            .map(|i| field.row(i, size))
            .collect()
    };

    let rows = match threads {
        None => compute_rows()?,
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| {
                    TerrainError::generation("heightmap", format!("worker pool: {e}"))
                })?;
            pool.install(compute_rows)?
        }
    };
    debug!(rows = rows.len(), "heightmap rows computed");

    Tilemap::from_rows(rows).ok_or_else(|| {
        TerrainError::generation("heightmap", format!("rows are not {size} cells wide"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(seed: u32) -> NoiseField {
        NoiseField::new(&TerrainSeeds::new(seed, 32), &NoiseParams::default())
    }

    #[test]
    fn test_height_is_deterministic() {
        let a = field(17);
        let b = field(17);
        for (i, j) in [(0, 0), (5, 9), (31, 2), (400, 1200)] {
            assert_eq!(a.height(i, j).to_bits(), b.height(i, j).to_bits());
        }
    }

    #[test]
    fn test_height_stays_within_band_amplitudes() {
        let field = field(3);
        let params = NoiseParams::default();
        let max = params.amplitude_fine + params.amplitude_broad;
        for i in (0..2000).step_by(37) {
            for j in (0..2000).step_by(41) {
                let h = field.height(i, j);
                assert!(h.is_finite());
                assert!((-0.05 * max..=1.05 * max).contains(&h), "height {h} at ({i}, {j})");
            }
        }
    }

    #[test]
    fn test_origin_is_midpoint() {
        // Perlin noise is zero on lattice points, so both bands sit at their midpoint.
        let params = NoiseParams::default();
        let expected = 0.5 * params.amplitude_fine + 0.5 * params.amplitude_broad;
        assert!((field(99).height(0, 0) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = build_heightmap(16, &field(1), Some(1)).unwrap();
        let b = build_heightmap(16, &field(2), Some(1)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_build_matches_sequential_sampling() {
        let field = field(8);
        let heightmap = build_heightmap(24, &field, None).unwrap();
        assert_eq!(heightmap.rows, 24);
        assert_eq!(heightmap.cols, 24);
        for i in 0..24 {
            for (j, &h) in heightmap.row(i).iter().enumerate() {
                assert_eq!(h.to_bits(), field.height(i, j).to_bits());
            }
        }
    }

    #[test]
    fn test_build_independent_of_pool_size() {
        let field = field(12);
        let single = build_heightmap(40, &field, Some(1)).unwrap();
        let several = build_heightmap(40, &field, Some(4)).unwrap();
        let global = build_heightmap(40, &field, None).unwrap();
        assert_eq!(single, several);
        assert_eq!(single, global);
    }

    #[test]
    fn test_non_finite_sample_fails_build() {
        let params = NoiseParams {
            amplitude_fine: f64::INFINITY,
            ..NoiseParams::default()
        };
        let field = NoiseField::new(&TerrainSeeds::new(1, 4), &params);
        match build_heightmap(4, &field, Some(2)) {
            Err(TerrainError::GenerationFailure { stage, reason }) => {
                assert_eq!(stage, "heightmap");
                assert!(reason.contains("row"));
            }
            other => panic!("expected generation failure, got {other:?}"),
        }
    }
}
