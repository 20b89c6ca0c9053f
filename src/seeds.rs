//! Seed management for terrain generation
//!
//! A run has one 32-bit base seed, the width the noise samplers take. The two
//! noise bands use `seed` and `seed + 1` (wrapping); per-cell surface
//! decisions (stone variant, grass decoration) draw from an RNG keyed by the
//! cell coordinates, so each choice is independent of iteration order and of
//! any global random state.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Range that generated seeds are drawn from when none is supplied.
pub const GENERATED_SEED_RANGE: std::ops::RangeInclusive<u32> = 1..=10_000;

/// Purpose tags that keep per-cell decision streams apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellPurpose {
    /// Stone versus cobblestone on sloped cells.
    SurfaceVariant,
    /// Short grass on flat cells.
    Decoration,
}

impl CellPurpose {
    fn tag(self) -> u64 {
        match self {
            CellPurpose::SurfaceVariant => 0x5EED_0001,
            CellPurpose::Decoration => 0x5EED_0002,
        }
    }
}

/// Seeds for every randomized part of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainSeeds {
    /// Base seed, reported to the user so a run can be repeated.
    pub master: u32,
    /// Fine-detail noise band.
    pub fine_noise: u32,
    /// Broad-shape noise band.
    pub broad_noise: u32,
    /// Per-cell surface decisions.
    pub surface: u64,
}

impl TerrainSeeds {
    /// Derive all sub-seeds from the base seed and the grid size.
    pub fn new(master: u32, grid_size: usize) -> Self {
        Self {
            master,
            fine_noise: master,
            broad_noise: master.wrapping_add(1),
            surface: derive_seed(u64::from(master), grid_size as u64),
        }
    }

    /// RNG dedicated to one cell and one decision.
    pub fn cell_rng(&self, row: usize, col: usize, purpose: CellPurpose) -> ChaCha8Rng {
        let mut key = derive_seed(self.surface, purpose.tag());
        key = derive_seed(key, row as u64);
        key = derive_seed(key, col as u64);
        ChaCha8Rng::seed_from_u64(key)
    }
}

/// Use the supplied seed, or draw a fresh one. The flag is true when generated.
pub fn resolve_seed(seed: Option<u32>) -> (u32, bool) {
    match seed {
        Some(seed) => (seed, false),
        None => (rand::thread_rng().gen_range(GENERATED_SEED_RANGE), true),
    }
}

/// Mix a value into a seed (splitmix64 finalizer). Stable across platforms and
/// compiler versions, unlike `DefaultHasher`.
fn derive_seed(seed: u64, value: u64) -> u64 {
    let mut z = seed ^ value.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl std::fmt::Display for TerrainSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TerrainSeeds {{ master: {}, fine: {}, broad: {}, surface: {} }}",
            self.master, self.fine_noise, self.broad_noise, self.surface,
        )
    }
}
