//! Run configuration with defaults and JSON persistence.
//!
//! Every field has a default, so a config file only needs the values it
//! changes. `validate` runs once before any computation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};

/// Highest octave count the fBm sampler accepts.
pub const MAX_OCTAVES: usize = 32;

/// Top-level configuration for one generation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Side length of the square grid, in cells.
    pub size: usize,
    /// Base seed. Generated and reported when absent.
    pub seed: Option<u32>,
    /// Worker threads for the heightmap build. `None` uses one per core.
    pub threads: Option<usize>,
    /// Noise bands.
    pub noise: NoiseParams,
    /// Slope classification thresholds.
    pub slope: SlopeThresholds,
    /// Instruction emission rules.
    pub emit: EmitSettings,
    /// Where and how output files are written.
    pub output: OutputSettings,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            size: 1000,
            seed: None,
            threads: None,
            noise: NoiseParams::default(),
            slope: SlopeThresholds::default(),
            emit: EmitSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

/// Parameters of the two noise bands that make up the heightmap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseParams {
    /// Coordinate divisor for the fine band (smaller = busier detail).
    pub scale_fine: f64,
    /// Coordinate divisor for the broad band.
    pub scale_broad: f64,
    /// Height contribution of the fine band.
    pub amplitude_fine: f64,
    /// Height contribution of the broad band.
    pub amplitude_broad: f64,
    pub octaves_fine: usize,
    pub octaves_broad: usize,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            scale_fine: 200.0,
            scale_broad: 800.0,
            amplitude_fine: 10.0,
            amplitude_broad: 150.0,
            octaves_fine: 3,
            octaves_broad: 1,
        }
    }
}

/// Gradient magnitude boundaries between the four terrain categories.
///
/// Magnitudes below `rolling` are flat, `[rolling, sloped)` rolling,
/// `[sloped, steep)` sloped, and anything from `steep` up is steep.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SlopeThresholds {
    pub rolling: f64,
    pub sloped: f64,
    pub steep: f64,
}

impl Default for SlopeThresholds {
    fn default() -> Self {
        Self {
            rolling: 0.02,
            sloped: 0.1,
            steep: 0.18,
        }
    }
}

/// Rules applied while turning cells into instructions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmitSettings {
    /// Surfaces below this elevation get flooded up to it.
    pub water_level: i64,
    /// Chance, in percent, that a dry flat cell gets short grass.
    pub grass_density: f64,
    /// Top of the air-clearing fill and of the boundary walls.
    pub ceiling: i64,
}

impl Default for EmitSettings {
    fn default() -> Self {
        Self {
            water_level: 60,
            grass_density: 100.0,
            ceiling: 200,
        }
    }
}

/// Directory structure the function files are written into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PackLayout {
    /// Function files directly in the output directory.
    #[default]
    Flat,
    /// A complete datapack: `pack.mcmeta` plus `data/<namespace>/function/`.
    Datapack,
}

/// Output location and naming.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputSettings {
    pub directory: PathBuf,
    /// Namespace used by `schedule function <namespace>:chunk_<i>`.
    pub namespace: String,
    pub layout: PackLayout,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("make"),
            namespace: "make".to_string(),
            layout: PackLayout::Flat,
        }
    }
}

impl TerrainConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| TerrainError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| TerrainError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject any configuration that cannot produce a valid run.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(TerrainError::invalid("size", "must be greater than 0"));
        }
        if self.threads == Some(0) {
            return Err(TerrainError::invalid("threads", "must be at least 1 when set"));
        }
        self.noise.validate()?;
        self.slope.validate()?;
        self.emit.validate()?;
        self.output.validate()
    }
}

impl NoiseParams {
    pub fn validate(&self) -> Result<()> {
        for (field, scale) in [
            ("noise.scale_fine", self.scale_fine),
            ("noise.scale_broad", self.scale_broad),
        ] {
            if !scale.is_finite() || scale <= 0.0 {
                let reason = format!("must be a positive number, got {scale}");
                return Err(TerrainError::invalid(field, reason));
            }
        }
        for (field, amplitude) in [
            ("noise.amplitude_fine", self.amplitude_fine),
            ("noise.amplitude_broad", self.amplitude_broad),
        ] {
            if !amplitude.is_finite() {
                return Err(TerrainError::invalid(field, "must be finite"));
            }
        }
        for (field, octaves) in [
            ("noise.octaves_fine", self.octaves_fine),
            ("noise.octaves_broad", self.octaves_broad),
        ] {
            if !(1..=MAX_OCTAVES).contains(&octaves) {
                let reason = format!("must be between 1 and {MAX_OCTAVES}, got {octaves}");
                return Err(TerrainError::invalid(field, reason));
            }
        }
        Ok(())
    }
}

impl SlopeThresholds {
    pub fn validate(&self) -> Result<()> {
        let values = [self.rolling, self.sloped, self.steep];
        if values.iter().any(|t| !t.is_finite()) {
            return Err(TerrainError::invalid("slope", "thresholds must be finite"));
        }
        if !(0.0 < self.rolling && self.rolling < self.sloped && self.sloped < self.steep) {
            return Err(TerrainError::invalid(
                "slope",
                format!(
                    "thresholds must satisfy 0 < rolling < sloped < steep, got {} / {} / {}",
                    self.rolling, self.sloped, self.steep
                ),
            ));
        }
        Ok(())
    }
}

impl EmitSettings {
    pub fn validate(&self) -> Result<()> {
        if self.water_level < 0 {
            let reason = format!("must not be negative, got {}", self.water_level);
            return Err(TerrainError::invalid("emit.water_level", reason));
        }
        if !(0.0..=100.0).contains(&self.grass_density) {
            return Err(TerrainError::invalid(
                "emit.grass_density",
                format!("must be within [0, 100], got {}", self.grass_density),
            ));
        }
        if self.ceiling <= 0 {
            let reason = format!("must be positive, got {}", self.ceiling);
            return Err(TerrainError::invalid("emit.ceiling", reason));
        }
        // Water above the ceiling would spill over the barrier walls.
        if self.water_level >= self.ceiling {
            let reason = format!(
                "must be below emit.ceiling ({}), got {}",
                self.ceiling, self.water_level
            );
            return Err(TerrainError::invalid("emit.water_level", reason));
        }
        Ok(())
    }
}

impl OutputSettings {
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(TerrainError::invalid("output.namespace", "must not be empty"));
        }
        let valid = self
            .namespace
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(TerrainError::invalid(
                "output.namespace",
                format!("may only contain [a-z0-9_.-], got {:?}", self.namespace),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(config: &TerrainConfig, expected_field: &str) {
        match config.validate() {
            Err(TerrainError::InvalidConfiguration { field, .. }) => {
                assert_eq!(field, expected_field)
            }
            other => panic!("expected invalid `{expected_field}`, got {other:?}"),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(TerrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_grid() {
        let config = TerrainConfig { size: 0, ..Default::default() };
        assert_invalid(&config, "size");
    }

    #[test]
    fn test_rejects_negative_water_level() {
        let mut config = TerrainConfig::default();
        config.emit.water_level = -1;
        assert_invalid(&config, "emit.water_level");
    }

    #[test]
    fn test_rejects_water_at_or_above_ceiling() {
        let mut config = TerrainConfig::default();
        config.emit.ceiling = 100;
        config.emit.water_level = 100;
        assert_invalid(&config, "emit.water_level");
        config.emit.water_level = 150;
        assert_invalid(&config, "emit.water_level");
        config.emit.water_level = 99;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_seed_must_fit_noise_seed_width() {
        let config: TerrainConfig = serde_json::from_str(r#"{ "seed": 4294967295 }"#).unwrap();
        assert_eq!(config.seed, Some(u32::MAX));
        assert!(serde_json::from_str::<TerrainConfig>(r#"{ "seed": 4294967296 }"#).is_err());
    }

    #[test]
    fn test_rejects_density_out_of_range() {
        let mut config = TerrainConfig::default();
        config.emit.grass_density = 100.5;
        assert_invalid(&config, "emit.grass_density");
        config.emit.grass_density = -0.1;
        assert_invalid(&config, "emit.grass_density");
        config.emit.grass_density = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_monotonic_thresholds() {
        let mut config = TerrainConfig::default();
        config.slope = SlopeThresholds { rolling: 0.1, sloped: 0.1, steep: 0.18 };
        assert_invalid(&config, "slope");
        config.slope = SlopeThresholds { rolling: 0.0, sloped: 0.1, steep: 0.18 };
        assert_invalid(&config, "slope");
        config.slope = SlopeThresholds { rolling: 0.02, sloped: 0.1, steep: f64::NAN };
        assert_invalid(&config, "slope");
    }

    #[test]
    fn test_rejects_bad_scales_and_threads() {
        let mut config = TerrainConfig::default();
        config.noise.scale_broad = 0.0;
        assert_invalid(&config, "noise.scale_broad");

        let config = TerrainConfig { threads: Some(0), ..Default::default() };
        assert_invalid(&config, "threads");
    }

    #[test]
    fn test_rejects_bad_namespace() {
        let mut config = TerrainConfig::default();
        config.output.namespace = "My Pack".to_string();
        assert_invalid(&config, "output.namespace");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let json = r#"{ "size": 64, "emit": { "water_level": 30 } }"#;
        let config: TerrainConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.size, 64);
        assert_eq!(config.emit.water_level, 30);
        assert_eq!(config.emit.ceiling, 200);
        assert_eq!(config.noise, NoiseParams::default());
        assert_eq!(config.output.layout, PackLayout::Flat);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terrain.json");
        let json = r#"{ "seed": 5, "output": { "layout": "datapack", "namespace": "hills" } }"#;
        std::fs::write(&path, json).unwrap();

        let config = TerrainConfig::load(&path).unwrap();
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.output.layout, PackLayout::Datapack);
        assert_eq!(config.output.namespace, "hills");
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ size: ").unwrap();
        assert!(matches!(TerrainConfig::load(&path), Err(TerrainError::ConfigParse { .. })));
        assert!(matches!(
            TerrainConfig::load(&dir.path().join("missing.json")),
            Err(TerrainError::ConfigRead { .. })
        ));
    }
}
