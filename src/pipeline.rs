//! End-to-end run: validate, generate, classify, emit, write.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::TerrainConfig;
use crate::emitter::InstructionEmitter;
use crate::error::Result;
use crate::heightmap::{build_heightmap, NoiseField};
use crate::instruction::Block;
use crate::seeds::{resolve_seed, TerrainSeeds};
use crate::slope::{category_histogram, classify, TerrainCategory};
use crate::tilemap::Tilemap;
use crate::writer::ChunkWriter;

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Seed actually used. Pass it back in to repeat the run.
    pub seed: u32,
    pub seed_generated: bool,
    pub size: usize,
    pub chunk_count: usize,
    pub instruction_count: usize,
    pub water_fills: usize,
    pub decorations: usize,
    /// Cells per category, indexed by category code.
    pub category_counts: [usize; 4],
    pub height_range: (f64, f64),
    pub function_dir: PathBuf,
    pub master_file: PathBuf,
}

/// Heightmap and category grid for a validated configuration and a concrete seed.
pub fn generate_terrain(
    config: &TerrainConfig,
    seeds: &TerrainSeeds,
) -> Result<(Tilemap<f64>, Tilemap<TerrainCategory>)> {
    let field = NoiseField::new(seeds, &config.noise);
    let heightmap = build_heightmap(config.size, &field, config.threads)?;
    let categories = classify(&heightmap, &config.slope);
    Ok((heightmap, categories))
}

/// Run the whole pipeline and write every output file.
pub fn run(config: &TerrainConfig) -> Result<RunReport> {
    config.validate()?;

    let (seed, seed_generated) = resolve_seed(config.seed);
    if seed_generated {
        info!(seed, "no seed given, generated one");
    }
    let seeds = TerrainSeeds::new(seed, config.size);
    debug!(%seeds, "derived seeds");

    info!(size = config.size, seed, "generating terrain");
    let (heightmap, categories) = generate_terrain(config, &seeds)?;
    let height_range = heightmap.min_max().unwrap_or((0.0, 0.0));
    info!("heightmap range: {:.1} to {:.1}", height_range.0, height_range.1);

    let category_counts = category_histogram(&categories);
    info!(
        flat = category_counts[0],
        rolling = category_counts[1],
        sloped = category_counts[2],
        steep = category_counts[3],
        "terrain categories"
    );

    let emitter = InstructionEmitter::new(&heightmap, &categories, &config.emit, &seeds)?;
    let mut writer = ChunkWriter::new(&config.output, config.emit.ceiling)?;
    let chunk_count = emitter.chunk_count();
    info!(chunks = chunk_count, dir = %writer.function_dir().display(), "writing chunks");

    let mut instruction_count = 0;
    let mut water_fills = 0;
    let mut decorations = 0;
    let mut last_decile = 0;
    for chunk in emitter.chunks() {
        writer.write(&chunk)?;
        instruction_count += chunk.instructions.len();
        water_fills += chunk.count_block(Block::Water);
        decorations += chunk.count_block(Block::ShortGrass);

        let decile = (chunk.index + 1) * 10 / chunk_count;
        if decile > last_decile {
            last_decile = decile;
            info!("processed {}%", decile * 10);
        }
    }

    let master_file = writer.finalize(config.size, chunk_count)?;
    let resolved = TerrainConfig {
        seed: Some(seed),
        ..config.clone()
    };
    writer.write_manifest(&resolved)?;
    info!(instructions = instruction_count, water_fills, decorations, "done");

    Ok(RunReport {
        seed,
        seed_generated,
        size: config.size,
        chunk_count,
        instruction_count,
        water_fills,
        decorations,
        category_counts,
        height_range,
        function_dir: writer.function_dir().to_path_buf(),
        master_file,
    })
}
