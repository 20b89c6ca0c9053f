//! Translation of (height, category) cells into engine instructions.
//!
//! Chunk `i` covers every cell `(i, j)` of the grid and becomes the engine's
//! `x = i` slice; `j` maps to `z` and the rounded height to `y`. Each cell
//! produces, in order:
//!
//! 1. an air fill from `y = 0` to the ceiling, so re-running over an existing
//!    world starts from a clean column,
//! 2. the surface block at the rounded height,
//! 3. a water fill up to the water level when the surface is at least one
//!    block below it, or otherwise
//! 4. short grass on top of a dry flat cell, if its density draw passes.
//!
//! Chunks are produced lazily, so only one chunk of instructions is alive at
//! a time.

use std::iter::FusedIterator;

use rand::Rng;

use crate::config::EmitSettings;
use crate::error::{Result, TerrainError};
use crate::instruction::{Block, BlockPos, Instruction};
use crate::seeds::{CellPurpose, TerrainSeeds};
use crate::slope::TerrainCategory;
use crate::tilemap::Tilemap;

/// Instructions for one slice of the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    /// Slice index; also the `x` coordinate of every instruction in it.
    pub index: usize,
    pub instructions: Vec<Instruction>,
}

impl Chunk {
    /// File stem and function name, e.g. `chunk_12`.
    pub fn name(&self) -> String {
        chunk_name(self.index)
    }

    /// Number of instructions that write `block`.
    pub fn count_block(&self, block: Block) -> usize {
        self.instructions.iter().filter(|ins| ins.block() == Some(block)).count()
    }
}

/// Function name of the chunk with the given index.
pub fn chunk_name(index: usize) -> String {
    format!("chunk_{index}")
}

/// Walks a heightmap and its category grid and yields one [`Chunk`] per row.
pub struct InstructionEmitter<'a> {
    heightmap: &'a Tilemap<f64>,
    categories: &'a Tilemap<TerrainCategory>,
    settings: &'a EmitSettings,
    seeds: &'a TerrainSeeds,
}

impl<'a> InstructionEmitter<'a> {
    pub fn new(
        heightmap: &'a Tilemap<f64>,
        categories: &'a Tilemap<TerrainCategory>,
        settings: &'a EmitSettings,
        seeds: &'a TerrainSeeds,
    ) -> Result<Self> {
        if !heightmap.same_shape(categories) {
            return Err(TerrainError::generation(
                "emit",
                format!(
                    "category grid is {}x{} but heightmap is {}x{}",
                    categories.rows, categories.cols, heightmap.rows, heightmap.cols
                ),
            ));
        }
        Ok(Self {
            heightmap,
            categories,
            settings,
            seeds,
        })
    }

    /// Number of chunks this emitter produces.
    pub fn chunk_count(&self) -> usize {
        self.heightmap.rows
    }

    /// Lazily yield every chunk in index order.
    pub fn chunks(&self) -> Chunks<'_, 'a> {
        Chunks { emitter: self, next: 0 }
    }

    /// Build the chunk at `index`.
    pub fn chunk(&self, index: usize) -> Chunk {
        let heights = self.heightmap.row(index);
        let categories = self.categories.row(index);
        let mut instructions = Vec::with_capacity(heights.len() * 3);
        for (j, (&height, &category)) in heights.iter().zip(categories).enumerate() {
            self.emit_cell(index, j, height, category, &mut instructions);
        }
        Chunk { index, instructions }
    }

    fn emit_cell(
        &self,
        i: usize,
        j: usize,
        height: f64,
        category: TerrainCategory,
        out: &mut Vec<Instruction>,
    ) {
        let (x, z) = (i as i64, j as i64);
        let surface_y = height.round_ties_even() as i64;
        let water_level = self.settings.water_level;

        out.push(Instruction::fill(
            BlockPos::new(x, 0, z),
            BlockPos::new(x, self.settings.ceiling, z),
            Block::Air,
        ));

        let use_variant = category == TerrainCategory::SlopedHard
            && self.seeds.cell_rng(i, j, CellPurpose::SurfaceVariant).gen_bool(0.5);
        out.push(Instruction::place(
            BlockPos::new(x, surface_y, z),
            Block::surface(category, use_variant),
        ));

        if height < water_level as f64 {
            if height + 1.0 < water_level as f64 {
                out.push(Instruction::fill(
                    BlockPos::new(x, surface_y + 1, z),
                    BlockPos::new(x, water_level, z),
                    Block::Water,
                ));
            }
        } else if category == TerrainCategory::FlatSoft && self.decorate(i, j) {
            out.push(Instruction::place(BlockPos::new(x, surface_y + 1, z), Block::ShortGrass));
        }
    }

    fn decorate(&self, i: usize, j: usize) -> bool {
        let draw: f64 = self.seeds.cell_rng(i, j, CellPurpose::Decoration).gen();
        draw * 100.0 < self.settings.grass_density
    }
}

/// Iterator over the chunks of an [`InstructionEmitter`].
pub struct Chunks<'e, 'a> {
    emitter: &'e InstructionEmitter<'a>,
    next: usize,
}

impl Iterator for Chunks<'_, '_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.next >= self.emitter.chunk_count() {
            return None;
        }
        let chunk = self.emitter.chunk(self.next);
        self.next += 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.emitter.chunk_count().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunks<'_, '_> {}

impl FusedIterator for Chunks<'_, '_> {}
