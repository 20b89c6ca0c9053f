//! Engine instructions and their text form.
//!
//! Three primitives are produced:
//!
//! ```text
//! setblock x y z <block>
//! fill x1 y1 z1 x2 y2 z2 <block>
//! schedule function <namespace>:<function> <ticks>t
//! ```

use std::fmt;

use crate::slope::TerrainCategory;

/// Blocks the generator places.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Block {
    Air,
    Water,
    GrassBlock,
    Stone,
    Cobblestone,
    ShortGrass,
    Barrier,
}

impl Block {
    pub fn name(self) -> &'static str {
        match self {
            Block::Air => "air",
            Block::Water => "water",
            Block::GrassBlock => "grass_block",
            Block::Stone => "stone",
            Block::Cobblestone => "cobblestone",
            Block::ShortGrass => "short_grass",
            Block::Barrier => "barrier",
        }
    }

    /// Surface block for a category. Sloped cells pick between stone and
    /// cobblestone; `use_variant` selects cobblestone.
    pub fn surface(category: TerrainCategory, use_variant: bool) -> Block {
        match category {
            TerrainCategory::FlatSoft | TerrainCategory::RollingSoft => Block::GrassBlock,
            TerrainCategory::SlopedHard if use_variant => Block::Cobblestone,
            TerrainCategory::SlopedHard | TerrainCategory::SteepHard => Block::Stone,
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Integer block position; `y` is the vertical axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockPos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl BlockPos {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

/// One line of engine input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Set a single block.
    Place { pos: BlockPos, block: Block },
    /// Fill the axis-aligned box between two corners, inclusive.
    Fill { from: BlockPos, to: BlockPos, block: Block },
    /// Run another function after a delay.
    Schedule { namespace: String, function: String, ticks: u64 },
}

impl Instruction {
    pub fn place(pos: BlockPos, block: Block) -> Self {
        Instruction::Place { pos, block }
    }

    pub fn fill(from: BlockPos, to: BlockPos, block: Block) -> Self {
        Instruction::Fill { from, to, block }
    }

    /// Block this instruction writes, if any.
    pub fn block(&self) -> Option<Block> {
        match self {
            Instruction::Place { block, .. } | Instruction::Fill { block, .. } => Some(*block),
            Instruction::Schedule { .. } => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Place { pos, block } => write!(f, "setblock {pos} {block}"),
            Instruction::Fill { from, to, block } => write!(f, "fill {from} {to} {block}"),
            Instruction::Schedule { namespace, function, ticks } => {
                write!(f, "schedule function {namespace}:{function} {ticks}t")
            }
        }
    }
}
