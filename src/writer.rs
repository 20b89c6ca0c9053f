//! Function file output.
//!
//! Each chunk goes to its own `chunk_<i>.mcfunction`. After all chunks, the
//! master `_make.mcfunction` encloses the world in barrier walls and schedules
//! chunk `i` at tick `i + 1`, so the engine processes one chunk per tick.
//!
//! Writes are best-effort, not atomic: when a write fails, files written
//! earlier in the run stay on disk.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{OutputSettings, PackLayout};
use crate::emitter::{chunk_name, Chunk};
use crate::error::{Result, TerrainError};
use crate::instruction::{Block, BlockPos, Instruction};

/// Extension of every function file.
pub const FUNCTION_EXTENSION: &str = "mcfunction";
/// Stem of the master schedule function.
pub const MASTER_FUNCTION: &str = "_make";
/// Run manifest written next to the functions (or at the pack root).
pub const MANIFEST_FILE: &str = "_manifest.json";
/// Datapack format for function directories named `function`.
const PACK_FORMAT: u32 = 48;

#[derive(Serialize)]
struct PackMeta<'a> {
    pack: PackInfo<'a>,
}

#[derive(Serialize)]
struct PackInfo<'a> {
    pack_format: u32,
    description: &'a str,
}

/// Writes chunk files and the master schedule for one run.
pub struct ChunkWriter {
    root: PathBuf,
    function_dir: PathBuf,
    namespace: String,
    ceiling: i64,
    written: HashSet<usize>,
}

impl ChunkWriter {
    /// Prepare the output directories. For the datapack layout this also
    /// writes `pack.mcmeta`.
    pub fn new(output: &OutputSettings, ceiling: i64) -> Result<Self> {
        let root = output.directory.clone();
        let function_dir = match output.layout {
            PackLayout::Flat => root.clone(),
            PackLayout::Datapack => root.join("data").join(&output.namespace).join("function"),
        };
        fs::create_dir_all(&function_dir).map_err(|e| TerrainError::write(&function_dir, e))?;

        let writer = Self {
            root,
            function_dir,
            namespace: output.namespace.clone(),
            ceiling,
            written: HashSet::new(),
        };
        if output.layout == PackLayout::Datapack {
            let description = format!("Generated terrain ({})", output.namespace);
            let meta = PackMeta {
                pack: PackInfo {
                    pack_format: PACK_FORMAT,
                    description: &description,
                },
            };
            writer.write_json(&writer.root.join("pack.mcmeta"), &meta)?;
        }
        Ok(writer)
    }

    /// Directory holding the `.mcfunction` files.
    pub fn function_dir(&self) -> &Path {
        &self.function_dir
    }

    /// Path of the function file with the given stem.
    pub fn function_path(&self, stem: &str) -> PathBuf {
        self.function_dir.join(format!("{stem}.{FUNCTION_EXTENSION}"))
    }

    /// Replace the chunk's file with its instructions, one per line.
    pub fn write(&mut self, chunk: &Chunk) -> Result<()> {
        if !self.written.insert(chunk.index) {
            return Err(TerrainError::DuplicateChunk { index: chunk.index });
        }
        let path = self.function_path(&chunk.name());
        write_lines(&path, &chunk.instructions)?;
        debug!(chunk = chunk.index, instructions = chunk.instructions.len(), "wrote chunk");
        Ok(())
    }

    /// Write the master schedule and return its path.
    pub fn finalize(&self, grid_size: usize, chunk_count: usize) -> Result<PathBuf> {
        if self.written.len() != chunk_count {
            warn!(
                written = self.written.len(),
                scheduled = chunk_count,
                "schedule references a different number of chunks than were written"
            );
        }
        let instructions = master_schedule(grid_size, chunk_count, self.ceiling, &self.namespace);
        let path = self.function_path(MASTER_FUNCTION);
        write_lines(&path, &instructions)?;
        Ok(path)
    }

    /// Write `value` as pretty JSON to the run manifest.
    pub fn write_manifest<T: Serialize>(&self, value: &T) -> Result<PathBuf> {
        let path = self.root.join(MANIFEST_FILE);
        self.write_json(&path, value)?;
        Ok(path)
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| TerrainError::write(path, std::io::Error::other(e)))?;
        fs::write(path, json + "\n").map_err(|e| TerrainError::write(path, e))
    }
}

/// Four barrier walls around the `grid_size` square, then one schedule per chunk.
pub fn master_schedule(
    grid_size: usize,
    chunk_count: usize,
    ceiling: i64,
    namespace: &str,
) -> Vec<Instruction> {
    let n = grid_size as i64;
    let wall = |from: (i64, i64), to: (i64, i64)| {
        Instruction::fill(
            BlockPos::new(from.0, 0, from.1),
            BlockPos::new(to.0, ceiling, to.1),
            Block::Barrier,
        )
    };

    let mut instructions = vec![
        wall((0, 0), (n, 0)),
        wall((0, 0), (0, n)),
        wall((n, 0), (n, n)),
        wall((0, n), (n, n)),
    ];
    instructions.extend((0..chunk_count).map(|index| Instruction::Schedule {
        namespace: namespace.to_string(),
        function: chunk_name(index),
        ticks: index as u64 + 1,
    }));
    instructions
}

/// Create (or truncate) `path` and write one instruction per line.
fn write_lines(path: &Path, instructions: &[Instruction]) -> Result<()> {
    let file = File::create(path).map_err(|e| TerrainError::write(path, e))?;
    let mut out = BufWriter::new(file);
    for instruction in instructions {
        writeln!(out, "{instruction}").map_err(|e| TerrainError::write(path, e))?;
    }
    out.flush().map_err(|e| TerrainError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_output(dir: &Path) -> OutputSettings {
        OutputSettings {
            directory: dir.to_path_buf(),
            namespace: "make".to_string(),
            layout: PackLayout::Flat,
        }
    }

    fn chunk(index: usize, lines: usize) -> Chunk {
        let instructions = (0..lines)
            .map(|j| Instruction::place(BlockPos::new(index as i64, 64, j as i64), Block::Stone))
            .collect();
        Chunk { index, instructions }
    }

    #[test]
    fn test_master_schedule_text() {
        let lines: Vec<String> = master_schedule(3, 3, 200, "make")
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            lines,
            vec![
                "fill 0 0 0 3 200 0 barrier",
                "fill 0 0 0 0 200 3 barrier",
                "fill 3 0 0 3 200 3 barrier",
                "fill 0 0 3 3 200 3 barrier",
                "schedule function make:chunk_0 1t",
                "schedule function make:chunk_1 2t",
                "schedule function make:chunk_2 3t",
            ]
        );
    }

    #[test]
    fn test_schedule_offsets_are_contiguous() {
        let ticks: Vec<u64> = master_schedule(50, 50, 200, "ns")
            .into_iter()
            .filter_map(|ins| match ins {
                Instruction::Schedule { ticks, .. } => Some(ticks),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, (1..=50).collect::<Vec<u64>>());
    }

    #[test]
    fn test_write_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("chunk_0.mcfunction");
        fs::write(&stale, "setblock 9 9 9 dirt\n".repeat(10)).unwrap();

        let mut writer = ChunkWriter::new(&flat_output(dir.path()), 200).unwrap();
        writer.write(&chunk(0, 2)).unwrap();

        let contents = fs::read_to_string(&stale).unwrap();
        assert_eq!(contents, "setblock 0 64 0 stone\nsetblock 0 64 1 stone\n");
    }

    #[test]
    fn test_rejects_second_write_of_same_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ChunkWriter::new(&flat_output(dir.path()), 200).unwrap();
        writer.write(&chunk(1, 1)).unwrap();
        assert!(matches!(
            writer.write(&chunk(1, 1)),
            Err(TerrainError::DuplicateChunk { index: 1 })
        ));
    }

    #[test]
    fn test_finalize_writes_master_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ChunkWriter::new(&flat_output(dir.path()), 120).unwrap();
        for i in 0..2 {
            writer.write(&chunk(i, 2)).unwrap();
        }
        let path = writer.finalize(2, 2).unwrap();
        assert_eq!(path, dir.path().join("_make.mcfunction"));

        let contents = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "fill 0 0 0 2 120 0 barrier");
        assert_eq!(lines[5], "schedule function make:chunk_1 2t");
    }

    #[test]
    fn test_datapack_layout() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputSettings {
            directory: dir.path().join("pack"),
            namespace: "hills".to_string(),
            layout: PackLayout::Datapack,
        };
        let mut writer = ChunkWriter::new(&output, 200).unwrap();
        writer.write(&chunk(0, 1)).unwrap();

        let function_dir = dir.path().join("pack/data/hills/function");
        assert_eq!(writer.function_dir(), function_dir);
        assert!(function_dir.join("chunk_0.mcfunction").is_file());

        let text = fs::read_to_string(dir.path().join("pack/pack.mcmeta")).unwrap();
        let meta: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(meta["pack"]["pack_format"], PACK_FORMAT);
    }

    #[test]
    fn test_unwritable_directory_is_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "").unwrap();
        let result = ChunkWriter::new(&flat_output(&blocker.join("out")), 200);
        assert!(matches!(result, Err(TerrainError::WriteFailure { .. })));
    }

    #[test]
    fn test_chunk_write_failure_names_path_and_keeps_earlier_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ChunkWriter::new(&flat_output(dir.path()), 200).unwrap();
        writer.write(&chunk(0, 2)).unwrap();

        let blocked = dir.path().join("chunk_1.mcfunction");
        fs::create_dir(&blocked).unwrap();
        let err = writer.write(&chunk(1, 2)).unwrap_err();
        match &err {
            TerrainError::WriteFailure { path, .. } => assert_eq!(path, &blocked),
            other => panic!("expected write failure, got {other:?}"),
        }
        assert!(err.to_string().contains(&blocked.display().to_string()));

        let kept = fs::read_to_string(dir.path().join("chunk_0.mcfunction")).unwrap();
        assert_eq!(kept, "setblock 0 64 0 stone\nsetblock 0 64 1 stone\n");
    }
}
