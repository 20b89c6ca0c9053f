//! Terrain datapack generation library
//!
//! Builds a noise heightmap, classifies it by slope, and writes it out as
//! chunked function files for a block-based world engine.

pub mod config;
pub mod emitter;
pub mod error;
pub mod heightmap;
pub mod instruction;
pub mod logging;
pub mod pipeline;
pub mod seeds;
pub mod slope;
pub mod tilemap;
pub mod writer;

pub use config::TerrainConfig;
pub use error::{Result, TerrainError};
pub use pipeline::{run, RunReport};
