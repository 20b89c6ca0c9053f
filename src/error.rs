//! Error types for the generation pipeline.
//!
//! Every failure is terminal for the run. Variants carry enough context
//! (stage, coordinates, chunk index, path) to reproduce the problem.

use std::path::PathBuf;

/// Errors raised while configuring, generating or writing terrain.
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    /// A configuration value was rejected before any work started.
    #[error("invalid configuration: `{field}` {reason}")]
    InvalidConfiguration { field: &'static str, reason: String },

    /// Heightmap synthesis failed. No partial heightmap is returned.
    #[error("generation failed during {stage}: {reason}")]
    GenerationFailure { stage: &'static str, reason: String },

    /// Writing an output file failed. Files written earlier in the run stay on disk.
    #[error("failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A chunk index was handed to the writer a second time in one run.
    #[error("chunk {index} was already written during this run")]
    DuplicateChunk { index: usize },

    /// Failed to read a configuration file from disk.
    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a JSON configuration file.
    #[error("failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl TerrainError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration { field, reason: reason.into() }
    }

    pub(crate) fn generation(stage: &'static str, reason: impl Into<String>) -> Self {
        Self::GenerationFailure { stage, reason: reason.into() }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailure { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, TerrainError>;
