//! Error types for the shardkit file engine.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// File engine errors
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration, detected before any I/O
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O failure on a specific path
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Source yielded fewer bytes than the planned range
    #[error(
        "size mismatch in {}: expected {expected} bytes at offset {offset}, got {actual}",
        path.display()
    )]
    SizeMismatch {
        /// Source file
        path: PathBuf,
        /// Range offset
        offset: u64,
        /// Planned length
        expected: u64,
        /// Bytes actually available
        actual: u64,
    },

    /// Metadata record file could not be parsed
    #[error("malformed metadata record {}: {reason}", path.display())]
    MalformedRecord {
        /// Record file
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// A dispatched task panicked
    #[error("task {0} panicked")]
    TaskPanicked(usize),
}

impl Error {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No operation was selected
    #[error("you must choose at least one operation: --split, --concatenate, --hash or --verify")]
    NoOperation,

    /// Two operations that cannot run together were selected
    #[error("you cannot use both --{0} and --{1} at the same time")]
    ConflictingOperations(&'static str, &'static str),

    /// Split requested without a sizing parameter
    #[error("when splitting, you must specify either --chunk-size or --num-files")]
    MissingPartition,

    /// Split requested with both sizing parameters
    #[error("you can specify either --chunk-size or --num-files, but not both")]
    ConflictingPartition,

    /// Chunk size of zero
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,

    /// Chunk count of zero
    #[error("number of files must be greater than zero")]
    ZeroChunkCount,
}
