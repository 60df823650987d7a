//! # shardkit Files
//!
//! Chunked file engine for shardkit.
//!
//! This crate provides:
//! - Deterministic byte-range partitioning by chunk size or chunk count
//! - Chunk extraction into standalone artifacts
//! - Single-pass MD5 + SHA-256 digests with durable metadata records
//! - An order-preserving parallel dispatcher
//! - Sequential reassembly of chunk artifacts
//! - Re-verification of artifacts against persisted metadata

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod digest;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod metadata;
pub mod planner;
pub mod reassembler;
pub mod split;
pub mod verify;

pub use batch::{hash_file, hash_files, hash_files_observed};
pub use digest::{Algorithm, DigestResult, digest, digest_reader};
pub use dispatcher::{Dispatcher, resolve_workers};
pub use error::{ConfigError, Error, Result};
pub use executor::{ChunkExecutor, ChunkReport};
pub use metadata::{Clock, LocalClock, MetadataRecord, MetadataRecorder};
pub use planner::{ByteRange, Chunk, PartitionPolicy, plan, plan_chunks};
pub use reassembler::concatenate;
pub use split::{SplitOutcome, Splitter, default_output_dir};
pub use verify::{Verification, verify, verify_record_file};

/// Block size used when streaming file contents (4 KiB)
pub const STREAM_BLOCK_SIZE: usize = 4096;

/// Minimum zero-padding width of chunk indices in artifact names
pub const MIN_INDEX_WIDTH: usize = 3;
