//! File partitioning.
//!
//! Turns a file size and a [`PartitionPolicy`] into the ordered list of byte
//! ranges covering the file, and names the chunk artifact for each range.

use crate::MIN_INDEX_WIDTH;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// How a file is divided into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionPolicy {
    /// Fixed chunk size in bytes; the last chunk may be shorter
    ChunkSize(u64),
    /// Target number of chunks; chunk size is `ceil(size / count)`
    ChunkCount(u64),
}

impl PartitionPolicy {
    /// Build a policy from the two mutually exclusive options
    ///
    /// # Errors
    ///
    /// Returns an error if neither or both options are set, or if the
    /// provided value is zero.
    pub fn from_options(
        chunk_size: Option<u64>,
        chunk_count: Option<u64>,
    ) -> Result<Self, ConfigError> {
        match (chunk_size, chunk_count) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingPartition),
            (None, None) => Err(ConfigError::MissingPartition),
            (Some(0), None) => Err(ConfigError::ZeroChunkSize),
            (None, Some(0)) => Err(ConfigError::ZeroChunkCount),
            (Some(size), None) => Ok(Self::ChunkSize(size)),
            (None, Some(count)) => Ok(Self::ChunkCount(count)),
        }
    }

    /// Chunk size this policy yields for a file of `file_size` bytes
    ///
    /// Returns 0 only for an empty file under [`PartitionPolicy::ChunkCount`].
    #[must_use]
    pub fn chunk_size(&self, file_size: u64) -> u64 {
        match *self {
            Self::ChunkSize(size) => size,
            Self::ChunkCount(count) => file_size.div_ceil(count),
        }
    }

    /// Number of chunks this policy yields for a file of `file_size` bytes
    #[must_use]
    pub fn chunk_count(&self, file_size: u64) -> u64 {
        match self.chunk_size(file_size) {
            0 => 0,
            size => file_size.div_ceil(size),
        }
    }
}

/// Contiguous byte range of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    /// Offset of the first byte
    pub offset: u64,
    /// Number of bytes, always non-zero
    pub length: u64,
}

impl ByteRange {
    /// Offset one past the last byte
    #[must_use]
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// One planned chunk of a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// File the bytes come from
    pub source: PathBuf,
    /// 0-based ordinal
    pub index: u64,
    /// Bytes covered
    pub range: ByteRange,
    /// Artifact the bytes are written to
    pub output_path: PathBuf,
}

/// Compute the ordered byte ranges covering a file
///
/// Ranges are contiguous, non-overlapping, and their lengths sum to
/// `file_size`. An empty file yields no ranges.
///
/// # Example
///
/// ```
/// use shardkit_files::planner::{PartitionPolicy, plan};
///
/// let ranges = plan(10, PartitionPolicy::ChunkSize(4));
/// let lengths: Vec<u64> = ranges.iter().map(|r| r.length).collect();
/// assert_eq!(lengths, vec![4, 4, 2]);
/// ```
#[must_use]
pub fn plan(file_size: u64, policy: PartitionPolicy) -> Vec<ByteRange> {
    let chunk_size = policy.chunk_size(file_size);
    let chunk_count = policy.chunk_count(file_size);

    (0..chunk_count)
        .map(|i| {
            let offset = i * chunk_size;
            ByteRange {
                offset,
                length: chunk_size.min(file_size - offset),
            }
        })
        .collect()
}

/// Plan chunks for `source` and name their artifacts inside `output_dir`
#[must_use]
pub fn plan_chunks(
    source: &Path,
    file_size: u64,
    policy: PartitionPolicy,
    output_dir: &Path,
) -> Vec<Chunk> {
    let ranges = plan(file_size, policy);
    let width = index_width(ranges.len() as u64);
    let base_name = base_name(source);

    ranges
        .into_iter()
        .enumerate()
        .map(|(i, range)| {
            let index = i as u64;
            Chunk {
                source: source.to_path_buf(),
                index,
                range,
                output_path: output_dir.join(chunk_file_name(&base_name, index, width)),
            }
        })
        .collect()
}

/// Zero-padding width for a file split into `chunk_count` chunks
///
/// At least [`MIN_INDEX_WIDTH`] digits, wider when the largest index needs it.
#[must_use]
pub fn index_width(chunk_count: u64) -> usize {
    let largest = chunk_count.saturating_sub(1);
    let digits = largest.checked_ilog10().map_or(1, |d| d as usize + 1);
    digits.max(MIN_INDEX_WIDTH)
}

/// Artifact name for chunk `index`: `<base>.<index padded to width>`
#[must_use]
pub fn chunk_file_name(base_name: &str, index: u64, width: usize) -> String {
    format!("{base_name}.{index:0width$}")
}

/// Final path component of `path` as a string, `"unknown"` when absent
pub(crate) fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lengths(ranges: &[ByteRange]) -> Vec<u64> {
        ranges.iter().map(|r| r.length).collect()
    }

    #[test]
    fn test_fixed_size_plan() {
        let ranges = plan(10_000_000, PartitionPolicy::ChunkSize(3_000_000));
        assert_eq!(
            lengths(&ranges),
            vec![3_000_000, 3_000_000, 3_000_000, 1_000_000]
        );
        assert_eq!(ranges[3].offset, 9_000_000);
    }

    #[test]
    fn test_fixed_count_plan() {
        let policy = PartitionPolicy::ChunkCount(3);
        assert_eq!(policy.chunk_size(10_000_000), 3_333_334);

        let ranges = plan(10_000_000, policy);
        assert_eq!(lengths(&ranges), vec![3_333_334, 3_333_334, 3_333_332]);
    }

    #[test]
    fn test_exact_multiple() {
        let ranges = plan(4096, PartitionPolicy::ChunkSize(1024));
        assert_eq!(lengths(&ranges), vec![1024; 4]);
    }

    #[test]
    fn test_chunk_larger_than_file() {
        let ranges = plan(100, PartitionPolicy::ChunkSize(1 << 20));
        assert_eq!(ranges, vec![ByteRange { offset: 0, length: 100 }]);
    }

    #[test]
    fn test_count_exceeding_size() {
        // 5 bytes into 10 files: derived size 1, so only 5 chunks exist
        let ranges = plan(5, PartitionPolicy::ChunkCount(10));
        assert_eq!(lengths(&ranges), vec![1; 5]);
    }

    #[test]
    fn test_empty_file_yields_no_chunks() {
        assert!(plan(0, PartitionPolicy::ChunkSize(1024)).is_empty());
        assert!(plan(0, PartitionPolicy::ChunkCount(4)).is_empty());
        assert_eq!(PartitionPolicy::ChunkCount(4).chunk_count(0), 0);
    }

    #[test]
    fn test_policy_from_options() {
        assert_eq!(
            PartitionPolicy::from_options(Some(10), None),
            Ok(PartitionPolicy::ChunkSize(10))
        );
        assert_eq!(
            PartitionPolicy::from_options(None, Some(3)),
            Ok(PartitionPolicy::ChunkCount(3))
        );
        assert_eq!(
            PartitionPolicy::from_options(Some(10), Some(3)),
            Err(ConfigError::ConflictingPartition)
        );
        assert_eq!(
            PartitionPolicy::from_options(None, None),
            Err(ConfigError::MissingPartition)
        );
        assert_eq!(
            PartitionPolicy::from_options(Some(0), None),
            Err(ConfigError::ZeroChunkSize)
        );
        assert_eq!(
            PartitionPolicy::from_options(None, Some(0)),
            Err(ConfigError::ZeroChunkCount)
        );
    }

    #[test]
    fn test_index_width() {
        assert_eq!(index_width(0), 3);
        assert_eq!(index_width(1), 3);
        assert_eq!(index_width(1000), 3);
        assert_eq!(index_width(1001), 4);
        assert_eq!(index_width(100_000), 5);
    }

    #[test]
    fn test_plan_chunks_naming() {
        let chunks = plan_chunks(
            Path::new("/data/in/big.iso"),
            25,
            PartitionPolicy::ChunkSize(10),
            Path::new("/data/out"),
        );

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].output_path, PathBuf::from("/data/out/big.iso.000"));
        assert_eq!(chunks[2].output_path, PathBuf::from("/data/out/big.iso.002"));
        assert_eq!(chunks[2].index, 2);
        assert_eq!(chunks[2].range, ByteRange { offset: 20, length: 5 });
        assert!(chunks.iter().all(|c| c.source == Path::new("/data/in/big.iso")));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn chunk_count_matches_plan(file_size in 0u64..1_000_000, size in 1u64..100_000) {
                let policy = PartitionPolicy::ChunkSize(size);
                prop_assert_eq!(plan(file_size, policy).len() as u64, policy.chunk_count(file_size));
            }

            #[test]
            fn lengths_sum_to_file_size(file_size in 0u64..1_000_000, count in 1u64..200) {
                let ranges = plan(file_size, PartitionPolicy::ChunkCount(count));
                prop_assert_eq!(ranges.iter().map(|r| r.length).sum::<u64>(), file_size);
            }

            #[test]
            fn names_sort_in_index_order(count in 1u64..5_000) {
                let width = index_width(count);
                let first = chunk_file_name("f", 0, width);
                let last = chunk_file_name("f", count - 1, width);
                prop_assert!(first <= last);
                prop_assert_eq!(first.len(), last.len());
            }
        }
    }
}
