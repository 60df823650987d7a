//! Chunk extraction.

use crate::digest::{Algorithm, digest};
use crate::error::{Error, Result};
use crate::metadata::{MetadataRecord, MetadataRecorder};
use crate::planner::Chunk;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

/// Read buffer for chunk extraction (64 KiB)
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Outcome of one chunk extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkReport {
    /// Chunk ordinal
    pub index: u64,
    /// Artifact written
    pub output_path: PathBuf,
    /// Bytes written
    pub length: u64,
    /// Digest record of the artifact, when hashing was enabled
    pub record: Option<MetadataRecord>,
}

impl fmt::Display for ChunkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.record {
            Some(record) => write!(f, "Chunk {}: {}", self.index, record.report_line()),
            None => write!(f, "Chunk {} created", self.index),
        }
    }
}

/// Extracts planned chunks into their artifacts
///
/// With a recorder attached, every artifact is digested after it is written
/// and its record persisted.
#[derive(Clone, Copy)]
pub struct ChunkExecutor<'a> {
    recorder: Option<&'a MetadataRecorder>,
}

impl<'a> ChunkExecutor<'a> {
    /// Executor that only extracts
    #[must_use]
    pub fn new() -> Self {
        Self { recorder: None }
    }

    /// Executor that extracts, hashes, and records each chunk
    #[must_use]
    pub fn with_hashing(recorder: &'a MetadataRecorder) -> Self {
        Self {
            recorder: Some(recorder),
        }
    }

    /// Whether chunks are hashed after extraction
    #[must_use]
    pub fn hashing(&self) -> bool {
        self.recorder.is_some()
    }

    /// Copy `chunk.range` of the source into `chunk.output_path`
    ///
    /// # Errors
    ///
    /// Returns [`Error::SizeMismatch`] if the source no longer holds the whole
    /// range (the partial artifact is removed), or an I/O error from opening,
    /// seeking, reading, writing, or hashing.
    pub fn execute(&self, chunk: &Chunk) -> Result<ChunkReport> {
        let range = chunk.range;
        let copied = extract(chunk)?;

        if copied != range.length {
            if let Err(e) = fs::remove_file(&chunk.output_path) {
                tracing::warn!(
                    "Failed to remove partial chunk {}: {}",
                    chunk.output_path.display(),
                    e
                );
            }
            return Err(Error::SizeMismatch {
                path: chunk.source.clone(),
                offset: range.offset,
                expected: range.length,
                actual: copied,
            });
        }

        tracing::debug!(
            "Chunk {} written to {} ({} bytes at offset {})",
            chunk.index,
            chunk.output_path.display(),
            copied,
            range.offset
        );

        let record = match self.recorder {
            Some(recorder) => {
                let result = digest(&chunk.output_path, &Algorithm::ALL)?;
                Some(recorder.record(&result)?)
            }
            None => None,
        };

        Ok(ChunkReport {
            index: chunk.index,
            output_path: chunk.output_path.clone(),
            length: copied,
            record,
        })
    }
}

impl Default for ChunkExecutor<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Stream up to `range.length` bytes into a fresh artifact, returning the
/// number actually copied
fn extract(chunk: &Chunk) -> Result<u64> {
    let source_err = |e: io::Error| Error::io(&chunk.source, e);
    let output_err = |e: io::Error| Error::io(&chunk.output_path, e);

    let mut source = File::open(&chunk.source).map_err(source_err)?;
    source
        .seek(SeekFrom::Start(chunk.range.offset))
        .map_err(source_err)?;

    let mut writer = BufWriter::new(File::create(&chunk.output_path).map_err(output_err)?);
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut copied = 0u64;

    while copied < chunk.range.length {
        let want = (chunk.range.length - copied).min(COPY_BUFFER_SIZE as u64) as usize;
        let n = match source.read(&mut buffer[..want]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(source_err(e)),
        };
        writer.write_all(&buffer[..n]).map_err(output_err)?;
        copied += n as u64;
    }
    writer.flush().map_err(output_err)?;

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{ByteRange, PartitionPolicy, plan_chunks};
    use std::path::Path;
    use tempfile::TempDir;

    fn write_source(dir: &Path, len: usize) -> (PathBuf, Vec<u8>) {
        let data: Vec<u8> = (0..len).map(|i| (i * 7 % 256) as u8).collect();
        let path = dir.join("source.bin");
        fs::write(&path, &data).unwrap();
        (path, data)
    }

    #[test]
    fn test_extracts_exact_range() {
        let dir = TempDir::new().unwrap();
        let (source, data) = write_source(dir.path(), 1000);
        let chunks = plan_chunks(&source, 1000, PartitionPolicy::ChunkSize(300), dir.path());

        let report = ChunkExecutor::new().execute(&chunks[2]).unwrap();
        assert_eq!(report.index, 2);
        assert_eq!(report.length, 300);
        assert_eq!(report.output_path, dir.path().join("source.bin.002"));
        assert!(report.record.is_none());
        assert_eq!(report.to_string(), "Chunk 2 created");

        let written = fs::read(&report.output_path).unwrap();
        assert_eq!(written, &data[600..900]);
    }

    #[test]
    fn test_short_last_chunk() {
        let dir = TempDir::new().unwrap();
        let (source, data) = write_source(dir.path(), 1000);
        let chunks = plan_chunks(&source, 1000, PartitionPolicy::ChunkSize(300), dir.path());

        let report = ChunkExecutor::new().execute(&chunks[3]).unwrap();
        assert_eq!(report.length, 100);
        assert_eq!(fs::read(&report.output_path).unwrap(), &data[900..]);
    }

    #[test]
    fn test_overwrites_existing_artifact() {
        let dir = TempDir::new().unwrap();
        let (source, data) = write_source(dir.path(), 10);
        let chunks = plan_chunks(&source, 10, PartitionPolicy::ChunkSize(4), dir.path());
        fs::write(&chunks[0].output_path, vec![0xFF; 64]).unwrap();

        ChunkExecutor::new().execute(&chunks[0]).unwrap();
        assert_eq!(fs::read(&chunks[0].output_path).unwrap(), &data[..4]);
    }

    #[test]
    fn test_source_shrunk_after_planning() {
        let dir = TempDir::new().unwrap();
        let (source, _) = write_source(dir.path(), 1000);
        let chunks = plan_chunks(&source, 1000, PartitionPolicy::ChunkSize(400), dir.path());

        // Truncate behind the planner's back
        fs::write(&source, vec![1u8; 500]).unwrap();

        let err = ChunkExecutor::new().execute(&chunks[1]).unwrap_err();
        match err {
            Error::SizeMismatch {
                offset,
                expected,
                actual,
                ..
            } => {
                assert_eq!(offset, 400);
                assert_eq!(expected, 400);
                assert_eq!(actual, 100);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!chunks[1].output_path.exists());
    }

    #[test]
    fn test_missing_source() {
        let dir = TempDir::new().unwrap();
        let chunk = Chunk {
            source: dir.path().join("absent"),
            index: 0,
            range: ByteRange { offset: 0, length: 1 },
            output_path: dir.path().join("absent.000"),
        };
        assert!(matches!(
            ChunkExecutor::new().execute(&chunk),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn test_hashing_records_artifact_digest() {
        let dir = TempDir::new().unwrap();
        let meta_dir = TempDir::new().unwrap();
        let (source, _) = write_source(dir.path(), 1000);
        let chunks = plan_chunks(&source, 1000, PartitionPolicy::ChunkCount(2), dir.path());
        let recorder = MetadataRecorder::new(meta_dir.path());

        let report = ChunkExecutor::with_hashing(&recorder)
            .execute(&chunks[1])
            .unwrap();
        let record = report.record.clone().unwrap();

        let expected = digest(&chunks[1].output_path, &Algorithm::ALL).unwrap();
        assert_eq!(record.file, chunks[1].output_path);
        assert_eq!(record.digests, expected.digests);
        assert!(record.metadata_file.starts_with(meta_dir.path()));
        assert!(report.to_string().starts_with("Chunk 1: "));
        assert!(report.to_string().ends_with(&format!(
            ",{},{},{}",
            record.md5(),
            record.sha256(),
            record.metadata_file.display()
        )));
    }
}
