//! File splitting: plan, dispatch, extract.

use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::executor::{ChunkExecutor, ChunkReport};
use crate::planner::{PartitionPolicy, plan_chunks};
use std::fs;
use std::path::{Path, PathBuf};

/// Result of splitting one file
#[derive(Debug)]
pub struct SplitOutcome {
    /// File that was split
    pub source: PathBuf,
    /// Source size at planning time
    pub file_size: u64,
    /// Chunk size the policy resolved to
    pub chunk_size: u64,
    /// One entry per planned chunk, in index order
    pub reports: Vec<Result<ChunkReport>>,
}

impl SplitOutcome {
    /// Number of planned chunks
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.reports.len()
    }

    /// Number of chunks that failed
    #[must_use]
    pub fn failures(&self) -> usize {
        self.reports.iter().filter(|r| r.is_err()).count()
    }

    /// Whether every chunk was written
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures() == 0
    }

    /// Artifacts written, in index order
    pub fn chunk_paths(&self) -> impl Iterator<Item = &Path> {
        self.reports
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|report| report.output_path.as_path())
    }
}

/// Splits files into chunk artifacts across a worker pool
pub struct Splitter<'a> {
    dispatcher: Dispatcher,
    executor: ChunkExecutor<'a>,
}

impl<'a> Splitter<'a> {
    /// Create a splitter
    #[must_use]
    pub fn new(dispatcher: Dispatcher, executor: ChunkExecutor<'a>) -> Self {
        Self {
            dispatcher,
            executor,
        }
    }

    /// Split `source` under `policy`
    ///
    /// Chunks land in `output_dir`, or next to the source when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the source cannot be inspected; per-chunk
    /// failures are reported in [`SplitOutcome::reports`].
    pub fn split(
        &self,
        source: &Path,
        policy: PartitionPolicy,
        output_dir: Option<&Path>,
    ) -> Result<SplitOutcome> {
        self.split_observed(source, policy, output_dir, |_, _| {})
    }

    /// Like [`Splitter::split`], calling `observer` as each chunk completes
    ///
    /// # Errors
    ///
    /// Returns an error only if the source cannot be inspected.
    pub fn split_observed<O>(
        &self,
        source: &Path,
        policy: PartitionPolicy,
        output_dir: Option<&Path>,
        observer: O,
    ) -> Result<SplitOutcome>
    where
        O: FnMut(usize, &Result<ChunkReport>),
    {
        let file_size = fs::metadata(source)
            .map_err(|e| Error::io(source, e))?
            .len();
        let output_dir = output_dir.map_or_else(|| default_output_dir(source), Path::to_path_buf);
        let chunks = plan_chunks(source, file_size, policy, &output_dir);

        tracing::info!(
            "Splitting {} ({} bytes) into {} chunks in {}",
            source.display(),
            file_size,
            chunks.len(),
            output_dir.display()
        );

        let executor = self.executor;
        let reports = self.dispatcher.run_observed(
            chunks,
            move |chunk| executor.execute(&chunk),
            observer,
        );

        Ok(SplitOutcome {
            source: source.to_path_buf(),
            file_size,
            chunk_size: policy.chunk_size(file_size),
            reports,
        })
    }
}

/// Directory holding `source`, or `.` for a bare file name
#[must_use]
pub fn default_output_dir(source: &Path) -> PathBuf {
    match source.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
