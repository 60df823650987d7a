//! Parallel whole-file hashing.

use crate::digest::{Algorithm, digest};
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::metadata::{MetadataRecord, MetadataRecorder};
use std::path::{Path, PathBuf};

/// Digest and record one file
///
/// # Errors
///
/// Returns an error if the file cannot be read or its record written.
pub fn hash_file(path: &Path, recorder: &MetadataRecorder) -> Result<MetadataRecord> {
    let result = digest(path, &Algorithm::ALL)?;
    recorder.record(&result)
}

/// Hash every file in `paths`, one record (or error) per path, in order
pub fn hash_files(
    paths: &[PathBuf],
    dispatcher: &Dispatcher,
    recorder: &MetadataRecorder,
) -> Vec<Result<MetadataRecord>> {
    hash_files_observed(paths, dispatcher, recorder, |_, _| {})
}

/// Like [`hash_files`], calling `observer` as each file completes
pub fn hash_files_observed<O>(
    paths: &[PathBuf],
    dispatcher: &Dispatcher,
    recorder: &MetadataRecorder,
    observer: O,
) -> Vec<Result<MetadataRecord>>
where
    O: FnMut(usize, &Result<MetadataRecord>),
{
    tracing::info!(
        "Hashing {} files with {} workers",
        paths.len(),
        dispatcher.workers()
    );

    let tasks: Vec<&Path> = paths.iter().map(PathBuf::as_path).collect();
    dispatcher.run_observed(tasks, |path| hash_file(path, recorder), observer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_hash_files_in_order() {
        let dir = TempDir::new().unwrap();
        let meta = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = (0..6)
            .map(|i| {
                let path = dir.path().join(format!("file{i}"));
                fs::write(&path, format!("contents {i}")).unwrap();
                path
            })
            .collect();
        let recorder = MetadataRecorder::new(meta.path());

        let records = hash_files(&paths, &Dispatcher::new(3), &recorder);

        assert_eq!(records.len(), 6);
        for (path, record) in paths.iter().zip(&records) {
            let record = record.as_ref().unwrap();
            assert_eq!(&record.file, path);
            assert_eq!(
                record.digests,
                digest(path, &Algorithm::ALL).unwrap().digests
            );
        }
    }

    #[test]
    fn test_missing_file_does_not_abort_batch() {
        let dir = TempDir::new().unwrap();
        let meta = TempDir::new().unwrap();
        let good = dir.path().join("good");
        fs::write(&good, b"ok").unwrap();
        let paths = vec![good.clone(), dir.path().join("missing"), good];
        let recorder = MetadataRecorder::new(meta.path());

        let records = hash_files(&paths, &Dispatcher::new(2), &recorder);

        assert!(records[0].is_ok());
        assert!(matches!(records[1], Err(Error::Io { .. })));
        assert!(records[2].is_ok());
    }
}
