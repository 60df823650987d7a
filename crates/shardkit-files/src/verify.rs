//! Re-verification of artifacts against persisted metadata records.

use crate::digest::{Algorithm, DigestResult, digest};
use crate::error::Result;
use crate::metadata::MetadataRecord;
use std::fmt;
use std::path::{Path, PathBuf};

/// Outcome of checking one artifact against its record
#[derive(Debug, Clone)]
pub struct Verification {
    /// Record the artifact was checked against
    pub record: MetadataRecord,
    /// Digests of the artifact as it is now
    pub actual: DigestResult,
}

impl Verification {
    /// File that was re-digested
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.actual.path
    }

    /// Recorded algorithms whose digest no longer matches
    #[must_use]
    pub fn mismatches(&self) -> Vec<Algorithm> {
        self.record
            .digests
            .iter()
            .filter(|(algorithm, expected)| {
                self.actual.get(**algorithm) != Some(expected.as_str())
            })
            .map(|(algorithm, _)| *algorithm)
            .collect()
    }

    /// Whether every recorded digest matches
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.mismatches().is_empty()
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mismatches = self.mismatches();
        if mismatches.is_empty() {
            write!(f, "OK: {}", self.target().display())
        } else {
            let labels: Vec<&str> = mismatches.iter().map(Algorithm::label).collect();
            write!(
                f,
                "FAILED: {} ({} mismatch)",
                self.target().display(),
                labels.join(", ")
            )
        }
    }
}

/// Re-digest the file `record` names (or `target`, if given) and compare
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn verify(record: &MetadataRecord, target: Option<&Path>) -> Result<Verification> {
    let target: PathBuf = target.map_or_else(|| record.file.clone(), Path::to_path_buf);
    let algorithms: Vec<Algorithm> = record.digests.keys().copied().collect();
    let actual = digest(&target, &algorithms)?;

    let verification = Verification {
        record: record.clone(),
        actual,
    };
    if verification.is_match() {
        tracing::debug!("{} matches its record", target.display());
    } else {
        tracing::warn!(
            "{} does not match {}",
            target.display(),
            record.metadata_file.display()
        );
    }
    Ok(verification)
}

/// Load a record file and verify the file it names
///
/// # Errors
///
/// Returns an error if the record is unreadable or malformed, or the file it
/// names cannot be read.
pub fn verify_record_file<P: AsRef<Path>>(record_path: P) -> Result<Verification> {
    let record = MetadataRecord::load(record_path)?;
    verify(&record, None)
}
