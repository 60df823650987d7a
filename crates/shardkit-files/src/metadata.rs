//! Durable digest metadata.
//!
//! Every hashed artifact gets a small text record next to the other records
//! in the recorder's directory:
//!
//! ```text
//! File: /data/big.iso.000
//! Timestamp: 20240131_142501
//! MD5: 9e107d9d372bb6826bd81d3542a419d6
//! SHA256: d7a8fbb307d7809469ca9abcb0082e4f8d5651e46d3cdb762d02d0bf37c9e592
//! ```
//!
//! Batch runs additionally aggregate their records into a CSV summary.

use crate::digest::{Algorithm, DigestResult};
use crate::error::{Error, Result};
use crate::planner::base_name;
use chrono::{Local, NaiveDateTime};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// `strftime` pattern for record timestamps: `YYYYMMDD_HHMMSS`
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Header row of the batch summary CSV
pub const SUMMARY_HEADER: &str = "File,Timestamp,MD5,SHA256,Metadata_File";

/// Highest collision suffix tried before giving up on a file name
const MAX_NAME_SUFFIX: u32 = 999;

/// Source of record timestamps
pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> NaiveDateTime;
}

/// Local system time
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// One persisted digest computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    /// Artifact that was hashed
    pub file: PathBuf,
    /// When the record was written (`YYYYMMDD_HHMMSS`)
    pub timestamp: String,
    /// Hex digest per algorithm
    pub digests: BTreeMap<Algorithm, String>,
    /// Where the record itself lives
    pub metadata_file: PathBuf,
}

impl MetadataRecord {
    /// Hex digest for `algorithm`, if recorded
    #[must_use]
    pub fn get(&self, algorithm: Algorithm) -> Option<&str> {
        self.digests.get(&algorithm).map(String::as_str)
    }

    /// Recorded MD5, empty if absent
    #[must_use]
    pub fn md5(&self) -> &str {
        self.get(Algorithm::Md5).unwrap_or_default()
    }

    /// Recorded SHA-256, empty if absent
    #[must_use]
    pub fn sha256(&self) -> &str {
        self.get(Algorithm::Sha256).unwrap_or_default()
    }

    /// `file,md5,sha256,metadata_file`
    #[must_use]
    pub fn report_line(&self) -> String {
        format!(
            "{},{},{},{}",
            self.file.display(),
            self.md5(),
            self.sha256(),
            self.metadata_file.display()
        )
    }

    /// Parse a record file written by [`MetadataRecorder::record`]
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, has unknown fields, or
    /// lacks the file, timestamp, or every digest.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let malformed = |reason: String| Error::MalformedRecord {
            path: path.to_path_buf(),
            reason,
        };

        let mut file = None;
        let mut timestamp = None;
        let mut digests = BTreeMap::new();

        for (n, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once(": ")
                .ok_or_else(|| malformed(format!("line {} is not `Key: value`", n + 1)))?;

            match key {
                "File" => file = Some(PathBuf::from(value)),
                "Timestamp" => timestamp = Some(value.to_string()),
                label => {
                    let algorithm = Algorithm::from_label(label)
                        .ok_or_else(|| malformed(format!("unknown field `{label}`")))?;
                    if value.len() != algorithm.hex_len()
                        || !value.chars().all(|c| c.is_ascii_hexdigit())
                    {
                        return Err(malformed(format!("invalid {label} digest")));
                    }
                    digests.insert(algorithm, value.to_ascii_lowercase());
                }
            }
        }

        let file = file.ok_or_else(|| malformed("missing `File`".to_string()))?;
        let timestamp = timestamp.ok_or_else(|| malformed("missing `Timestamp`".to_string()))?;
        if digests.is_empty() {
            return Err(malformed("no digests recorded".to_string()));
        }

        Ok(Self {
            file,
            timestamp,
            digests,
            metadata_file: path.to_path_buf(),
        })
    }
}

/// Writes metadata records and batch summaries into one directory
pub struct MetadataRecorder {
    dir: PathBuf,
    clock: Box<dyn Clock>,
}

impl MetadataRecorder {
    /// Recorder writing into `dir` with local-time timestamps
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(dir, LocalClock)
    }

    /// Recorder with a custom timestamp source
    pub fn with_clock(dir: impl Into<PathBuf>, clock: impl Clock + 'static) -> Self {
        Self {
            dir: dir.into(),
            clock: Box::new(clock),
        }
    }

    /// Directory records are written to
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current timestamp in record format
    #[must_use]
    pub fn timestamp(&self) -> String {
        self.clock.now().format(TIMESTAMP_FORMAT).to_string()
    }

    /// Persist `digest` as `hash_table_<base>_<timestamp>.txt`
    ///
    /// If a record of that name already exists (same base name within the
    /// same second), `_1`, `_2`, ... is appended before the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be created or written.
    pub fn record(&self, digest: &DigestResult) -> Result<MetadataRecord> {
        let timestamp = self.timestamp();
        let stem = format!("hash_table_{}_{}", base_name(&digest.path), timestamp);
        let (metadata_file, file) = create_unique(&self.dir, &stem, "txt")?;

        let mut out = BufWriter::new(file);
        let written = (|| -> io::Result<()> {
            writeln!(out, "File: {}", digest.path.display())?;
            writeln!(out, "Timestamp: {timestamp}")?;
            for (algorithm, hex) in &digest.digests {
                writeln!(out, "{}: {hex}", algorithm.label())?;
            }
            out.flush()
        })();
        written.map_err(|e| Error::io(&metadata_file, e))?;

        tracing::debug!(
            "Recorded digests of {} in {}",
            digest.path.display(),
            metadata_file.display()
        );

        Ok(MetadataRecord {
            file: digest.path.clone(),
            timestamp,
            digests: digest.digests.clone(),
            metadata_file,
        })
    }

    /// Write `hash_results_<timestamp>.csv` with one row per record
    ///
    /// # Errors
    ///
    /// Returns an error if the summary cannot be created or written.
    pub fn write_summary(&self, records: &[MetadataRecord]) -> Result<PathBuf> {
        let stem = format!("hash_results_{}", self.timestamp());
        let (path, file) = create_unique(&self.dir, &stem, "csv")?;

        let mut out = BufWriter::new(file);
        let written = (|| -> io::Result<()> {
            writeln!(out, "{SUMMARY_HEADER}")?;
            for record in records {
                let row = [
                    record.file.display().to_string(),
                    record.timestamp.clone(),
                    record.md5().to_string(),
                    record.sha256().to_string(),
                    record.metadata_file.display().to_string(),
                ];
                let fields: Vec<String> = row.iter().map(|f| csv_field(f)).collect();
                writeln!(out, "{}", fields.join(","))?;
            }
            out.flush()
        })();
        written.map_err(|e| Error::io(&path, e))?;

        tracing::info!("Wrote summary of {} records to {}", records.len(), path.display());
        Ok(path)
    }
}

/// Create `<dir>/<stem>.<ext>`, falling back to `<stem>_<n>.<ext>` when taken
fn create_unique(dir: &Path, stem: &str, ext: &str) -> Result<(PathBuf, File)> {
    let mut path = dir.join(format!("{stem}.{ext}"));
    let mut suffix = 0;

    loop {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && suffix < MAX_NAME_SUFFIX => {
                suffix += 1;
                tracing::debug!("{} exists, trying suffix {}", path.display(), suffix);
                path = dir.join(format!("{stem}_{suffix}.{ext}"));
            }
            Err(e) => return Err(Error::io(path, e)),
        }
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
