//! Streaming content digests.
//!
//! Every requested algorithm is fed from the same read loop, so a file is
//! read exactly once no matter how many digests are produced.

use crate::STREAM_BLOCK_SIZE;
use crate::error::{Error, Result};
use md5::Md5;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Supported digest algorithms
///
/// Ordering follows the column order of metadata records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Algorithm {
    /// MD5, 128-bit. Kept for compatibility with existing checksum lists.
    Md5,
    /// SHA-256
    Sha256,
}

impl Algorithm {
    /// Algorithms computed whenever hashing is requested
    pub const ALL: [Algorithm; 2] = [Algorithm::Md5, Algorithm::Sha256];

    /// Label used in record files and CSV headers
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha256 => "SHA256",
        }
    }

    /// Look up an algorithm by its record label
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.label() == label)
    }

    /// Length of the hex-encoded digest
    #[must_use]
    pub fn hex_len(&self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha256 => 64,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Incremental state for one algorithm
enum Hasher {
    Md5(Md5),
    Sha256(Sha256),
}

impl Hasher {
    fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Md5 => Self::Md5(Md5::new()),
            Algorithm::Sha256 => Self::Sha256(Sha256::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Md5(h) => hex::encode(h.finalize()),
            Self::Sha256(h) => hex::encode(h.finalize()),
        }
    }
}

/// Digests of one file, keyed by algorithm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestResult {
    /// File that was read
    pub path: PathBuf,
    /// Lowercase hex digest per algorithm
    pub digests: BTreeMap<Algorithm, String>,
}

impl DigestResult {
    /// Hex digest for `algorithm`, if it was computed
    #[must_use]
    pub fn get(&self, algorithm: Algorithm) -> Option<&str> {
        self.digests.get(&algorithm).map(String::as_str)
    }

    /// MD5 hex digest, empty if not computed
    #[must_use]
    pub fn md5(&self) -> &str {
        self.get(Algorithm::Md5).unwrap_or_default()
    }

    /// SHA-256 hex digest, empty if not computed
    #[must_use]
    pub fn sha256(&self) -> &str {
        self.get(Algorithm::Sha256).unwrap_or_default()
    }
}

/// Digest everything `reader` yields, in blocks of [`STREAM_BLOCK_SIZE`]
///
/// # Errors
///
/// Returns the first read error; no partial digest is produced.
pub fn digest_reader<R: Read>(
    mut reader: R,
    algorithms: &[Algorithm],
) -> io::Result<BTreeMap<Algorithm, String>> {
    let selected: BTreeSet<Algorithm> = algorithms.iter().copied().collect();
    let mut hashers: Vec<(Algorithm, Hasher)> =
        selected.into_iter().map(|a| (a, Hasher::new(a))).collect();

    let mut buffer = [0u8; STREAM_BLOCK_SIZE];
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        for (_, hasher) in &mut hashers {
            hasher.update(&buffer[..n]);
        }
    }

    Ok(hashers
        .into_iter()
        .map(|(a, h)| (a, h.finalize_hex()))
        .collect())
}

/// Digest a file with the given algorithms
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
///
/// # Example
///
/// ```no_run
/// use shardkit_files::digest::{Algorithm, digest};
///
/// let result = digest("/path/to/file", &Algorithm::ALL)?;
/// println!("{} {}", result.md5(), result.sha256());
/// # Ok::<(), shardkit_files::Error>(())
/// ```
pub fn digest<P: AsRef<Path>>(path: P, algorithms: &[Algorithm]) -> Result<DigestResult> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let digests = digest_reader(file, algorithms).map_err(|e| Error::io(path, e))?;

    tracing::debug!("Digested {}", path.display());

    Ok(DigestResult {
        path: path.to_path_buf(),
        digests,
    })
}
