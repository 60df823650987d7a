//! Operation selection from command-line flags.

use shardkit_files::{ConfigError, PartitionPolicy};

/// Raw operation flags as parsed from the command line
#[derive(Debug, Clone, Default)]
pub struct ModeFlags {
    /// `--split`
    pub split: bool,
    /// `--concatenate`
    pub concatenate: bool,
    /// `--hash`
    pub hash: bool,
    /// `--verify`
    pub verify: bool,
    /// `--chunk-size`
    pub chunk_size: Option<u64>,
    /// `--num-files`
    pub num_files: Option<u64>,
}

/// Validated operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Split each input, optionally hashing the source and every chunk
    Split {
        /// Chunk size or count
        policy: PartitionPolicy,
        /// Whether to hash and record
        hash: bool,
    },
    /// Concatenate all inputs, optionally hashing the result
    Concatenate {
        /// Whether to hash and record
        hash: bool,
    },
    /// Hash every input and write a summary
    Hash,
    /// Check metadata records against the files they name
    Verify,
}

impl Mode {
    /// Resolve flags into a single operation
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if no operation is selected, incompatible
    /// operations are combined, or splitting lacks exactly one sizing option.
    pub fn from_flags(flags: &ModeFlags) -> Result<Self, ConfigError> {
        if !(flags.split || flags.concatenate || flags.hash || flags.verify) {
            return Err(ConfigError::NoOperation);
        }

        if flags.split && flags.concatenate {
            return Err(ConfigError::ConflictingOperations("split", "concatenate"));
        }

        if flags.verify {
            let other = [
                (flags.split, "split"),
                (flags.concatenate, "concatenate"),
                (flags.hash, "hash"),
            ]
            .into_iter()
            .find_map(|(set, name)| set.then_some(name));
            if let Some(other) = other {
                return Err(ConfigError::ConflictingOperations("verify", other));
            }
            return Ok(Self::Verify);
        }

        if flags.split {
            let policy = PartitionPolicy::from_options(flags.chunk_size, flags.num_files)?;
            return Ok(Self::Split {
                policy,
                hash: flags.hash,
            });
        }

        if flags.concatenate {
            return Ok(Self::Concatenate { hash: flags.hash });
        }

        Ok(Self::Hash)
    }
}
