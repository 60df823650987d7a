//! Configuration system for the shardkit CLI.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Upper bound accepted for an explicit worker count
const MAX_WORKERS: usize = 1024;

/// shardkit configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Worker pool configuration
    #[serde(default)]
    pub workers: WorkersConfig,
    /// Output locations
    #[serde(default)]
    pub output: OutputConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Worker pool configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkersConfig {
    /// Worker count; half the CPU cores when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for metadata records and summaries
    #[serde(default = "default_metadata_dir")]
    pub metadata_dir: PathBuf,
    /// Concatenation target when `--output` is not given
    #[serde(default = "default_concatenate_target")]
    pub concatenate_target: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values

fn default_metadata_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_concatenate_target() -> PathBuf {
    PathBuf::from("concatenated_output")
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            metadata_dir: default_metadata_dir(),
            concatenate_target: default_concatenate_target(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Get default config path
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("shardkit/config.toml")
    }

    /// Load config from the default path, falling back to built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the default file exists but cannot be loaded.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let path = Self::default_path();

        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            );
        }

        // Validate worker count
        if let Some(count) = self.workers.count {
            if count == 0 || count > MAX_WORKERS {
                anyhow::bail!("Worker count must be between 1 and {MAX_WORKERS}");
            }
        }

        if self.output.metadata_dir.as_os_str().is_empty() {
            anyhow::bail!("Metadata directory must not be empty");
        }

        if self.output.concatenate_target.as_os_str().is_empty() {
            anyhow::bail!("Concatenation target must not be empty");
        }

        Ok(())
    }
}
