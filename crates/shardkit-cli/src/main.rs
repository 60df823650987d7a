//! shardkit CLI
//!
//! Split large files into chunks, put them back together, and record or
//! verify MD5/SHA-256 digests.

mod config;
mod inputs;
mod mode;
mod progress;

use anyhow::Context;
use clap::Parser;
use console::style;
use shardkit_files::{
    ChunkExecutor, Dispatcher, MetadataRecorder, PartitionPolicy, Splitter, concatenate,
    hash_file, hash_files_observed, verify_record_file,
};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use config::Config;
use mode::{Mode, ModeFlags};
use progress::{TaskProgress, format_bytes, parse_size};

/// shardkit - split, concatenate, and hash large files in parallel
#[derive(Parser, Debug)]
#[command(name = "shardkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input files or directories
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Split files into chunks
    #[arg(long)]
    split: bool,

    /// Concatenate files, in the order given, into one output
    #[arg(long)]
    concatenate: bool,

    /// Calculate MD5 and SHA256 hashes and write metadata records
    #[arg(long)]
    hash: bool,

    /// Check metadata record files against the files they describe
    #[arg(long)]
    verify: bool,

    /// Chunk size for splitting (bytes, or with a K/M/G/T suffix)
    #[arg(long, value_name = "BYTES", value_parser = parse_size)]
    chunk_size: Option<u64>,

    /// Number of files to split into
    #[arg(long, value_name = "N")]
    num_files: Option<u64>,

    /// Output file for concatenation
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Directory for chunks (default: next to each source file)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Directory for metadata records and summaries
    #[arg(long, value_name = "DIR")]
    metadata_dir: Option<PathBuf>,

    /// Number of worker threads (default: number of CPU cores / 2)
    #[arg(short = 'j', long, value_name = "N", visible_alias = "processes")]
    workers: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Cli {
    fn mode_flags(&self) -> ModeFlags {
        ModeFlags {
            split: self.split,
            concatenate: self.concatenate,
            hash: self.hash,
            verify: self.verify,
            chunk_size: self.chunk_size,
            num_files: self.num_files,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Flag combinations are checked before any file is touched
    let mode = Mode::from_flags(&cli.mode_flags())?;

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::load_or_default()?,
    };
    config.validate()?;

    // Initialize logging
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.to_lowercase()
    };
    tracing_subscriber::fmt()
        .with_env_filter(level.as_str())
        .with_writer(std::io::stderr)
        .init();

    let inputs = inputs::expand(&cli.paths)?;
    for skipped in &inputs.skipped {
        eprintln!(
            "{} {} is not a valid file or directory. Skipping.",
            style("Warning:").yellow().bold(),
            skipped.display()
        );
    }

    let cpus = num_cpus::get();
    let dispatcher = Dispatcher::for_host(cli.workers.or(config.workers.count));
    println!(
        "Using {} out of {} available CPU cores",
        dispatcher.workers(),
        cpus
    );

    let metadata_dir = cli
        .metadata_dir
        .clone()
        .unwrap_or_else(|| config.output.metadata_dir.clone());

    let failures = match mode {
        Mode::Split { policy, hash } => run_split(
            &inputs.files,
            policy,
            hash,
            cli.output_dir.as_deref(),
            &dispatcher,
            &metadata_dir,
        )?,
        Mode::Concatenate { hash } => {
            let output = cli
                .output
                .clone()
                .unwrap_or_else(|| config.output.concatenate_target.clone());
            run_concatenate(&inputs.files, &output, hash, &metadata_dir)?
        }
        Mode::Hash => run_hash(&inputs.files, &dispatcher, &metadata_dir, cli.verbose)?,
        Mode::Verify => run_verify(&inputs.files, &dispatcher)?,
    };

    if failures > 0 {
        anyhow::bail!("{failures} operation(s) failed");
    }

    Ok(())
}

/// Split every file, hashing the source and each chunk when asked
fn run_split(
    files: &[PathBuf],
    policy: PartitionPolicy,
    hash: bool,
    output_dir: Option<&Path>,
    dispatcher: &Dispatcher,
    metadata_dir: &Path,
) -> anyhow::Result<usize> {
    let recorder = if hash {
        Some(open_recorder(metadata_dir)?)
    } else {
        None
    };
    let executor = match &recorder {
        Some(recorder) => ChunkExecutor::with_hashing(recorder),
        None => ChunkExecutor::new(),
    };
    let splitter = Splitter::new(*dispatcher, executor);
    let mut failures = 0;

    for file in files {
        let size = match fs::metadata(file) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                report_error(format!("{}: {e}", file.display()));
                failures += 1;
                continue;
            }
        };
        println!("Splitting file: {} ({})", file.display(), format_bytes(size));

        if let Some(recorder) = &recorder {
            match hash_file(file, recorder) {
                Ok(record) => println!("Original file: {}", record.report_line()),
                Err(e) => {
                    report_error(e);
                    failures += 1;
                }
            }
        }

        let progress = TaskProgress::new(policy.chunk_count(size), "Splitting");
        let outcome = splitter.split_observed(file, policy, output_dir, |_, _| progress.inc());
        progress.finish_and_clear();

        match outcome {
            Ok(outcome) => {
                for report in &outcome.reports {
                    match report {
                        Ok(report) => println!("{report}"),
                        Err(e) => report_error(e),
                    }
                }
                failures += outcome.failures();
                println!("Split into {} chunks", outcome.chunk_count());
            }
            Err(e) => {
                report_error(e);
                failures += 1;
            }
        }
    }

    Ok(failures)
}

/// Concatenate all inputs into `output`, then optionally hash it
fn run_concatenate(
    files: &[PathBuf],
    output: &Path,
    hash: bool,
    metadata_dir: &Path,
) -> anyhow::Result<usize> {
    println!("Concatenating files to: {}", output.display());
    let bytes = concatenate(files, output)?;
    println!("Wrote {} from {} files", format_bytes(bytes), files.len());

    if hash {
        let recorder = open_recorder(metadata_dir)?;
        let record = hash_file(output, &recorder)?;
        println!("Concatenated file: {}", record.report_line());
    }

    Ok(0)
}

/// Hash every input in parallel and write the CSV summary
fn run_hash(
    files: &[PathBuf],
    dispatcher: &Dispatcher,
    metadata_dir: &Path,
    verbose: bool,
) -> anyhow::Result<usize> {
    let recorder = open_recorder(metadata_dir)?;

    let progress = TaskProgress::new(files.len() as u64, "Processing files");
    let results = hash_files_observed(files, dispatcher, &recorder, |_, _| progress.inc());
    progress.finish_and_clear();

    let mut records = Vec::with_capacity(results.len());
    let mut failures = 0;
    for result in results {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                report_error(e);
                failures += 1;
            }
        }
    }

    let summary = recorder.write_summary(&records)?;
    println!("Results saved to: {}", summary.display());

    if verbose {
        println!("\nFile,MD5,SHA256,Metadata_File");
        for record in &records {
            println!("{}", record.report_line());
        }
    }

    Ok(failures)
}

/// Verify every metadata record given as input
fn run_verify(files: &[PathBuf], dispatcher: &Dispatcher) -> anyhow::Result<usize> {
    let tasks: Vec<&Path> = files.iter().map(PathBuf::as_path).collect();

    let progress = TaskProgress::new(tasks.len() as u64, "Verifying");
    let results = dispatcher.run_observed(tasks, verify_record_file, |_, _| progress.inc());
    progress.finish_and_clear();

    let mut failures = 0;
    for result in results {
        match result {
            Ok(verification) if verification.is_match() => {
                println!("{}", style(verification).green());
            }
            Ok(verification) => {
                println!("{}", style(verification).red());
                failures += 1;
            }
            Err(e) => {
                report_error(e);
                failures += 1;
            }
        }
    }

    println!(
        "{} of {} records verified",
        files.len() - failures,
        files.len()
    );
    Ok(failures)
}

fn open_recorder(dir: &Path) -> anyhow::Result<MetadataRecorder> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating metadata directory {}", dir.display()))?;
    Ok(MetadataRecorder::new(dir))
}

fn report_error(e: impl Display) {
    eprintln!("{} {e}", style("Error:").red().bold());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_split_flags() {
        let cli = Cli::try_parse_from([
            "shardkit",
            "--split",
            "--hash",
            "--chunk-size",
            "64M",
            "--processes",
            "3",
            "big.iso",
        ])
        .unwrap();

        assert_eq!(cli.chunk_size, Some(64 << 20));
        assert_eq!(cli.workers, Some(3));
        assert_eq!(
            Mode::from_flags(&cli.mode_flags()).unwrap(),
            Mode::Split {
                policy: PartitionPolicy::ChunkSize(64 << 20),
                hash: true
            }
        );
    }

    #[test]
    fn test_paths_required() {
        assert!(Cli::try_parse_from(["shardkit", "--hash"]).is_err());
    }

    #[test]
    fn test_conflicting_modes_rejected() {
        let cli =
            Cli::try_parse_from(["shardkit", "--split", "--concatenate", "a", "b"]).unwrap();
        assert!(Mode::from_flags(&cli.mode_flags()).is_err());
    }
}
