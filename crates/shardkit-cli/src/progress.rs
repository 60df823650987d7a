//! Task progress display with progress bars.

use indicatif::{ProgressBar, ProgressStyle};

/// Progress across a batch of dispatched tasks
pub struct TaskProgress {
    bar: ProgressBar,
}

impl TaskProgress {
    /// Create a new progress tracker for `total` tasks
    #[must_use]
    pub fn new(total: u64, message: &str) -> Self {
        let bar = ProgressBar::new(total);

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg}: {spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
        {
            bar.set_style(style.progress_chars("#>-"));
        }

        bar.set_message(message.to_string());

        Self { bar }
    }

    /// Record one completed task
    pub fn inc(&self) {
        self.bar.inc(1);
    }

    /// Remove the bar so report lines print cleanly
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

/// Format bytes in human-readable format (`1536` -> `"1.50 KB"`)
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{size:.2} {}", UNITS[unit_idx])
}

/// Parse a byte count with an optional binary suffix (`K`, `M`, `G`, `T`)
///
/// Plain numbers are bytes. Suffixes are case-insensitive and may end in `B`
/// or `iB` (`64M`, `64MB`, `64MiB`).
///
/// # Errors
///
/// Returns a message suitable for clap if the value is not a positive size.
pub fn parse_size(value: &str) -> Result<u64, String> {
    let trimmed = value.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, suffix) = trimmed.split_at(split);

    let number: u64 = digits
        .parse()
        .map_err(|_| format!("invalid size: {value}"))?;

    let shift = match suffix.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 0,
        "K" | "KB" | "KIB" => 10,
        "M" | "MB" | "MIB" => 20,
        "G" | "GB" | "GIB" => 30,
        "T" | "TB" | "TIB" => 40,
        other => return Err(format!("unknown size suffix: {other}")),
    };

    number
        .checked_mul(1u64 << shift)
        .ok_or_else(|| format!("size too large: {value}"))
}
