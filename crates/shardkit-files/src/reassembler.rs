//! Sequential reassembly of chunk artifacts.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

/// Concatenate `inputs`, in the order given, into `output`
///
/// The output is truncated first. Inputs are neither sorted nor checked
/// against chunk indices. If an input fails partway, the output keeps
/// whatever was already appended.
///
/// Returns the total number of bytes written.
///
/// # Errors
///
/// Returns an error naming the input or output that failed.
///
/// # Example
///
/// ```no_run
/// use shardkit_files::reassembler::concatenate;
///
/// let parts = ["big.iso.000", "big.iso.001", "big.iso.002"];
/// let bytes = concatenate(&parts, "big.iso")?;
/// # Ok::<(), shardkit_files::Error>(())
/// ```
pub fn concatenate<P, Q>(inputs: &[P], output: Q) -> Result<u64>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let output = output.as_ref();
    let mut writer = BufWriter::new(File::create(output).map_err(|e| Error::io(output, e))?);
    let mut total = 0u64;

    for input in inputs {
        let input = input.as_ref();
        let mut reader = File::open(input).map_err(|e| Error::io(input, e))?;
        let copied = copy(&mut reader, &mut writer, input, output)?;
        tracing::debug!("Appended {} ({} bytes)", input.display(), copied);
        total += copied;
    }

    writer.flush().map_err(|e| Error::io(output, e))?;
    tracing::info!(
        "Concatenated {} files into {} ({} bytes)",
        inputs.len(),
        output.display(),
        total
    );

    Ok(total)
}

/// `io::copy` with errors attributed to the side that failed
fn copy(reader: &mut File, writer: &mut impl Write, input: &Path, output: &Path) -> Result<u64> {
    let mut buffer = [0u8; 64 * 1024];
    let mut copied = 0u64;
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => return Ok(copied),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::io(input, e)),
        };
        writer
            .write_all(&buffer[..n])
            .map_err(|e| Error::io(output, e))?;
        copied += n as u64;
    }
}
