use crate::reduce::{is_valid_trace, GlobalMax};
use crate::report::FileOutcome;
use crate::segy::{SegyFile, TraceStore};
use crate::ScaleError;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::Path;
use tracing::{debug, warn};

/// How many traces of a file were rescaled versus left unscaled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceTally {
    pub scaled: usize,
    pub skipped: usize,
}

/// Replace every non-finite sample with `0.0`. Returns true if anything changed.
pub fn sanitize(samples: &mut [f32]) -> bool {
    let mut changed = false;
    for s in samples.iter_mut().filter(|s| !s.is_finite()) {
        *s = 0.0;
        changed = true;
    }
    changed
}

/// Divide every sample by the global maximum, zeroing non-finite results.
pub fn scale_samples(samples: &mut [f32], scale: GlobalMax) {
    let divisor = scale.value();
    for s in samples.iter_mut() {
        *s = (*s as f64 / divisor) as f32;
    }
    sanitize(samples);
}

/// Rescale every valid trace of `store` in place.
///
/// Invalid traces (no finite samples) are not divided; their non-finite
/// samples are zeroed so the output never carries NaN or Inf.
pub fn scale_store<S: TraceStore>(store: &mut S, scale: GlobalMax) -> Result<TraceTally, ScaleError> {
    let mut tally = TraceTally::default();
    for index in 0..store.trace_count() {
        let mut samples = store.read_trace(index)?;
        if is_valid_trace(&samples) {
            scale_samples(&mut samples, scale);
            store.write_trace(index, &samples)?;
            tally.scaled += 1;
        } else {
            if sanitize(&mut samples) {
                store.write_trace(index, &samples)?;
            }
            tally.skipped += 1;
        }
    }
    Ok(tally)
}

/// Stream `source` into a freshly created `destination`. The duplicate gets
/// default permissions, so read-only archives still yield writable copies.
fn duplicate(source: &Path, destination: &Path) -> Result<u64, ScaleError> {
    let mut reader = File::open(source).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ScaleError::NotFound(source.to_path_buf()),
        _ => ScaleError::Io(e),
    })?;
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(destination)?;
    let copied = io::copy(&mut reader, &mut writer)?;
    writer.sync_all()?;
    Ok(copied)
}

fn duplicate_and_scale(source: &Path, destination: &Path, scale: GlobalMax) -> Result<TraceTally, ScaleError> {
    duplicate(source, destination)?;
    let mut file = SegyFile::open_read_write(destination)?;
    let tally = scale_store(&mut file, scale)?;
    file.close()?;
    Ok(tally)
}

/// Turn a transform result into an outcome, removing the output unless
/// every step succeeded and at least one trace was scaled.
fn settle(source: &Path, destination: &Path, result: Result<TraceTally, ScaleError>) -> FileOutcome {
    let outcome = match result {
        Ok(tally) if tally.scaled == 0 => FileOutcome::failed(source, "no valid traces"),
        Ok(tally) => {
            debug!(path = %source.display(), scaled = tally.scaled, skipped = tally.skipped, "scaled file");
            FileOutcome::succeeded(
                source,
                format!("scaled {} traces, skipped {}", tally.scaled, tally.skipped),
            )
        }
        Err(e) => FileOutcome::failed(source, e.to_string()),
    };

    if !outcome.success && destination.exists() {
        if let Err(e) = fs::remove_file(destination) {
            warn!(path = %destination.display(), error = %e, "could not remove failed output");
        }
    }
    outcome
}

/// Duplicate `source` byte-for-byte to `destination`, then rescale the
/// sample payloads of the duplicate. A file with no valid traces is a
/// failure. Failed outputs are removed so only fully scaled files remain.
pub fn scale_file(source: &Path, destination: &Path, scale: GlobalMax) -> FileOutcome {
    settle(source, destination, duplicate_and_scale(source, destination, scale))
}
