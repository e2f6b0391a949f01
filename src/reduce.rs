use crate::segy::{SegyFile, TraceStore};
use crate::ScaleError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A trace counts toward the maximum, and gets scaled, only if it holds at
/// least one finite sample. Empty, all-NaN and all-Inf traces are invalid.
pub fn is_valid_trace(samples: &[f32]) -> bool {
    samples.iter().any(|s| s.is_finite())
}

/// Largest finite absolute sample in a trace, `None` for invalid traces.
pub fn trace_max(samples: &[f32]) -> Option<f64> {
    samples
        .iter()
        .filter(|s| s.is_finite())
        .map(|s| s.abs() as f64)
        .reduce(f64::max)
}

/// Maximum over every valid trace in a store, `0.0` when none are valid.
pub fn store_max<S: TraceStore>(store: &mut S) -> Result<f64, ScaleError> {
    let mut max = 0.0f64;
    for index in 0..store.trace_count() {
        let samples = store.read_trace(index)?;
        if let Some(m) = trace_max(&samples) {
            max = max.max(m);
        }
    }
    Ok(max)
}

/// Pass-1 result for one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileMax {
    #[serde(serialize_with = "crate::report::lossy_path")]
    pub path: PathBuf,
    pub value: f64,
    pub error: Option<String>,
}

impl FileMax {
    pub fn ok(path: PathBuf, value: f64) -> Self {
        FileMax { path, value, error: None }
    }

    pub fn failed(path: PathBuf, detail: String) -> Self {
        FileMax { path, value: 0.0, error: Some(detail) }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Open `path` read-only and fold its maximum. Decode errors are captured
/// in the result rather than returned.
pub fn file_max(path: &Path) -> FileMax {
    let result = SegyFile::open_read(path).and_then(|mut file| store_max(&mut file));
    match result {
        Ok(value) => {
            debug!(path = %path.display(), value, "file maximum");
            FileMax::ok(path.to_path_buf(), value)
        }
        Err(e) => FileMax::failed(path.to_path_buf(), e.to_string()),
    }
}

/// The corpus-wide scale. Always finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct GlobalMax(f64);

impl GlobalMax {
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(GlobalMax(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Fold per-file maxima into the global maximum. Failed entries and
/// non-finite or non-positive values are ignored; if nothing remains
/// there is nothing to scale by.
pub fn global_max<'a, I>(maxima: I) -> Result<GlobalMax, ScaleError>
where
    I: IntoIterator<Item = &'a FileMax>,
{
    maxima
        .into_iter()
        .filter(|m| !m.is_failed())
        .filter_map(|m| GlobalMax::new(m.value))
        .map(GlobalMax::value)
        .reduce(f64::max)
        .and_then(GlobalMax::new)
        .ok_or(ScaleError::NoValidData)
}
