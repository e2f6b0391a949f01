use crate::reduce::GlobalMax;
use crate::ScaleError;
use itertools::Itertools;
use serde::{Serialize, Serializer};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const ERROR_LOG_NAME: &str = "scaling_errors.log";
pub const SUMMARY_NAME: &str = "scaling_summary.json";

/// Serialize a path as text, replacing bytes that are not UTF-8.
pub fn lossy_path<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

/// Pass-2 result for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    #[serde(serialize_with = "lossy_path")]
    pub path: PathBuf,
    pub success: bool,
    pub detail: String,
}

impl FileOutcome {
    pub fn succeeded(path: &Path, detail: impl Into<String>) -> Self {
        FileOutcome { path: path.to_path_buf(), success: true, detail: detail.into() }
    }

    pub fn failed(path: &Path, detail: impl Into<String>) -> Self {
        FileOutcome { path: path.to_path_buf(), success: false, detail: detail.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: Vec<FileOutcome>,
}

impl AggregateReport {
    /// Tally outcomes. Failures are ordered by path so reports are stable
    /// regardless of completion order.
    pub fn from_outcomes<I: IntoIterator<Item = FileOutcome>>(outcomes: I) -> Self {
        let (succeeded, failed): (Vec<_>, Vec<_>) =
            outcomes.into_iter().partition(|o| o.success);
        AggregateReport {
            total: succeeded.len() + failed.len(),
            succeeded: succeeded.len(),
            failed: failed.into_iter().sorted_by(|a, b| a.path.cmp(&b.path)).collect(),
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Total files: {}", self.total);
        let _ = writeln!(out, "Succeeded: {}", self.succeeded);
        let _ = writeln!(out, "Failed: {}", self.failed.len());
        if self.has_failures() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Failed files:");
            for outcome in &self.failed {
                let _ = writeln!(out, "{}: {}", outcome.path.display(), outcome.detail);
            }
        }
        out
    }
}

/// Everything a completed run knows, persisted as JSON for later triage.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub global_max: GlobalMax,
    pub max_pass_failures: usize,
    pub report: AggregateReport,
}

/// Write the failure report under `output_root`, only if something failed.
/// Returns the path written.
pub fn write_error_log(report: &AggregateReport, output_root: &Path) -> Result<Option<PathBuf>, ScaleError> {
    if !report.has_failures() {
        return Ok(None);
    }
    fs::create_dir_all(output_root)?;
    let path = output_root.join(ERROR_LOG_NAME);
    fs::write(&path, report.render())?;
    Ok(Some(path))
}

pub fn write_summary(summary: &RunSummary, output_root: &Path) -> Result<PathBuf, ScaleError> {
    fs::create_dir_all(output_root)?;
    let path = output_root.join(SUMMARY_NAME);
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(&path, json)?;
    Ok(path)
}
