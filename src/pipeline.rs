//! Two-pass run: find the corpus maximum, then rescale every file by it.
//!
//! `Discovering -> MaxPass -> Barrier -> ScalePass -> Reporting -> Done`
//!
//! The max pass drains completely before the barrier folds the global
//! maximum, and no scale task is admitted until that value exists. Nothing
//! is written under the output root before the barrier passes.

use crate::config::ScaleConfig;
use crate::corpus;
use crate::pool::WorkerPool;
use crate::progress::Progress;
use crate::reduce::{self, FileMax, GlobalMax};
use crate::report::{self, AggregateReport, FileOutcome, RunSummary};
use crate::scale;
use crate::ScaleError;
use std::path::{Path, PathBuf};
use tracing::{info, info_span, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discovering,
    MaxPass,
    Barrier,
    ScalePass,
    Reporting,
    Done,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Discovering => "discovering",
            Phase::MaxPass => "max_pass",
            Phase::Barrier => "barrier",
            Phase::ScalePass => "scale_pass",
            Phase::Reporting => "reporting",
            Phase::Done => "done",
        }
    }
}

/// Pass 1: one [`FileMax`] per file, in completion order. Panicking tasks
/// become failed entries.
pub fn max_pass(files: &[PathBuf], pool: &WorkerPool, progress: &dyn Progress) -> Result<Vec<FileMax>, ScaleError> {
    progress.start(Phase::MaxPass, files.len());
    let completed = pool.run(files, |path| reduce::file_max(path), progress)?;
    progress.finish();

    Ok(completed
        .into_iter()
        .map(|c| match c.result {
            Ok(file_max) => file_max,
            Err(p) => FileMax::failed(files[c.index].clone(), format!("worker panicked: {}", p.message)),
        })
        .collect())
}

/// Pass 2: rescale each file into its mirrored location under `output_root`.
pub fn scale_pass(
    files: &[PathBuf],
    input_root: &Path,
    output_root: &Path,
    global_max: GlobalMax,
    pool: &WorkerPool,
    progress: &dyn Progress,
) -> Result<Vec<FileOutcome>, ScaleError> {
    progress.start(Phase::ScalePass, files.len());
    let completed = pool.run(
        files,
        |path| match corpus::mirror_path(input_root, output_root, path) {
            Ok(destination) => scale::scale_file(path, &destination, global_max),
            Err(e) => FileOutcome::failed(path, e.to_string()),
        },
        progress,
    )?;
    progress.finish();

    Ok(completed
        .into_iter()
        .map(|c| match c.result {
            Ok(outcome) => outcome,
            Err(p) => FileOutcome::failed(&files[c.index], format!("worker panicked: {}", p.message)),
        })
        .collect())
}

pub struct Pipeline<'a> {
    config: ScaleConfig,
    pool: WorkerPool,
    progress: &'a dyn Progress,
    phase: Phase,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: ScaleConfig, progress: &'a dyn Progress) -> Self {
        let pool = WorkerPool::new(config.workers);
        Pipeline {
            config,
            pool,
            progress,
            phase: Phase::Discovering,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        info!(from = self.phase.as_str(), to = phase.as_str(), "phase");
        self.phase = phase;
    }

    pub fn run(&mut self) -> Result<RunSummary, ScaleError> {
        self.config.validate()?;
        let input_root = self.config.input_root.clone();
        let output_root = self.config.output_root.clone();

        let files = corpus::discover(&input_root)?;
        info!(files = files.len(), workers = self.pool.workers(), "corpus discovered");

        self.enter(Phase::MaxPass);
        let maxima = {
            let _span = info_span!("max_pass", files = files.len()).entered();
            max_pass(&files, &self.pool, self.progress)?
        };
        let max_pass_failures = maxima.iter().filter(|m| m.is_failed()).count();
        for failed in maxima.iter().filter(|m| m.is_failed()) {
            warn!(path = %failed.path.display(), error = failed.error.as_deref().unwrap_or(""), "max pass failed");
        }

        self.enter(Phase::Barrier);
        let global_max = reduce::global_max(&maxima)?;
        info!(global_max = global_max.value(), failures = max_pass_failures, "global maximum fixed");

        self.enter(Phase::ScalePass);
        let outcomes = {
            let _span = info_span!("scale_pass", files = files.len()).entered();
            scale_pass(&files, &input_root, &output_root, global_max, &self.pool, self.progress)?
        };

        self.enter(Phase::Reporting);
        let report = AggregateReport::from_outcomes(outcomes);
        if let Some(path) = report::write_error_log(&report, &output_root)? {
            warn!(failed = report.failed.len(), log = %path.display(), "some files failed");
        }
        let summary = RunSummary {
            global_max,
            max_pass_failures,
            report,
        };
        if let Err(e) = report::write_summary(&summary, &output_root) {
            warn!(error = %e, "could not write run summary");
        }
        info!(
            total = summary.report.total,
            succeeded = summary.report.succeeded,
            failed = summary.report.failed.len(),
            "run complete"
        );

        self.enter(Phase::Done);
        Ok(summary)
    }
}

/// Run the whole pipeline for `config`.
pub fn run(config: ScaleConfig, progress: &dyn Progress) -> Result<RunSummary, ScaleError> {
    Pipeline::new(config, progress).run()
}
