use crate::pipeline::Phase;
use std::cell::Cell;
use tracing::info;

/// Receives progress for one pass at a time. Calls come from the thread
/// driving the pool, never from workers.
pub trait Progress {
    fn start(&self, phase: Phase, total: usize);
    fn advance(&self);
    fn finish(&self);
}

pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&self, _phase: Phase, _total: usize) {}
    fn advance(&self) {}
    fn finish(&self) {}
}

/// Logs roughly every tenth of a pass.
#[derive(Default)]
pub struct LogProgress {
    phase: Cell<Option<Phase>>,
    total: Cell<usize>,
    done: Cell<usize>,
    next_report: Cell<usize>,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn step(&self) -> usize {
        (self.total.get() / 10).max(1)
    }

    fn phase_name(&self) -> &'static str {
        self.phase.get().map_or("idle", Phase::as_str)
    }
}

impl Progress for LogProgress {
    fn start(&self, phase: Phase, total: usize) {
        self.phase.set(Some(phase));
        self.total.set(total);
        self.done.set(0);
        self.next_report.set(self.step());
        info!(phase = phase.as_str(), total, "pass started");
    }

    fn advance(&self) {
        let done = self.done.get() + 1;
        self.done.set(done);
        if done >= self.next_report.get() && done < self.total.get() {
            let percent = done as f64 / self.total.get() as f64 * 100.0;
            info!(phase = self.phase_name(), done, total = self.total.get(), "{:.0}% complete", percent);
            self.next_report.set(done + self.step());
        }
    }

    fn finish(&self) {
        info!(phase = self.phase_name(), done = self.done.get(), "pass finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_progress_counts() {
        let progress = LogProgress::new();
        progress.start(Phase::MaxPass, 25);
        for _ in 0..25 {
            progress.advance();
        }
        progress.finish();
        assert_eq!(progress.done.get(), 25);
        assert_eq!(progress.phase.get(), Some(Phase::MaxPass));
    }

    #[test]
    fn test_restart_resets_counts() {
        let progress = LogProgress::new();
        progress.start(Phase::MaxPass, 3);
        progress.advance();
        progress.start(Phase::ScalePass, 3);
        assert_eq!(progress.done.get(), 0);
        assert_eq!(progress.phase_name(), "scale_pass");
    }
}
