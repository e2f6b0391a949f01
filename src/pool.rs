//! Fixed-size worker pool shared by both passes.
//!
//! Workers pull item indices from one shared queue, so completion order
//! is arbitrary. `run` returns only after every item has finished, which
//! is what makes it usable as the barrier between passes.

use crate::progress::Progress;
use crate::ScaleError;
use crossbeam_channel::unbounded;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use tracing::{debug, warn};

/// A task that panicked instead of returning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPanic {
    pub message: String,
}

/// One finished item: its position in the input and what the task produced.
#[derive(Debug)]
pub struct Completed<R> {
    pub index: usize,
    pub result: Result<R, TaskPanic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        WorkerPool { workers: workers.max(1) }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Apply `task` to every item and wait for all of them.
    ///
    /// Results come back in completion order. A panicking task is reported
    /// as [`TaskPanic`] for its item and does not disturb its siblings.
    pub fn run<T, R, F>(
        &self,
        items: &[T],
        task: F,
        progress: &dyn Progress,
    ) -> Result<Vec<Completed<R>>, ScaleError>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let (job_tx, job_rx) = unbounded::<usize>();
        for index in 0..items.len() {
            job_tx
                .send(index)
                .map_err(|_| ScaleError::Other("job queue closed early".to_string()))?;
        }
        drop(job_tx);

        let (done_tx, done_rx) = unbounded::<Completed<R>>();
        let task = &task;
        let worker_count = self.workers.min(items.len());

        thread::scope(|scope| {
            let mut spawned = 0;
            for worker in 0..worker_count {
                let job_rx = job_rx.clone();
                let done_tx = done_tx.clone();
                let spawn = thread::Builder::new()
                    .name(format!("segy-worker-{}", worker))
                    .spawn_scoped(scope, move || {
                        for index in job_rx.iter() {
                            let result = panic::catch_unwind(AssertUnwindSafe(|| task(&items[index])))
                                .map_err(|payload| TaskPanic { message: panic_message(payload.as_ref()) });
                            if done_tx.send(Completed { index, result }).is_err() {
                                break;
                            }
                        }
                    });
                match spawn {
                    Ok(_) => spawned += 1,
                    Err(e) => warn!(worker, error = %e, "could not spawn worker"),
                }
            }
            drop(done_tx);
            debug!(spawned, items = items.len(), "worker pool started");

            if spawned == 0 {
                return Err(ScaleError::Other("no worker threads could be started".to_string()));
            }

            let mut completed = Vec::with_capacity(items.len());
            for done in done_rx.iter() {
                progress.advance();
                completed.push(done);
            }
            Ok(completed)
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
