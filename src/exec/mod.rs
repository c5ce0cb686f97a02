//! Re-running rewritten commands under a bounded worker pool.
//!
//! Every entry moves `Pending -> Running -> {Succeeded, Failed}`. Workers race
//! for the next pending entry, so completion order is arbitrary, but each
//! result lands in the slot of its entry's original position and the report
//! comes back in input order. A failing entry never stops the others.

mod report;
mod runner;

pub use report::{ExecutionReport, TaskResult, TaskState};
pub use runner::{ProcessRunner, RunOutput, Runner};

use crate::cdb::CompileEntry;
use crate::error::Result;
use rayon::prelude::*;
use serde::Deserialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, trace};

/// `[run]` table of the configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Execute every command after transforming.
    pub enabled: bool,
    /// Worker count; 0 means one per available CPU.
    pub threads: usize,
}

impl RunOptions {
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            default_threads()
        } else {
            self.threads
        }
    }
}

/// Host parallelism, falling back to a single worker.
pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Receives state transitions while the executor runs.
///
/// Called from worker threads.
pub trait ExecutionObserver: Sync {
    fn on_state(&self, _index: usize, _entry: &CompileEntry, _state: TaskState) {}

    fn on_finished(&self, _result: &TaskResult) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl ExecutionObserver for NoopObserver {}

/// Fixed-size pool running entries through a [`Runner`].
#[derive(Debug)]
pub struct Executor<R: Runner = ProcessRunner> {
    threads: usize,
    runner: R,
}

impl Executor<ProcessRunner> {
    pub fn new(threads: usize) -> Self {
        Self::with_runner(threads, ProcessRunner)
    }
}

impl<R: Runner> Executor<R> {
    pub fn with_runner(threads: usize, runner: R) -> Self {
        Self {
            threads: threads.max(1),
            runner,
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run every entry and collect the results in input order.
    ///
    /// Only fails if the worker pool itself cannot be created; command
    /// failures are recorded in the report.
    pub fn execute(
        &self,
        entries: &[CompileEntry],
        observer: &dyn ExecutionObserver,
    ) -> Result<ExecutionReport> {
        let start = Instant::now();
        for (index, entry) in entries.iter().enumerate() {
            observer.on_state(index, entry, TaskState::Pending);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("cdbx-worker-{i}"))
            .build()?;

        debug!(entries = entries.len(), threads = self.threads, "executing commands");
        let results: Vec<TaskResult> = pool.install(|| {
            entries
                .par_iter()
                .enumerate()
                .map(|(index, entry)| self.run_one(index, entry, observer))
                .collect()
        });

        let report = ExecutionReport {
            results,
            elapsed: start.elapsed(),
        };
        debug!(
            failed = report.failed_count(),
            total = report.total(),
            elapsed = ?report.elapsed,
            "execution finished"
        );
        Ok(report)
    }

    fn run_one(
        &self,
        index: usize,
        entry: &CompileEntry,
        observer: &dyn ExecutionObserver,
    ) -> TaskResult {
        observer.on_state(index, entry, TaskState::Running);
        let started = Instant::now();
        trace!(index, file = %entry.file, "spawning");

        let (state, exit_code, stdout, stderr, spawn_error) =
            match self.runner.run(&entry.arguments, Path::new(&entry.directory)) {
                Ok(output) => {
                    let state = if output.success() {
                        TaskState::Succeeded
                    } else {
                        TaskState::Failed
                    };
                    (
                        state,
                        output.exit_code,
                        String::from_utf8_lossy(&output.stdout).into_owned(),
                        String::from_utf8_lossy(&output.stderr).into_owned(),
                        None,
                    )
                }
                Err(e) => (
                    TaskState::Failed,
                    None,
                    String::new(),
                    String::new(),
                    Some(e.to_string()),
                ),
            };

        let result = TaskResult {
            index,
            file: entry.file.clone(),
            directory: entry.directory.clone(),
            state,
            exit_code,
            stdout,
            stderr,
            spawn_error,
            elapsed: started.elapsed(),
        };
        observer.on_state(index, entry, result.state);
        observer.on_finished(&result);
        result
    }
}
