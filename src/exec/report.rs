use crate::error::{CdbError, Result};
use std::time::Duration;

/// Lifecycle of one entry in the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// Outcome of running one entry's command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    /// Position of the entry in the input database.
    pub index: usize,
    pub file: String,
    pub directory: String,
    pub state: TaskState,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Set when the process could not be spawned.
    pub spawn_error: Option<String>,
    pub elapsed: Duration,
}

impl TaskResult {
    pub fn succeeded(&self) -> bool {
        self.state == TaskState::Succeeded
    }

    /// One-line reason for a failure, for summaries.
    pub fn failure_reason(&self) -> Option<String> {
        if self.succeeded() {
            return None;
        }
        Some(match (&self.spawn_error, self.exit_code) {
            (Some(err), _) => format!("failed to spawn: {err}"),
            (None, Some(code)) => format!("exit code {code}"),
            (None, None) => "terminated by signal".to_string(),
        })
    }
}

/// Results of a whole run, in original entry order.
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    pub results: Vec<TaskResult>,
    pub elapsed: Duration,
}

impl ExecutionReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> impl Iterator<Item = &TaskResult> {
        self.results.iter().filter(|r| !r.succeeded())
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(TaskResult::succeeded)
    }

    /// Process exit status for this run.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() { 0 } else { 1 }
    }

    /// `ExecutionFailure` if anything failed, the report otherwise.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(CdbError::ExecutionFailure {
                failed: self.failed_count(),
                total: self.total(),
            })
        }
    }
}
