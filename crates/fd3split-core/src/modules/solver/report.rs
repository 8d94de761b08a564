//! Machine-readable record of one solver batch: every invocation's exit
//! status, aggregated after the completion barrier.

use crate::domain::{SolverFailure, SplitError, SplitResult};
use serde::Serialize;
use std::path::PathBuf;

use super::SolverTask;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TaskStatus {
    Completed,
    Failed { status: String, stderr: String },
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskOutcome {
    pub tag: String,
    pub deck: PathBuf,
    pub output: PathBuf,
    #[serde(flatten)]
    pub status: TaskStatus,
}

impl TaskOutcome {
    fn with_status(task: &SolverTask, status: TaskStatus) -> Self {
        Self {
            tag: task.tag.clone(),
            deck: task.deck_path.clone(),
            output: task.output_path.clone(),
            status,
        }
    }

    pub(super) fn completed(task: &SolverTask) -> Self {
        Self::with_status(task, TaskStatus::Completed)
    }

    pub(super) fn failed(task: &SolverTask, status: String, stderr: String) -> Self {
        Self::with_status(task, TaskStatus::Failed { status, stderr })
    }

    pub(super) fn skipped(task: &SolverTask) -> Self {
        Self::with_status(task, TaskStatus::Skipped)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub solver: PathBuf,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Outcomes in segment-tag order, independent of completion order.
    pub outcomes: Vec<TaskOutcome>,
}

impl RunReport {
    pub fn new(solver: PathBuf, outcomes: Vec<TaskOutcome>) -> Self {
        let completed = outcomes
            .iter()
            .filter(|o| o.status == TaskStatus::Completed)
            .count();
        let skipped = outcomes
            .iter()
            .filter(|o| o.status == TaskStatus::Skipped)
            .count();
        Self {
            solver,
            total: outcomes.len(),
            completed,
            failed: outcomes.len() - completed - skipped,
            skipped,
            outcomes,
        }
    }

    pub fn failures(&self) -> Vec<SolverFailure> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match &outcome.status {
                TaskStatus::Failed { status, stderr } => Some(SolverFailure {
                    tag: outcome.tag.clone(),
                    deck: outcome.deck.clone(),
                    status: status.clone(),
                    stderr: stderr.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Surfaces the collected per-segment failures as one aggregate error.
    pub fn check(&self) -> SplitResult<()> {
        let failures = self.failures();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(SplitError::SolverBatch {
                total: self.total,
                failures,
            })
        }
    }
}
