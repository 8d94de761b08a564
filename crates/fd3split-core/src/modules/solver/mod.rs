//! Concurrent driver for the external disentangling solver. Each emitted
//! segment deck becomes one solver invocation (`solver < deck > out`);
//! invocations share no state and run on a bounded worker pool, so a
//! failing segment never blocks its siblings. Exit status and stderr are
//! captured per invocation and aggregated after the barrier.

mod report;

pub use report::{RunReport, TaskOutcome, TaskStatus};

use crate::domain::names;
use crate::domain::{SplitError, SplitResult};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::{env, fs};

/// Cooperative abort flag: tasks that have not started when the token is
/// cancelled are skipped; in-flight solver processes run to completion,
/// which leaves the completion barrier intact.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One solver invocation: deck in, captured stdout out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverTask {
    pub tag: String,
    pub deck_path: PathBuf,
    pub output_path: PathBuf,
}

impl SolverTask {
    pub fn for_deck(deck: impl Into<PathBuf>) -> Self {
        let deck_path = deck.into();
        let tag = names::segment_tag_of(&deck_path).unwrap_or_else(|| {
            deck_path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "?".to_string())
        });
        let output_path = names::solver_output_path(&deck_path);
        Self {
            tag,
            deck_path,
            output_path,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolverRunner {
    executable: PathBuf,
    jobs: Option<usize>,
}

impl SolverRunner {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            jobs: None,
        }
    }

    /// Caps the worker pool; defaults to host parallelism.
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Resolves the solver executable, consulting `PATH` for bare names.
    /// Fails with `SolverNotFound` before any invocation is dispatched.
    pub fn resolve_executable(&self) -> SplitResult<PathBuf> {
        if self.executable.is_file() {
            return Ok(self.executable.clone());
        }
        if self.executable.components().count() == 1 {
            if let Some(search_path) = env::var_os("PATH") {
                for dir in env::split_paths(&search_path) {
                    let candidate = dir.join(&self.executable);
                    if candidate.is_file() {
                        return Ok(candidate);
                    }
                }
            }
        }
        Err(SplitError::SolverNotFound(self.executable.clone()))
    }

    /// Runs every task on the worker pool and blocks until all have
    /// finished. `on_progress` is called once per task as completions
    /// arrive, in arbitrary completion order; the returned report lists
    /// outcomes in segment-tag order.
    pub fn run(
        &self,
        tasks: &[SolverTask],
        cancel: &CancelToken,
        mut on_progress: impl FnMut(&TaskOutcome, usize, usize),
    ) -> SplitResult<RunReport> {
        let executable = self.resolve_executable()?;
        let total = tasks.len();
        tracing::info!(
            solver = %executable.display(),
            tasks = total,
            "dispatching solver invocations"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs.unwrap_or(0))
            .build()
            .map_err(|error| {
                SplitError::Internal(format!("failed to build solver worker pool: {error}"))
            })?;

        let mut outcomes = Vec::with_capacity(total);
        let (tx, rx) = mpsc::channel();
        pool.in_place_scope(|scope| {
            for task in tasks {
                let tx = tx.clone();
                let cancel = cancel.clone();
                let executable = executable.as_path();
                scope.spawn(move |_| {
                    let outcome = if cancel.is_cancelled() {
                        TaskOutcome::skipped(task)
                    } else {
                        run_task(executable, task)
                    };
                    let _ = tx.send(outcome);
                });
            }
            drop(tx);

            for outcome in rx {
                match &outcome.status {
                    TaskStatus::Completed => {
                        tracing::info!(segment = %outcome.tag, "solver invocation completed");
                    }
                    TaskStatus::Failed { status, .. } => {
                        tracing::warn!(segment = %outcome.tag, %status, "solver invocation failed");
                    }
                    TaskStatus::Skipped => {
                        tracing::info!(segment = %outcome.tag, "solver invocation skipped");
                    }
                }
                on_progress(&outcome, outcomes.len() + 1, total);
                outcomes.push(outcome);
            }
        });

        outcomes.sort_by(|a, b| a.tag.cmp(&b.tag));
        Ok(RunReport::new(executable, outcomes))
    }
}

fn run_task(executable: &Path, task: &SolverTask) -> TaskOutcome {
    match invoke(executable, task) {
        Ok(output) if output.status.success() => TaskOutcome::completed(task),
        Ok(output) => TaskOutcome::failed(
            task,
            describe_exit(&output.status),
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ),
        Err(error) => TaskOutcome::failed(task, format!("i/o error: {error}"), String::new()),
    }
}

fn invoke(executable: &Path, task: &SolverTask) -> std::io::Result<Output> {
    let deck = File::open(&task.deck_path)?;
    let captured = File::create(&task.output_path)?;
    let child = Command::new(executable)
        .stdin(Stdio::from(deck))
        .stdout(Stdio::from(captured))
        .stderr(Stdio::piped())
        .spawn()?;
    child.wait_with_output()
}

fn describe_exit(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "termination by signal".to_string(),
    }
}

/// Builds the task list for previously emitted decks, skipping any whose
/// filename does not carry a segment tag.
pub fn tasks_for_decks(decks: &[PathBuf]) -> Vec<SolverTask> {
    decks
        .iter()
        .map(|deck| SolverTask::for_deck(deck.clone()))
        .collect()
}

/// Removes stale capture files so a failed invocation cannot be mistaken
/// for an old successful one.
pub fn clear_previous_outputs(tasks: &[SolverTask]) -> SplitResult<()> {
    for task in tasks {
        match fs::remove_file(&task.output_path) {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(SplitError::io(
                    "remove stale solver output",
                    &task.output_path,
                    source,
                ));
            }
        }
    }
    Ok(())
}
