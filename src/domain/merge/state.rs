//! Run state module.
//!
//! This module contains the state machine guarding merge runs: one run
//! at a time per process, cooperative stop, and duplicate-job
//! detection.

use serde::Serialize;
use std::{
    result,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot start run: a run is already in progress")]
    AlreadyRunningError,
    #[error("cannot start run: job {0} has already completed")]
    AlreadyCompletedError(String),
}

pub type Result<T> = result::Result<T, Error>;

/// Represents the externally observable run status.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
}

/// Represents the way one finished run ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum RunOutcome {
    /// The loop exhausted all rows.
    Completed,
    /// A stop request was observed mid-loop; remaining rows were left
    /// untouched.
    Stopped,
    /// An error escaped the per-row scope and aborted the run.
    Failed,
}

/// Cloneable handle used to request a stop from outside the run loop.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Requests the current run to stop. The in-flight row finishes,
    /// remaining rows are left untouched.
    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Represents the process-wide merge run state. Owned by the hosting
/// process and lent to the runner, it guarantees a single run at a
/// time and remembers the fingerprint of the last completed job.
#[derive(Debug, Default)]
pub struct MergeState {
    status: RunStatus,
    stop: StopHandle,
    last_completed: Option<String>,
}

impl MergeState {
    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn last_completed(&self) -> Option<&str> {
        self.last_completed.as_deref()
    }

    /// Returns a handle able to stop the current run from another
    /// thread. The handle stays valid across runs.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.is_requested()
    }

    /// Moves the state to running for the given job fingerprint.
    /// Re-submission of the last completed job and concurrent runs are
    /// both rejected; callers surface those as informational, not as
    /// failures.
    pub fn begin(&mut self, fingerprint: &str) -> Result<()> {
        if self.status == RunStatus::Running {
            return Err(Error::AlreadyRunningError);
        }
        if self.last_completed.as_deref() == Some(fingerprint) {
            return Err(Error::AlreadyCompletedError(fingerprint.to_owned()));
        }

        self.status = RunStatus::Running;
        self.stop.reset();
        Ok(())
    }

    /// Records the end of the current run and returns the state to
    /// idle whatever the outcome. Only a completed run pins its
    /// fingerprint for duplicate detection: a stopped or failed run
    /// can be resubmitted as is.
    pub fn finish(&mut self, outcome: RunOutcome, fingerprint: &str) {
        if outcome == RunOutcome::Completed {
            self.last_completed = Some(fingerprint.to_owned());
        }
        self.status = RunStatus::Idle;
        self.stop.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_and_finish_cycle() {
        let mut state = MergeState::default();
        assert_eq!(RunStatus::Idle, state.status());

        state.begin("job1").unwrap();
        assert_eq!(RunStatus::Running, state.status());

        state.finish(RunOutcome::Completed, "job1");
        assert_eq!(RunStatus::Idle, state.status());
        assert_eq!(Some("job1"), state.last_completed());
    }

    #[test]
    fn test_rejects_concurrent_run() {
        let mut state = MergeState::default();
        state.begin("job1").unwrap();

        assert!(matches!(
            state.begin("job2"),
            Err(Error::AlreadyRunningError)
        ));
    }

    #[test]
    fn test_rejects_completed_job_resubmission() {
        let mut state = MergeState::default();
        state.begin("job1").unwrap();
        state.finish(RunOutcome::Completed, "job1");

        assert!(matches!(
            state.begin("job1"),
            Err(Error::AlreadyCompletedError(fingerprint)) if fingerprint == "job1"
        ));

        // another job can still start
        state.begin("job2").unwrap();
    }

    #[test]
    fn test_stopped_job_can_be_resubmitted() {
        let mut state = MergeState::default();
        state.begin("job1").unwrap();
        state.finish(RunOutcome::Stopped, "job1");

        assert_eq!(None, state.last_completed());
        state.begin("job1").unwrap();
    }

    #[test]
    fn test_failed_run_resets_to_idle() {
        let mut state = MergeState::default();
        state.begin("job1").unwrap();
        state.finish(RunOutcome::Failed, "job1");

        assert_eq!(RunStatus::Idle, state.status());
        assert_eq!(None, state.last_completed());
    }

    #[test]
    fn test_stop_flag_lifecycle() {
        let mut state = MergeState::default();
        let stop = state.stop_handle();

        state.begin("job1").unwrap();
        assert!(!state.stop_requested());

        stop.request();
        assert!(state.stop_requested());

        // the flag is cleared for the next run, the handle stays valid
        state.finish(RunOutcome::Stopped, "job1");
        state.begin("job1").unwrap();
        assert!(!state.stop_requested());

        stop.request();
        assert!(state.stop_requested());
    }
}
