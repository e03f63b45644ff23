//! Job lifecycle state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Job state.
///
/// State transitions:
/// - Pending -> Running -> Completed
/// - Pending -> Running -> Retrying -> Running (while the retry budget lasts)
/// - Pending -> Running -> Failed (retry budget exhausted)
/// - Running -> Pending (deferred, attempt not counted)
///
/// `complete()` and `fail()` are accepted from any state, so Completed/Failed
/// are terminal only in the sense that nothing moves a job out of them on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Waiting to be dispatched.
    #[default]
    Pending,

    /// Currently being executed by a worker.
    Running,

    /// Successfully completed.
    Completed,

    /// Failed permanently (retry budget exhausted).
    Failed,

    /// Failed, but another attempt is permitted.
    Retrying,
}

impl JobState {
    /// Completed or Failed.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Is `start()` accepted from this state?
    pub fn is_startable(self) -> bool {
        matches!(self, JobState::Pending | JobState::Retrying)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Pending => "PENDING",
            JobState::Running => "RUNNING",
            JobState::Completed => "COMPLETED",
            JobState::Failed => "FAILED",
            JobState::Retrying => "RETRYING",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
