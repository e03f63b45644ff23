//! Lifecycle events emitted by job transitions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::JobId;
use super::state::JobState;

/// Which transition happened. Listeners are registered per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobEventKind {
    Start,
    Complete,
    Fail,
}

impl JobEventKind {
    pub const ALL: [JobEventKind; 3] = [
        JobEventKind::Start,
        JobEventKind::Complete,
        JobEventKind::Fail,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobEventKind::Start => "start",
            JobEventKind::Complete => "complete",
            JobEventKind::Fail => "fail",
        }
    }
}

impl fmt::Display for JobEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owned, payload-free record of an emitted event.
///
/// Listeners see the job itself; sinks get this instead so it can cross
/// threads and channels without cloning `T`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEvent {
    pub kind: JobEventKind,
    pub job_id: Option<JobId>,
    pub queue_name: String,

    /// State after the transition.
    pub state: JobState,
    pub attempts: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub at: DateTime<Utc>,
}
