//! Job construction / rehydration input.
//!
//! `JobConfig` doubles as the persistence shape: a queue strategy stores
//! `job.to_config()` and rebuilds the job later with `Job::new(config)`.
//! Everything except `queue_name` and `data` is optional so a fresh submission
//! and a restored record go through the same path.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::errors::JobError;
use super::ids::JobId;
use super::state::JobState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig<T> {
    pub queue_name: String,
    pub data: T,

    /// Present when restoring a previously persisted job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<JobId>,

    #[serde(default)]
    pub state: JobState,

    #[serde(default)]
    pub retries: u32,

    #[serde(default)]
    pub attempts: u32,

    #[serde(default)]
    pub progress: f64,

    /// Defaults to construction time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settled_at: Option<DateTime<Utc>>,
}

impl<T> JobConfig<T> {
    /// Minimal config for a new submission.
    pub fn new(queue_name: impl Into<String>, data: T) -> Self {
        Self {
            queue_name: queue_name.into(),
            data,
            id: None,
            state: JobState::Pending,
            retries: 0,
            attempts: 0,
            progress: 0.0,
            created_at: None,
            result: None,
            error: None,
            started_at: None,
            settled_at: None,
        }
    }

    pub fn with_id(mut self, id: JobId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_state(mut self, state: JobState) -> Self {
        self.state = state;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_result(mut self, result: serde_json::Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }

    pub fn with_settled_at(mut self, settled_at: DateTime<Utc>) -> Self {
        self.settled_at = Some(settled_at);
        self
    }
}

impl<T: DeserializeOwned> JobConfig<T> {
    pub fn from_json(s: &str) -> Result<Self, JobError> {
        Ok(serde_json::from_str(s)?)
    }
}

impl<T: Serialize> JobConfig<T> {
    pub fn to_json(&self) -> Result<String, JobError> {
        Ok(serde_json::to_string(self)?)
    }
}
