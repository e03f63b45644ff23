//! Errors - エラー型
//!
//! 状態遷移そのものはエラーを返しません（無効な遷移は no-op）。
//! ここにあるのは構築・復元時のエラーと、リスナーが返すエラーだけです。

use thiserror::Error;

use super::ids::JobId;
use super::state::JobState;

/// Errors raised while building or rehydrating a job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("queue name must not be empty")]
    EmptyQueueName,

    #[error("settled_at given for non-terminal state {state}")]
    UnexpectedSettlement { state: JobState },

    #[error("terminal state {state} requires settled_at")]
    MissingSettlement { state: JobState },

    #[error("job already has id {existing}")]
    IdAlreadyAssigned { existing: JobId },

    #[error("job config decode: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Error returned by a lifecycle listener.
///
/// Listener failures are logged and isolated; they never undo a transition.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ListenerError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}
