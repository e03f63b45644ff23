//! Domain model: the job, its states, events and construction input.
//!
//! このレイヤーは副作用を持ちません（時刻は引数で受け取り、リスナーも呼びません）。

pub mod config;
pub mod errors;
pub mod events;
pub mod failure;
pub mod ids;
pub mod job;
pub mod retry;
pub mod state;

pub use config::JobConfig;
pub use errors::{JobError, ListenerError};
pub use events::{JobEvent, JobEventKind};
pub use ids::{JobId, ListenerId};
pub use job::{Job, Operation, Transition, MAX_PROGRESS};
pub use retry::{Backoff, RetryDecision};
pub use state::JobState;
