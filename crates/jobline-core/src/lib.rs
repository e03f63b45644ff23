//! jobline-core
//!
//! Background job lifecycle: a typed unit of deferred work with an explicit
//! state machine (pending -> running -> completed / failed / retrying),
//! progress reporting and lifecycle events.
//!
//! # モジュール構成
//! - **domain**: `Job` と状態遷移、設定、イベント、エラー（副作用なし）
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, EventSink）
//! - **impls**: ports の実装（ChannelEventSink）
//! - **app**: リスナー配送を含む `ObservedJob`
//!
//! Storage, dispatch and concurrency belong to the queue strategy that owns
//! the jobs; this crate only defines what a job is and how it may move.

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{ListenerRegistry, ObservedJob};
pub use domain::{
    Backoff, Job, JobConfig, JobError, JobEvent, JobEventKind, JobId, JobState, ListenerError,
    ListenerId, Operation, Transition,
};
