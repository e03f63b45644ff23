//! ObservedJob - ジョブ + リスナー + sink
//!
//! `Job` は遷移を計算するだけで、外部のコードを呼びません。
//! `ObservedJob` はその `Transition` を読み取り、同じ呼び出しの中で
//! （return する前に）リスナーと sink にイベントを配送します。
//!
//! # 配送順序
//! 1. 状態とフィールドを更新
//! 2. 同じ種類のリスナーを登録順に実行（失敗はログに残して続行）
//! 3. 登録された sink に `JobEvent` を渡す
//!
//! # 並行性
//! ロックは持ちません。すべての mutator は `&mut self` なので、
//! 同時に遷移を進められるのは所有者ひとりだけです。

use std::error::Error;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::listeners::ListenerRegistry;
use crate::domain::failure;
use crate::domain::{
    Job, JobConfig, JobError, JobEventKind, JobId, JobState, ListenerError, ListenerId,
    Operation, Transition,
};
use crate::ports::{Clock, EventSink, SystemClock, UlidGenerator};

pub struct ObservedJob<T, C = SystemClock> {
    job: Job<T>,
    listeners: ListenerRegistry<T>,
    sinks: Vec<Box<dyn EventSink>>,
    clock: C,
}

impl<T> ObservedJob<T, SystemClock> {
    pub fn new(job: Job<T>) -> Self {
        Self::with_clock(job, SystemClock)
    }

    pub fn from_config(config: JobConfig<T>) -> Result<Self, JobError> {
        Ok(Self::new(Job::new(config)?))
    }
}

impl<T, C: Clock + Clone + 'static> ObservedJob<T, C> {
    /// Transition timestamps and listener ids both come from `clock`.
    pub fn with_clock(job: Job<T>, clock: C) -> Self {
        let ids = UlidGenerator::new(clock.clone());
        Self {
            job,
            listeners: ListenerRegistry::with_id_generator(Box::new(ids)),
            sinks: Vec::new(),
            clock,
        }
    }
}

impl<T, C: Clock> ObservedJob<T, C> {
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn on<F>(&mut self, kind: JobEventKind, listener: F) -> ListenerId
    where
        F: FnMut(&Job<T>) -> Result<(), ListenerError> + Send + 'static,
    {
        self.listeners.on(kind, listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.off(id)
    }

    pub fn listener_count(&self, kind: JobEventKind) -> usize {
        self.listeners.len(kind)
    }

    /// Apply an operation at the clock's current time and deliver its event.
    pub fn apply(&mut self, op: Operation) -> Transition {
        let now = self.clock.now();
        let transition = self.job.apply(op, now);
        if let Some(kind) = transition.event {
            self.notify(kind, now);
        }
        transition
    }

    fn notify(&mut self, kind: JobEventKind, at: DateTime<Utc>) {
        self.listeners.dispatch(kind, &self.job);
        if self.sinks.is_empty() {
            return;
        }
        let event = self.job.event(kind, at);
        for sink in &self.sinks {
            sink.emit(&event);
        }
    }

    pub fn start(&mut self) -> Transition {
        self.apply(Operation::Start)
    }

    pub fn set_progress(&mut self, percent: f64) -> Transition {
        self.apply(Operation::SetProgress(percent))
    }

    pub fn complete(&mut self, result: Option<serde_json::Value>) -> Transition {
        self.apply(Operation::Complete(result))
    }

    pub fn fail(&mut self, error: Option<String>) -> Transition {
        self.apply(Operation::Fail(error))
    }

    pub fn fail_with_error(&mut self, err: &(dyn Error + '_)) -> Transition {
        self.fail(Some(failure::message_of_error(err)))
    }

    pub fn defer(&mut self) -> Transition {
        self.apply(Operation::Defer)
    }

    pub fn assign_id(&mut self, id: JobId) -> Result<(), JobError> {
        self.job.assign_id(id)
    }

    pub fn job(&self) -> &Job<T> {
        &self.job
    }

    pub fn into_job(self) -> Job<T> {
        self.job
    }

    pub fn id(&self) -> Option<JobId> {
        self.job.id()
    }

    pub fn name(&self) -> &str {
        self.job.name()
    }

    pub fn queue_name(&self) -> &str {
        self.job.queue_name()
    }

    pub fn data(&self) -> &T {
        self.job.data()
    }

    pub fn state(&self) -> JobState {
        self.job.state()
    }

    pub fn progress(&self) -> f64 {
        self.job.progress()
    }

    pub fn result(&self) -> Option<&serde_json::Value> {
        self.job.result()
    }

    pub fn error(&self) -> Option<&str> {
        self.job.error()
    }

    pub fn is_settled(&self) -> bool {
        self.job.is_settled()
    }

    pub fn attempts(&self) -> u32 {
        self.job.attempts()
    }

    pub fn retries(&self) -> u32 {
        self.job.retries()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.job.created_at()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.job.started_at()
    }

    pub fn settled_at(&self) -> Option<DateTime<Utc>> {
        self.job.settled_at()
    }

    /// Duration measured against this job's clock.
    pub fn duration(&self) -> Duration {
        self.job.duration_at(self.clock.now())
    }
}

impl<T: fmt::Debug, C> fmt::Debug for ObservedJob<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedJob")
            .field("job", &self.job)
            .field("listeners", &self.listeners)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
