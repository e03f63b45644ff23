//! Job record and its lifecycle state machine.
//!
//! Design:
//! - `Job` is plain data plus a transition function (`apply`).
//! - Every mutation goes through an `Operation`; the returned `Transition`
//!   says what changed and which event (if any) the caller should deliver.
//! - Out-of-order calls are absorbed: the transition reports `applied == false`
//!   and the job is left untouched. Nothing here returns an error.
//! - The job never calls external code. Listener dispatch lives in
//!   `app::observed`.

use std::error::Error;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use super::config::JobConfig;
use super::errors::JobError;
use super::events::{JobEvent, JobEventKind};
use super::failure;
use super::ids::JobId;
use super::retry::{self, RetryDecision};
use super::state::JobState;

pub const MAX_PROGRESS: f64 = 100.0;

/// An input to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Start,
    SetProgress(f64),
    Complete(Option<serde_json::Value>),
    Fail(Option<String>),
    Defer,
}

/// Outcome of applying an `Operation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: JobState,
    pub to: JobState,

    /// Event to deliver to listeners, if any.
    pub event: Option<JobEventKind>,

    /// False when the operation was not valid from `from` and was ignored.
    pub applied: bool,
}

impl Transition {
    fn ignored(state: JobState) -> Self {
        Self {
            from: state,
            to: state,
            event: None,
            applied: false,
        }
    }

    fn quiet(from: JobState, to: JobState) -> Self {
        Self {
            from,
            to,
            event: None,
            applied: true,
        }
    }

    fn emitting(from: JobState, to: JobState, event: JobEventKind) -> Self {
        Self {
            from,
            to,
            event: Some(event),
            applied: true,
        }
    }

    pub fn changed_state(&self) -> bool {
        self.from != self.to
    }
}

/// One unit of deferred work.
#[derive(Debug, Clone, PartialEq)]
pub struct Job<T> {
    id: Option<JobId>,
    queue_name: String,
    data: T,
    state: JobState,
    progress: f64,
    result: Option<serde_json::Value>,
    error: Option<String>,
    retries: u32,
    attempts: u32,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    settled_at: Option<DateTime<Utc>>,
}

impl<T> Job<T> {
    /// Build a job, stamping `created_at` with the wall clock if absent.
    pub fn new(config: JobConfig<T>) -> Result<Self, JobError> {
        Self::new_at(config, Utc::now())
    }

    /// `settled_at` must be present exactly when `state` is terminal.
    pub fn new_at(config: JobConfig<T>, now: DateTime<Utc>) -> Result<Self, JobError> {
        if config.queue_name.trim().is_empty() {
            return Err(JobError::EmptyQueueName);
        }
        match (config.state.is_terminal(), config.settled_at.is_some()) {
            (false, true) => {
                return Err(JobError::UnexpectedSettlement {
                    state: config.state,
                });
            }
            (true, false) => {
                return Err(JobError::MissingSettlement {
                    state: config.state,
                });
            }
            _ => {}
        }

        Ok(Self {
            id: config.id,
            queue_name: config.queue_name,
            data: config.data,
            state: config.state,
            progress: clamp_progress(config.progress),
            result: config.result,
            error: config.error,
            retries: config.retries,
            attempts: config.attempts,
            created_at: config.created_at.unwrap_or(now),
            started_at: config.started_at,
            settled_at: config.settled_at,
        })
    }

    /// Apply one operation at time `now`.
    pub fn apply(&mut self, op: Operation, now: DateTime<Utc>) -> Transition {
        let from = self.state;
        let transition = match op {
            Operation::Start => {
                if !from.is_startable() {
                    debug!(
                        job_id = ?self.id,
                        queue = %self.queue_name,
                        state = %from,
                        "start ignored"
                    );
                    return Transition::ignored(from);
                }
                self.state = JobState::Running;
                self.started_at = Some(now);
                self.attempts = self.attempts.saturating_add(1);
                Transition::emitting(from, JobState::Running, JobEventKind::Start)
            }
            Operation::SetProgress(percent) => {
                self.progress = clamp_progress(percent);
                Transition::quiet(from, from)
            }
            Operation::Complete(result) => {
                self.result = result;
                self.progress = MAX_PROGRESS;
                self.settled_at = Some(now);
                self.state = JobState::Completed;
                Transition::emitting(from, JobState::Completed, JobEventKind::Complete)
            }
            Operation::Fail(error) => {
                self.error = error;
                self.progress = 0.0;
                match retry::decide(self.retries, self.attempts) {
                    RetryDecision::Retry => {
                        self.state = JobState::Retrying;
                        self.settled_at = None;
                    }
                    RetryDecision::GiveUp => {
                        self.state = JobState::Failed;
                        self.settled_at = Some(now);
                    }
                }
                Transition::emitting(from, self.state, JobEventKind::Fail)
            }
            Operation::Defer => {
                if from != JobState::Running {
                    debug!(
                        job_id = ?self.id,
                        queue = %self.queue_name,
                        state = %from,
                        "defer ignored"
                    );
                    return Transition::ignored(from);
                }
                self.state = JobState::Pending;
                self.attempts = 0;
                Transition::quiet(from, JobState::Pending)
            }
        };

        if transition.changed_state() {
            trace!(
                job_id = ?self.id,
                queue = %self.queue_name,
                from = %transition.from,
                to = %transition.to,
                attempts = self.attempts,
                "job transition"
            );
        }
        transition
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Transition {
        self.apply(Operation::Start, now)
    }

    /// Values above 100 are clamped; negative values are kept as-is.
    pub fn set_progress(&mut self, percent: f64) -> Transition {
        self.apply(Operation::SetProgress(percent), self.untimed())
    }

    pub fn complete(
        &mut self,
        result: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Transition {
        self.apply(Operation::Complete(result), now)
    }

    /// `error` replaces any previous message; `None` clears it.
    pub fn fail(&mut self, error: Option<String>, now: DateTime<Utc>) -> Transition {
        self.apply(Operation::Fail(error), now)
    }

    pub fn fail_with_error(&mut self, err: &(dyn Error + '_), now: DateTime<Utc>) -> Transition {
        self.fail(Some(failure::message_of_error(err)), now)
    }

    pub fn fail_with_value(&mut self, value: &serde_json::Value, now: DateTime<Utc>) -> Transition {
        self.fail(Some(failure::message_of_value(value)), now)
    }

    pub fn defer(&mut self) -> Transition {
        self.apply(Operation::Defer, self.untimed())
    }

    // SetProgress and Defer record no timestamp.
    fn untimed(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Set the id once a queue strategy has persisted the job.
    ///
    /// Re-assigning the same id is accepted.
    pub fn assign_id(&mut self, id: JobId) -> Result<(), JobError> {
        match self.id {
            Some(existing) if existing != id => Err(JobError::IdAlreadyAssigned { existing }),
            _ => {
                self.id = Some(id);
                Ok(())
            }
        }
    }

    /// Owned event record for sinks.
    pub fn event(&self, kind: JobEventKind, at: DateTime<Utc>) -> JobEvent {
        JobEvent {
            kind,
            job_id: self.id,
            queue_name: self.queue_name.clone(),
            state: self.state,
            attempts: self.attempts,
            error: self.error.clone(),
            at,
        }
    }

    pub fn id(&self) -> Option<JobId> {
        self.id
    }

    /// Alias of `queue_name`.
    pub fn name(&self) -> &str {
        &self.queue_name
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn result(&self) -> Option<&serde_json::Value> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Further `start()` calls the retry budget still allows.
    pub fn retries_remaining(&self) -> u32 {
        self.retries.saturating_add(1).saturating_sub(self.attempts)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn settled_at(&self) -> Option<DateTime<Utc>> {
        self.settled_at
    }

    pub fn is_settled(&self) -> bool {
        self.settled_at.is_some()
    }

    /// Time from the latest start to settlement, or to `now` while unsettled.
    /// Zero if never started.
    pub fn duration_at(&self, now: DateTime<Utc>) -> Duration {
        let until = self.settled_at.unwrap_or(now);
        let since = self.started_at.unwrap_or(until);
        (until - since).to_std().unwrap_or_default()
    }

    pub fn duration(&self) -> Duration {
        self.duration_at(Utc::now())
    }

    pub fn into_config(self) -> JobConfig<T> {
        JobConfig {
            queue_name: self.queue_name,
            data: self.data,
            id: self.id,
            state: self.state,
            retries: self.retries,
            attempts: self.attempts,
            progress: self.progress,
            created_at: Some(self.created_at),
            result: self.result,
            error: self.error,
            started_at: self.started_at,
            settled_at: self.settled_at,
        }
    }
}

impl<T: Clone> Job<T> {
    /// Persistence shape of this job.
    pub fn to_config(&self) -> JobConfig<T> {
        self.clone().into_config()
    }
}

fn clamp_progress(percent: f64) -> f64 {
    percent.min(MAX_PROGRESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn job(retries: u32) -> Job<serde_json::Value> {
        let config = JobConfig::new("mail", json!({ "to": "a@b.c" })).with_retries(retries);
        Job::new_at(config, at(0)).unwrap()
    }

    fn job_in(state: JobState) -> Job<serde_json::Value> {
        let mut config = JobConfig::new("mail", json!({})).with_state(state);
        if state.is_terminal() {
            config = config.with_settled_at(at(1));
        }
        Job::new_at(config, at(0)).unwrap()
    }

    #[test]
    fn new_job_has_defaults() {
        let job = job(0);

        assert_eq!(job.state(), JobState::Pending);
        assert_eq!(job.attempts(), 0);
        assert_eq!(job.retries(), 0);
        assert_eq!(job.progress(), 0.0);
        assert_eq!(job.created_at(), at(0));
        assert_eq!(job.name(), "mail");
        assert_eq!(job.queue_name(), "mail");
        assert!(job.id().is_none());
        assert!(job.result().is_none());
        assert!(job.error().is_none());
        assert!(job.started_at().is_none());
        assert!(!job.is_settled());
    }

    #[test]
    fn new_keeps_supplied_created_at() {
        let config = JobConfig::new("mail", ()).with_created_at(at(-60));
        let job = Job::new_at(config, at(0)).unwrap();
        assert_eq!(job.created_at(), at(-60));
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("   ")]
    fn new_rejects_blank_queue_name(#[case] queue_name: &str) {
        let err = Job::new(JobConfig::new(queue_name, ())).unwrap_err();
        assert!(matches!(err, JobError::EmptyQueueName));
    }

    #[rstest]
    #[case::pending(JobState::Pending)]
    #[case::running(JobState::Running)]
    #[case::retrying(JobState::Retrying)]
    fn new_rejects_settlement_for_unsettled_states(#[case] state: JobState) {
        let config = JobConfig::new("mail", ())
            .with_state(state)
            .with_settled_at(at(0));
        let err = Job::new(config).unwrap_err();
        assert!(matches!(err, JobError::UnexpectedSettlement { state: s } if s == state));
    }

    #[rstest]
    #[case::completed(JobState::Completed)]
    #[case::failed(JobState::Failed)]
    fn new_rejects_terminal_state_without_settlement(#[case] state: JobState) {
        let err = Job::new(JobConfig::new("mail", ()).with_state(state)).unwrap_err();
        assert!(matches!(err, JobError::MissingSettlement { state: s } if s == state));
    }

    #[test]
    fn new_clamps_restored_progress() {
        let config = JobConfig::new("mail", ()).with_progress(250.0);
        assert_eq!(Job::new(config).unwrap().progress(), 100.0);
    }

    #[rstest]
    #[case::pending(JobState::Pending)]
    #[case::retrying(JobState::Retrying)]
    fn start_runs_from_startable_states(#[case] state: JobState) {
        let mut job = job_in(state);

        let t = job.start(at(5));

        assert!(t.applied);
        assert_eq!(t.event, Some(JobEventKind::Start));
        assert_eq!(t.from, state);
        assert_eq!(job.state(), JobState::Running);
        assert_eq!(job.attempts(), 1);
        assert_eq!(job.started_at(), Some(at(5)));
    }

    #[rstest]
    #[case::running(JobState::Running)]
    #[case::completed(JobState::Completed)]
    #[case::failed(JobState::Failed)]
    fn start_is_ignored_elsewhere(#[case] state: JobState) {
        let mut job = job_in(state);
        let before = job.clone();

        let t = job.start(at(5));

        assert!(!t.applied);
        assert_eq!(t.event, None);
        assert_eq!(job, before);
    }

    #[rstest]
    #[case::pending(JobState::Pending)]
    #[case::running(JobState::Running)]
    #[case::completed(JobState::Completed)]
    #[case::failed(JobState::Failed)]
    #[case::retrying(JobState::Retrying)]
    fn set_progress_clamps_in_any_state(#[case] state: JobState) {
        let mut job = job_in(state);

        job.set_progress(42.0);
        assert_eq!(job.progress(), 42.0);

        let t = job.set_progress(150.0);
        assert_eq!(job.progress(), 100.0);
        assert_eq!(job.state(), state);
        assert_eq!(t.event, None);
    }

    #[test]
    fn set_progress_does_not_clamp_below_zero() {
        let mut job = job(0);
        job.set_progress(-5.0);
        assert_eq!(job.progress(), -5.0);
    }

    #[rstest]
    #[case::pending(JobState::Pending)]
    #[case::running(JobState::Running)]
    #[case::completed(JobState::Completed)]
    #[case::failed(JobState::Failed)]
    #[case::retrying(JobState::Retrying)]
    fn complete_succeeds_from_any_state(#[case] state: JobState) {
        let mut job = job_in(state);

        let t = job.complete(Some(json!({ "sent": true })), at(9));

        assert!(t.applied);
        assert_eq!(t.event, Some(JobEventKind::Complete));
        assert_eq!(job.state(), JobState::Completed);
        assert_eq!(job.result(), Some(&json!({ "sent": true })));
        assert_eq!(job.progress(), 100.0);
        assert_eq!(job.settled_at(), Some(at(9)));
        assert!(job.is_settled());
    }

    #[test]
    fn two_retries_allow_three_attempts() {
        let mut job = job(2);

        job.start(at(1));
        let t = job.fail(Some("first".to_string()), at(2));
        assert_eq!(t.to, JobState::Retrying);
        assert_eq!(t.event, Some(JobEventKind::Fail));
        assert!(job.settled_at().is_none());
        assert_eq!(job.retries_remaining(), 2);

        job.start(at(3));
        assert_eq!(job.attempts(), 2);
        assert_eq!(job.started_at(), Some(at(3)));
        job.fail(Some("second".to_string()), at(4));
        assert_eq!(job.state(), JobState::Retrying);
        assert!(!job.is_settled());

        job.start(at(5));
        assert_eq!(job.attempts(), 3);
        assert_eq!(job.started_at(), Some(at(5)));
        let t = job.fail(Some("third".to_string()), at(6));
        assert_eq!(t.to, JobState::Failed);
        assert_eq!(job.settled_at(), Some(at(6)));
        assert_eq!(job.error(), Some("third"));
        assert_eq!(job.retries_remaining(), 0);
    }

    #[test]
    fn zero_retries_fail_immediately() {
        let mut job = job(0);

        job.start(at(1));
        job.set_progress(60.0);
        job.fail(None, at(2));

        assert_eq!(job.state(), JobState::Failed);
        assert_eq!(job.progress(), 0.0);
        assert!(job.error().is_none());
        assert_eq!(job.settled_at(), Some(at(2)));
    }

    #[test]
    fn fail_into_retrying_clears_previous_settlement() {
        let config = JobConfig::new("mail", json!({}))
            .with_state(JobState::Completed)
            .with_settled_at(at(1))
            .with_retries(1);
        let mut job = Job::new_at(config, at(0)).unwrap();

        job.fail(Some("late".to_string()), at(3));

        assert_eq!(job.state(), JobState::Retrying);
        assert!(!job.is_settled());
    }

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn fail_normalizes_error_inputs() {
        let mut job = job(5);

        job.fail_with_error(&Boom, at(1));
        assert_eq!(job.error(), Some("boom"));

        job.fail_with_value(&json!("boom"), at(2));
        assert_eq!(job.error(), Some("boom"));

        job.fail_with_value(&json!({ "message": "boom" }), at(3));
        assert_eq!(job.error(), Some("boom"));

        job.fail(None, at(4));
        assert!(job.error().is_none());
    }

    #[test]
    fn defer_returns_running_job_to_pending() {
        let mut job = job(3);
        job.start(at(1));
        job.fail(None, at(2));
        job.start(at(3));
        assert_eq!(job.attempts(), 2);

        let t = job.defer();

        assert!(t.applied);
        assert_eq!(t.event, None);
        assert_eq!(job.state(), JobState::Pending);
        assert_eq!(job.attempts(), 0);
    }

    #[rstest]
    #[case::pending(JobState::Pending)]
    #[case::completed(JobState::Completed)]
    #[case::failed(JobState::Failed)]
    #[case::retrying(JobState::Retrying)]
    fn defer_is_ignored_unless_running(#[case] state: JobState) {
        let mut job = job_in(state);
        let before = job.clone();

        let t = job.defer();

        assert!(!t.applied);
        assert_eq!(job, before);
    }

    #[test]
    fn duration_tracks_latest_attempt() {
        let mut job = job(1);
        assert_eq!(job.duration_at(at(100)), Duration::ZERO);

        job.start(at(10));
        assert_eq!(job.duration_at(at(12)), Duration::from_secs(2));
        assert_eq!(job.duration_at(at(15)), Duration::from_secs(5));

        job.complete(None, at(20));
        assert_eq!(job.duration_at(at(500)), Duration::from_secs(10));
    }

    #[test]
    fn restart_measures_from_latest_start() {
        let mut job = job(1);

        job.start(at(1));
        job.fail(Some("timeout".to_string()), at(4));
        job.start(at(7));

        assert_eq!(job.started_at(), Some(at(7)));
        assert_eq!(job.duration_at(at(9)), Duration::from_secs(2));

        job.complete(None, at(10));
        assert_eq!(job.duration_at(at(60)), Duration::from_secs(3));
    }

    #[test]
    fn duration_saturates_on_clock_skew() {
        let mut job = job(0);
        job.start(at(10));
        assert_eq!(job.duration_at(at(5)), Duration::ZERO);
    }

    #[test]
    fn assign_id_only_once() {
        let mut job = job(0);
        let id = JobId::generate();
        let other = JobId::generate();

        job.assign_id(id).unwrap();
        job.assign_id(id).unwrap();
        let err = job.assign_id(other).unwrap_err();

        assert!(matches!(err, JobError::IdAlreadyAssigned { existing } if existing == id));
        assert_eq!(job.id(), Some(id));
    }

    #[test]
    fn config_roundtrip_restores_equal_job() {
        let mut job = job(2);
        job.assign_id(JobId::generate()).unwrap();
        job.start(at(1));
        job.set_progress(30.0);
        job.fail(Some("timeout".to_string()), at(2));

        let json = job.to_config().to_json().unwrap();
        let restored: Job<serde_json::Value> =
            Job::new(JobConfig::from_json(&json).unwrap()).unwrap();

        assert_eq!(restored, job);
    }

    #[test]
    fn event_reflects_current_fields() {
        let mut job = job(0);
        job.start(at(1));
        job.fail(Some("boom".to_string()), at(2));

        let event = job.event(JobEventKind::Fail, at(2));

        assert_eq!(event.kind, JobEventKind::Fail);
        assert_eq!(event.state, JobState::Failed);
        assert_eq!(event.attempts, 1);
        assert_eq!(event.error.as_deref(), Some("boom"));
        assert_eq!(event.queue_name, "mail");
    }
}
