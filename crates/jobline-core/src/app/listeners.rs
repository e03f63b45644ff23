//! Registry of lifecycle listeners (event kind -> ordered listeners).
//!
//! Design:
//! - One ordered list per `JobEventKind`; listeners of a kind run in
//!   registration order.
//! - A listener error is logged, and the remaining listeners still run.
//!   Panics are not caught.

use std::fmt;

use tracing::warn;

use crate::domain::{Job, JobEventKind, ListenerError, ListenerId};
use crate::ports::{IdGenerator, SystemClock, UlidGenerator};

/// A lifecycle callback. Receives the job after the transition was applied.
pub type Listener<T> = Box<dyn FnMut(&Job<T>) -> Result<(), ListenerError> + Send>;

pub struct ListenerRegistry<T> {
    start: Vec<(ListenerId, Listener<T>)>,
    complete: Vec<(ListenerId, Listener<T>)>,
    fail: Vec<(ListenerId, Listener<T>)>,
    ids: Box<dyn IdGenerator>,
}

impl<T> ListenerRegistry<T> {
    pub fn new() -> Self {
        Self::with_id_generator(Box::new(UlidGenerator::new(SystemClock)))
    }

    pub fn with_id_generator(ids: Box<dyn IdGenerator>) -> Self {
        Self {
            start: Vec::new(),
            complete: Vec::new(),
            fail: Vec::new(),
            ids,
        }
    }

    fn slot(&self, kind: JobEventKind) -> &Vec<(ListenerId, Listener<T>)> {
        match kind {
            JobEventKind::Start => &self.start,
            JobEventKind::Complete => &self.complete,
            JobEventKind::Fail => &self.fail,
        }
    }

    fn slot_mut(&mut self, kind: JobEventKind) -> &mut Vec<(ListenerId, Listener<T>)> {
        match kind {
            JobEventKind::Start => &mut self.start,
            JobEventKind::Complete => &mut self.complete,
            JobEventKind::Fail => &mut self.fail,
        }
    }

    /// Register a listener for `kind`. Returns a handle for `off`.
    pub fn on<F>(&mut self, kind: JobEventKind, listener: F) -> ListenerId
    where
        F: FnMut(&Job<T>) -> Result<(), ListenerError> + Send + 'static,
    {
        let id = self.ids.generate_listener_id();
        self.slot_mut(kind).push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if the handle is unknown.
    pub fn off(&mut self, id: ListenerId) -> bool {
        for kind in JobEventKind::ALL {
            let slot = self.slot_mut(kind);
            if let Some(pos) = slot.iter().position(|(lid, _)| *lid == id) {
                slot.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn len(&self, kind: JobEventKind) -> usize {
        self.slot(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        JobEventKind::ALL.iter().all(|&kind| self.slot(kind).is_empty())
    }

    /// Invoke every listener of `kind` in registration order.
    pub fn dispatch(&mut self, kind: JobEventKind, job: &Job<T>) {
        for (listener_id, listener) in self.slot_mut(kind).iter_mut() {
            if let Err(error) = listener(job) {
                warn!(
                    job_id = ?job.id(),
                    queue = %job.queue_name(),
                    kind = %kind,
                    listener_id = %listener_id,
                    error = %error,
                    "job listener failed"
                );
            }
        }
    }
}

impl<T> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("start", &self.start.len())
            .field("complete", &self.complete.len())
            .field("fail", &self.fail.len())
            .finish()
    }
}
