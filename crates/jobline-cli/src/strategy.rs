//! Demo queue strategy: drives a single job until it settles.
//!
//! start -> run handler (progress streamed into the job) -> complete / fail
//! -> backoff -> start again while the job is Retrying.

use std::time::Duration;

use jobline_core::domain::{Backoff, JobState};
use jobline_core::ports::Clock;
use jobline_core::ObservedJob;
use tokio::select;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::handler::WorkHandler;

pub(crate) async fn drive<C: Clock>(
    job: &mut ObservedJob<serde_json::Value, C>,
    handler: &dyn WorkHandler,
    backoff: &Backoff,
    cancel: &CancellationToken,
) -> JobState {
    loop {
        if !job.start().applied {
            debug!(state = %job.state(), "job not startable");
            return job.state();
        }

        let data = job.data().clone();
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let mut attempt = handler.run(&data, progress_tx);

        let outcome = loop {
            select! {
                outcome = &mut attempt => break Some(outcome),
                Some(percent) = progress_rx.recv() => {
                    job.set_progress(percent);
                    debug!(progress = percent, "progress");
                }
                _ = cancel.cancelled() => break None,
            }
        };

        match outcome {
            None => {
                info!(attempts = job.attempts(), "shutdown requested, deferring job");
                job.defer();
                return job.state();
            }
            Some(Ok(result)) => {
                job.complete(Some(result));
            }
            Some(Err(error)) => {
                job.fail(Some(error));
            }
        }

        if job.state() != JobState::Retrying {
            return job.state();
        }

        let delay = backoff.next_delay(job.attempts());
        info!(delay_ms = delay.as_millis() as u64, "waiting before next attempt");
        select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => return job.state(),
        }
    }
}

pub(crate) fn default_backoff(base_ms: u64) -> Backoff {
    Backoff::new(Duration::from_millis(base_ms), 2.0).with_max_delay(Duration::from_secs(30))
}
