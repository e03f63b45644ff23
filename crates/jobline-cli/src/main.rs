mod args;
mod handler;
mod strategy;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use jobline_core::domain::{JobEventKind, JobState};
use jobline_core::impls::ChannelEventSink;
use jobline_core::ports::{IdGenerator, SystemClock, UlidGenerator};
use jobline_core::{Job, JobConfig, ObservedJob};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::Args;
use crate::handler::GreetHandler;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logging goes to stderr; stdout carries the final job record.
    let default_level = if args.debug { "trace" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if args.debug {
        subscriber.init();
    } else {
        subscriber.json().init();
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(error) = signal::ctrl_c().await {
                warn!(%error, "something strange with ctrl-c handling!");
            };
            cancel.cancel();
        });
    }

    match run(args, cancel).await {
        Ok(JobState::Completed) => ExitCode::SUCCESS,
        Ok(state) => {
            warn!(%state, "job did not complete");
            ExitCode::FAILURE
        }
        Err(error) => {
            error!(error = ?error, "encountered runtime error");
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args, cancel: CancellationToken) -> Result<JobState> {
    let data: serde_json::Value =
        serde_json::from_str(&args.data).context("--data must be valid JSON")?;

    let mut job = Job::new(JobConfig::new(args.queue, data).with_retries(args.retries))
        .context("building job")?;
    // Stand-in for persisting the job and receiving its id.
    let ids = UlidGenerator::new(SystemClock);
    job.assign_id(ids.generate_job_id())?;

    let (sink, mut events) = ChannelEventSink::channel();
    let mut job = ObservedJob::new(job).with_sink(sink);

    job.on(JobEventKind::Start, |job: &Job<serde_json::Value>| {
        info!(attempt = job.attempts(), retries = job.retries(), "attempt started");
        Ok(())
    });
    job.on(JobEventKind::Fail, |job: &Job<serde_json::Value>| {
        warn!(
            state = %job.state(),
            error = job.error().unwrap_or("<none>"),
            retries_remaining = job.retries_remaining(),
            "attempt failed"
        );
        Ok(())
    });
    job.on(JobEventKind::Complete, |job: &Job<serde_json::Value>| {
        info!(
            result = %job.result().cloned().unwrap_or_default(),
            duration_ms = job.duration().as_millis() as u64,
            "job completed"
        );
        Ok(())
    });

    let drain = tokio::spawn(async move {
        let mut delivered = 0u64;
        while let Some(event) = events.recv().await {
            debug!(
                kind = %event.kind,
                state = %event.state,
                attempts = event.attempts,
                at = %event.at,
                "event delivered"
            );
            delivered += 1;
        }
        delivered
    });

    let handler = GreetHandler::new(
        args.failures,
        args.steps,
        Duration::from_millis(args.step_ms),
    );
    let backoff = strategy::default_backoff(args.backoff_ms);
    let state = strategy::drive(&mut job, &handler, &backoff, &cancel).await;

    // Dropping the observed job closes the sink and ends the drain task.
    let job = job.into_job();
    let delivered = drain.await.context("event drain task")?;
    info!(job_id = ?job.id(), %state, attempts = job.attempts(), delivered, "finished");

    println!(
        "{}",
        serde_json::to_string_pretty(&job.to_config()).context("serializing job")?
    );
    Ok(state)
}
