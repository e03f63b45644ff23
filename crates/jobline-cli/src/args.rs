use clap::Parser;

/// Runs one demo job through its lifecycle: start, progress, fail/retry,
/// complete. Ctrl-C during an attempt defers the job and exits.
#[derive(Parser, Debug)]
#[command(about, long_about = None, version)]
pub(crate) struct Args {
    /// Queue the job belongs to.
    #[arg(short, long, default_value = "default")]
    pub(crate) queue: String,
    /// Job payload as JSON, e.g. '{"name":"jobline"}'.
    #[arg(long, default_value = "{}")]
    pub(crate) data: String,
    /// Re-attempts allowed after the first failure.
    #[arg(short, long, default_value_t = 0)]
    pub(crate) retries: u32,
    /// Number of attempts the handler fails on purpose before succeeding.
    #[arg(short, long, default_value_t = 0)]
    pub(crate) failures: u32,
    /// Progress steps per attempt.
    #[arg(long, default_value_t = 4)]
    pub(crate) steps: u32,
    /// Milliseconds per progress step.
    #[arg(long, default_value_t = 50)]
    pub(crate) step_ms: u64,
    /// Base delay before a re-attempt, doubled each time.
    #[arg(long, default_value_t = 100)]
    pub(crate) backoff_ms: u64,
    /// Enables human-friendly logging.
    #[arg(short, long, default_value_t)]
    pub(crate) debug: bool,
}
