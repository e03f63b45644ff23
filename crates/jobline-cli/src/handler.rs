use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;

/// The work a queue strategy runs for one attempt of a job.
///
/// Progress (0-100) is reported on `progress`; the channel closes when the
/// attempt ends.
#[async_trait]
pub(crate) trait WorkHandler: Send + Sync {
    async fn run(
        &self,
        data: &serde_json::Value,
        progress: mpsc::UnboundedSender<f64>,
    ) -> Result<serde_json::Value, String>;
}

#[derive(Debug, Deserialize)]
struct GreetPayload {
    #[serde(default)]
    name: Option<String>,
}

/// Greets `data.name`, failing on purpose for the first `failures` attempts.
pub(crate) struct GreetHandler {
    remaining_failures: AtomicU32,
    steps: u32,
    step: Duration,
}

impl GreetHandler {
    pub(crate) fn new(failures: u32, steps: u32, step: Duration) -> Self {
        Self {
            remaining_failures: AtomicU32::new(failures),
            steps: steps.max(1),
            step,
        }
    }
}

#[async_trait]
impl WorkHandler for GreetHandler {
    async fn run(
        &self,
        data: &serde_json::Value,
        progress: mpsc::UnboundedSender<f64>,
    ) -> Result<serde_json::Value, String> {
        let payload: GreetPayload =
            serde_json::from_value(data.clone()).map_err(|e| format!("json decode: {e}"))?;

        for step in 1..=self.steps {
            tokio::time::sleep(self.step).await;
            // receiver gone means the attempt was abandoned
            let _ = progress.send(f64::from(step) * 100.0 / f64::from(self.steps));
        }

        let left = self.remaining_failures.load(Ordering::Relaxed);
        if left > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
            return Err(format!("intentional failure (left={left})"));
        }

        let name = payload.name.as_deref().unwrap_or("world");
        Ok(serde_json::json!({ "greeting": format!("Hello, {name}!") }))
    }
}
