//! ChannelEventSink - イベントを tokio の mpsc に流す sink
//!
//! リスナーを同期で呼ぶ代わりに、別タスクでイベントを消費したい場合に使います。
//! `emit` はブロックしません（unbounded）。

use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::JobEvent;
use crate::ports::EventSink;

/// Sends every event on an unbounded channel.
///
/// # 使用例
/// ```ignore
/// let (sink, mut rx) = ChannelEventSink::channel();
/// let mut job = ObservedJob::new(job).with_sink(sink);
/// tokio::spawn(async move {
///     while let Some(event) = rx.recv().await { /* ... */ }
/// });
/// ```
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<JobEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::UnboundedSender<JobEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<JobEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: &JobEvent) {
        // receiver が drop 済みでもジョブの遷移には影響させない
        if self.tx.send(event.clone()).is_err() {
            debug!(kind = %event.kind, queue = %event.queue_name, "event receiver closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobEventKind, JobState};
    use chrono::Utc;

    fn event(kind: JobEventKind) -> JobEvent {
        JobEvent {
            kind,
            job_id: None,
            queue_name: "mail".to_string(),
            state: JobState::Running,
            attempts: 1,
            error: None,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn events_arrive_in_emit_order() {
        let (sink, mut rx) = ChannelEventSink::channel();

        sink.emit(&event(JobEventKind::Start));
        sink.emit(&event(JobEventKind::Complete));

        assert_eq!(rx.recv().await.unwrap().kind, JobEventKind::Start);
        assert_eq!(rx.recv().await.unwrap().kind, JobEventKind::Complete);
    }

    #[tokio::test]
    async fn closed_receiver_is_ignored() {
        let (sink, rx) = ChannelEventSink::channel();
        drop(rx);

        sink.emit(&event(JobEventKind::Fail));
    }
}
