//! EventSink port - イベント配送の抽象化
//!
//! リスナーの後に、所有権付きの `JobEvent` を受け取ります。
//! 同期的に呼ばれるため、ブロックする実装は避けてください。
//!
//! - NoopEventSink: 何もしない
//! - ChannelEventSink (impls): tokio の mpsc に流す

use crate::domain::JobEvent;

pub trait EventSink: Send {
    fn emit(&self, event: &JobEvent);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: &JobEvent) {}
}
