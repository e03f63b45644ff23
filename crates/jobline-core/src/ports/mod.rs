//! Ports - 抽象化レイヤー
//!
//! Job のコアが外部に依存する部分（時刻、ID 生成、イベント配送）を
//! trait として切り出しています。永続化や配送キューは queue strategy 側の責務で、
//! ここには含めません。

pub mod clock;
pub mod event_sink;
pub mod id_generator;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::{EventSink, NoopEventSink};
pub use self::id_generator::{IdGenerator, UlidGenerator};
