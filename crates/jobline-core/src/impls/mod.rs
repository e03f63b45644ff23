//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **ChannelEventSink**: tokio mpsc へのイベント配送

pub mod channel_sink;

pub use self::channel_sink::ChannelEventSink;
