//! App - アプリケーション層
//!
//! domain の純粋な遷移と ports（Clock, EventSink）を組み合わせ、
//! queue strategy から使う `on()` 付きの API を提供します。
//!
//! # 主要コンポーネント
//! - **ListenerRegistry**: イベント種類ごとのリスナー一覧
//! - **ObservedJob**: ジョブ + リスナー + sink + clock

pub mod listeners;
pub mod observed;

pub use self::listeners::{Listener, ListenerRegistry};
pub use self::observed::ObservedJob;
