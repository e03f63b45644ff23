//! IdGenerator port - ID 生成の抽象化
//!
//! Queue strategy は永続化のタイミングで `generate_job_id()` を呼び、
//! `Job::assign_id` で割り当てます。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::ids::{JobId, ListenerId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は分散システムで使える ID を生成
///
/// `Send + Sync` を要求（複数スレッドから使える）
pub trait IdGenerator: Send + Sync {
    fn generate_job_id(&self) -> JobId;

    fn generate_listener_id(&self) -> ListenerId;
}

/// ULID generator: timestamp from the clock, random tail from `rand`.
///
/// A `FixedClock` gives deterministic timestamps in tests.
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_job_id(&self) -> JobId {
        JobId::from(self.next_ulid())
    }

    fn generate_listener_id(&self) -> ListenerId {
        ListenerId::from(self.next_ulid())
    }
}
