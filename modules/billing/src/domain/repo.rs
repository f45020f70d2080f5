use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contract::model::{CycleWindow, Limit};

/// Counters read from one usage bucket. Zeros when no bucket exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UsageCounters {
    pub messages: u64,
    pub page_speed_reports: u64,
}

/// The two counters a bucket carries. Site usage is a row count, not a
/// counter, so it is not metered through buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeteredCounter {
    Messages,
    PageSpeedReports,
}

/// Result of a guarded increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementOutcome {
    /// The counter advanced; `used` is the post-increment value.
    Updated { used: u64 },
    /// The cap was already reached; the counter is unchanged at `used`.
    CapReached { used: u64 },
}

/// Storage port for billing anchors, usage buckets and site counts.
#[async_trait]
pub trait BillingRepository: Send + Sync {
    /// Stored billing anchor for the user, if one exists.
    async fn find_anchor(&self, user_id: Uuid) -> anyhow::Result<Option<DateTime<Utc>>>;

    /// Upsert the anchor, writing only when the value actually changes.
    /// Returns whether a write happened (idempotence: second identical call
    /// is a no-op comparison).
    async fn upsert_anchor(&self, user_id: Uuid, anchor: DateTime<Utc>) -> anyhow::Result<bool>;

    /// Counters for the bucket at `cycle_start`. Never creates a bucket.
    async fn usage_for_cycle(
        &self,
        user_id: Uuid,
        cycle_start: DateTime<Utc>,
    ) -> anyhow::Result<UsageCounters>;

    /// Get-or-create the bucket for the cycle with zero counters. Invoked
    /// from mutation paths only.
    async fn ensure_bucket(&self, user_id: Uuid, cycle: CycleWindow) -> anyhow::Result<()>;

    /// Atomically add `delta` to a counter if it is below `cap`, refreshing
    /// the bucket's denormalized cycle end. The check and the write execute
    /// as one statement so concurrent consumers cannot interleave.
    async fn try_increment(
        &self,
        user_id: Uuid,
        cycle: CycleWindow,
        counter: MeteredCounter,
        delta: u64,
        cap: Limit,
    ) -> anyhow::Result<IncrementOutcome>;

    /// Number of sites the user currently owns.
    async fn count_sites(&self, user_id: Uuid) -> anyhow::Result<u64>;
}
