use async_trait::async_trait;

use crate::contract::model::{AnchorUpdate, Entitlements, MeterReceipt, SiteGuard, UserRef};

/// Public API trait for the billing module that other modules can use
#[async_trait]
pub trait BillingApi: Send + Sync {
    /// Side-effect-free entitlements view for the current cycle.
    async fn entitlements(&self, user: UserRef) -> anyhow::Result<Entitlements>;

    /// Consume one chat message, or fail with a limit-exceeded error.
    async fn consume_chat_message(&self, user: UserRef) -> anyhow::Result<MeterReceipt>;

    /// Consume `count` page-speed reports accumulated in one chat turn.
    async fn consume_page_speed_reports(
        &self,
        user: UserRef,
        count: u32,
    ) -> anyhow::Result<MeterReceipt>;

    /// Check whether the user may create another site. Mutates nothing.
    async fn check_site_creation(&self, user: UserRef) -> anyhow::Result<SiteGuard>;

    /// Persist a webhook-driven billing anchor update (idempotent upsert).
    async fn record_anchor_update(&self, update: AnchorUpdate) -> anyhow::Result<()>;
}
