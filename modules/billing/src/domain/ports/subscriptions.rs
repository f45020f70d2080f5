use async_trait::async_trait;
use uuid::Uuid;

/// Raw subscription record as the external provider reports it. Dates stay
/// strings here; the resolver parses them leniently with fallbacks so a
/// provider data glitch can never block metering.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubscriptionRecord {
    pub product_id: String,
    pub status: String,
    pub current_period_start: Option<String>,
    pub current_period_end: Option<String>,
    pub cancel_at_period_end: bool,
    pub product_name: Option<String>,
}

/// Port to the external subscription provider. The provider owns the whole
/// subscription lifecycle; this module only reads the current state.
#[async_trait]
pub trait SubscriptionProvider: Send + Sync {
    async fn current_subscription(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Option<SubscriptionRecord>>;
}
