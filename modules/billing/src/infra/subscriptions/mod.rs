pub mod http_provider;

pub use http_provider::HttpSubscriptionProvider;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ports::{SubscriptionProvider, SubscriptionRecord};

/// Provider used when no subscription backend is configured: every user
/// resolves as never-subscribed and falls back to the starter plan.
pub struct NoSubscriptions;

#[async_trait]
impl SubscriptionProvider for NoSubscriptions {
    async fn current_subscription(
        &self,
        _user_id: Uuid,
    ) -> anyhow::Result<Option<SubscriptionRecord>> {
        Ok(None)
    }
}
