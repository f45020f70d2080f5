use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::BillingApi,
    error::BillingError,
    model::{AnchorUpdate, Entitlements, MeterReceipt, SiteGuard, UserRef},
};
use crate::domain::{error::DomainError, service::BillingService};

/// Local implementation of the BillingApi trait that delegates to the domain service
pub struct BillingLocalClient {
    service: Arc<BillingService>,
}

impl BillingLocalClient {
    pub fn new(service: Arc<BillingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl BillingApi for BillingLocalClient {
    async fn entitlements(&self, user: UserRef) -> anyhow::Result<Entitlements> {
        self.service
            .entitlements(user)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn consume_chat_message(&self, user: UserRef) -> anyhow::Result<MeterReceipt> {
        self.service
            .consume_chat_message(user)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn consume_page_speed_reports(
        &self,
        user: UserRef,
        count: u32,
    ) -> anyhow::Result<MeterReceipt> {
        self.service
            .consume_page_speed_reports(user, count)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn check_site_creation(&self, user: UserRef) -> anyhow::Result<SiteGuard> {
        self.service
            .check_site_creation(user)
            .await
            .map_err(map_domain_error_to_anyhow)
    }

    async fn record_anchor_update(&self, update: AnchorUpdate) -> anyhow::Result<()> {
        self.service
            .record_anchor_update(update.user_id, update.anchor)
            .await
            .map_err(map_domain_error_to_anyhow)
    }
}

/// Map domain errors to contract errors wrapped in anyhow
fn map_domain_error_to_anyhow(domain_error: DomainError) -> anyhow::Error {
    let contract_error = match domain_error {
        DomainError::LimitExceeded(payload) => BillingError::limit_exceeded(payload),
        DomainError::Database { .. } | DomainError::SubscriptionLookup { .. } => {
            BillingError::internal()
        }
    };

    anyhow::Error::new(contract_error)
}
