use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use crate::domain::ports::{SubscriptionProvider, SubscriptionRecord};

/// HTTP adapter implementing the SubscriptionProvider port against the
/// hosted billing provider's read API.
pub struct HttpSubscriptionProvider {
    client: reqwest::Client,
    base: Url,
}

impl HttpSubscriptionProvider {
    pub fn new(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }
}

/// Wire shape of the provider's subscription response. Period timestamps
/// stay strings; the resolver owns lenient parsing.
#[derive(Debug, Deserialize)]
struct SubscriptionDto {
    product_id: String,
    status: String,
    #[serde(default)]
    current_period_start: Option<String>,
    #[serde(default)]
    current_period_end: Option<String>,
    #[serde(default)]
    cancel_at_period_end: bool,
    #[serde(default)]
    product_name: Option<String>,
}

#[async_trait]
impl SubscriptionProvider for HttpSubscriptionProvider {
    #[instrument(
        name = "billing.http.subscriptions.current",
        skip_all,
        fields(base = %self.base, user_id = %user_id)
    )]
    async fn current_subscription(
        &self,
        user_id: Uuid,
    ) -> anyhow::Result<Option<SubscriptionRecord>> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("invalid subscription provider base URL"))?
            .extend(&["api", "subscriptions", "current", &user_id.to_string()]);

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .with_context(|| format!("GET /api/subscriptions/current/{user_id}"))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            anyhow::bail!("subscription provider returned HTTP {}", response.status());
        }

        let dto: SubscriptionDto = response
            .json()
            .await
            .context("malformed subscription provider response")?;

        Ok(Some(SubscriptionRecord {
            product_id: dto.product_id,
            status: dto.status,
            current_period_start: dto.current_period_start,
            current_period_end: dto.current_period_end,
            cancel_at_period_end: dto.cancel_at_period_end,
            product_name: dto.product_name,
        }))
    }
}
