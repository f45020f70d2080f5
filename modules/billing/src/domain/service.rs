use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{
    Entitlements, Feature, FeatureCaps, FeatureUsage, LimitExceeded, MeterReceipt, SiteGuard,
    UserRef,
};
use crate::domain::catalog::PlanCatalog;
use crate::domain::error::DomainError;
use crate::domain::ports::SubscriptionProvider;
use crate::domain::repo::{BillingRepository, IncrementOutcome, MeteredCounter};
use crate::domain::resolver::{self, BillingState};

/// Domain service composing plan resolution, the usage ledger and the plan
/// catalog. Depends only on ports, not on infra types.
#[derive(Clone)]
pub struct BillingService {
    repo: Arc<dyn BillingRepository>,
    subscriptions: Arc<dyn SubscriptionProvider>,
    catalog: Arc<PlanCatalog>,
}

impl BillingService {
    /// Create a service with dependencies.
    pub fn new(
        repo: Arc<dyn BillingRepository>,
        subscriptions: Arc<dyn SubscriptionProvider>,
        catalog: Arc<PlanCatalog>,
    ) -> Self {
        Self {
            repo,
            subscriptions,
            catalog,
        }
    }

    /// Side-effect-free entitlements view, safe to call arbitrarily often.
    #[instrument(name = "billing.service.entitlements", skip(self), fields(user_id = %user.id))]
    pub async fn entitlements(&self, user: UserRef) -> Result<Entitlements, DomainError> {
        debug!("Resolving entitlements");
        let state = self.resolve(user).await?;
        self.entitlements_for_state(user, state).await
    }

    /// Consume one chat message, or reject with a limit-exceeded payload.
    #[instrument(name = "billing.service.consume_chat_message", skip(self), fields(user_id = %user.id))]
    pub async fn consume_chat_message(&self, user: UserRef) -> Result<MeterReceipt, DomainError> {
        self.consume(user, MeteredCounter::Messages, 1).await
    }

    /// Consume `count` page-speed reports. Tool invocations batched inside a
    /// single chat turn arrive as one delta.
    #[instrument(
        name = "billing.service.consume_page_speed_reports",
        skip(self),
        fields(user_id = %user.id, count)
    )]
    pub async fn consume_page_speed_reports(
        &self,
        user: UserRef,
        count: u32,
    ) -> Result<MeterReceipt, DomainError> {
        self.consume(user, MeteredCounter::PageSpeedReports, u64::from(count.max(1)))
            .await
    }

    /// Read-only site-creation guard. The CRUD flow creates the site after
    /// this passes; nothing is mutated here.
    #[instrument(name = "billing.service.check_site_creation", skip(self), fields(user_id = %user.id))]
    pub async fn check_site_creation(&self, user: UserRef) -> Result<SiteGuard, DomainError> {
        let entitlements = self.entitlements(user).await?;
        if entitlements.limits.sites.allows(entitlements.usage.sites) {
            return Ok(SiteGuard {
                allowed: true,
                entitlements,
                denial: None,
            });
        }

        let limit = entitlements.limits.sites.as_cap().unwrap_or(0);
        let denial = LimitExceeded::new(
            Feature::Sites,
            entitlements.plan,
            limit,
            entitlements.usage.sites,
            entitlements.cycle,
        );
        Ok(SiteGuard {
            allowed: false,
            entitlements,
            denial: Some(denial),
        })
    }

    /// Webhook-driven anchor upsert. Idempotent: repeated delivery of the
    /// same event converges to the same stored value with one write.
    #[instrument(
        name = "billing.service.record_anchor_update",
        skip(self),
        fields(user_id = %user_id, anchor = %anchor)
    )]
    pub async fn record_anchor_update(
        &self,
        user_id: Uuid,
        anchor: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let wrote = self
            .repo
            .upsert_anchor(user_id, anchor)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if wrote {
            info!("Billing anchor updated from subscription event");
        } else {
            debug!("Billing anchor unchanged, skipping write");
        }
        Ok(())
    }

    // --- internals ---

    async fn consume(
        &self,
        user: UserRef,
        counter: MeteredCounter,
        delta: u64,
    ) -> Result<MeterReceipt, DomainError> {
        let feature = match counter {
            MeteredCounter::Messages => Feature::Messages,
            MeteredCounter::PageSpeedReports => Feature::PageSpeedReports,
        };

        // Mutation path: paid cycle starts are baked into the stored anchor
        // so a lapsed subscription keeps its cadence.
        let state = self.resolve_and_bake(user).await?;
        let cap = state.limits.get(feature);

        self.repo
            .ensure_bucket(user.id, state.cycle)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        let outcome = self
            .repo
            .try_increment(user.id, state.cycle, counter, delta, cap)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        match outcome {
            IncrementOutcome::Updated { used } => {
                debug!(feature = %feature, used, "Metered consumption recorded");
                Ok(MeterReceipt {
                    feature,
                    plan: state.plan,
                    used,
                    limit: cap,
                    remaining: cap.remaining(used),
                    cycle: state.cycle,
                })
            }
            IncrementOutcome::CapReached { used } => {
                info!(feature = %feature, used, plan = %state.plan, "Metered action rejected at limit");
                Err(DomainError::limit_exceeded(LimitExceeded::new(
                    feature,
                    state.plan,
                    cap.as_cap().unwrap_or(0),
                    used,
                    state.cycle,
                )))
            }
        }
    }

    async fn resolve(&self, user: UserRef) -> Result<BillingState, DomainError> {
        let subscription = self
            .subscriptions
            .current_subscription(user.id)
            .await
            .map_err(|e| DomainError::subscription_lookup(e.to_string()))?;
        let stored_anchor = self
            .repo
            .find_anchor(user.id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        Ok(resolver::resolve(
            &self.catalog,
            Utc::now(),
            user.created_at,
            stored_anchor,
            subscription,
        ))
    }

    async fn resolve_and_bake(&self, user: UserRef) -> Result<BillingState, DomainError> {
        let state = self.resolve(user).await?;
        if state.is_paid() {
            self.repo
                .upsert_anchor(user.id, state.cycle.start)
                .await
                .map_err(|e| DomainError::database(e.to_string()))?;
        }
        Ok(state)
    }

    async fn entitlements_for_state(
        &self,
        user: UserRef,
        state: BillingState,
    ) -> Result<Entitlements, DomainError> {
        let counters = self
            .repo
            .usage_for_cycle(user.id, state.cycle.start)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        let sites = self
            .repo
            .count_sites(user.id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        let usage = FeatureUsage {
            sites,
            messages: counters.messages,
            page_speed_reports: counters.page_speed_reports,
        };
        let remaining = FeatureCaps {
            sites: state.limits.sites.remaining(usage.sites),
            messages: state.limits.messages.remaining(usage.messages),
            page_speed_reports: state
                .limits
                .page_speed_reports
                .remaining(usage.page_speed_reports),
        };

        Ok(Entitlements {
            plan: state.plan,
            model_tier: self.catalog.model_tier(state.plan),
            limits: state.limits,
            usage,
            remaining,
            cycle: state.cycle,
            subscription: state.subscription,
        })
    }
}
