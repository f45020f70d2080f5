//! Plan and cycle-window resolution.
//!
//! The external subscription is authoritative for paid-cycle boundaries
//! while it is active; the stored anchor only matters for users who never
//! subscribed or whose subscription lapsed, so their free-tier cycle date
//! does not silently reset on every query.

use chrono::{DateTime, Utc};

use crate::contract::model::{
    CycleWindow, FeatureCaps, Plan, SubscriptionStatus, SubscriptionSummary,
};
use crate::domain::catalog::PlanCatalog;
use crate::domain::cycle;
use crate::domain::ports::SubscriptionRecord;

/// Resolved billing state for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingState {
    pub plan: Plan,
    pub limits: FeatureCaps,
    pub cycle: CycleWindow,
    pub subscription: Option<SubscriptionSummary>,
}

impl BillingState {
    /// Paid states bake their cycle start into the stored anchor on
    /// mutation paths, so a later cancellation keeps the same cadence.
    pub fn is_paid(&self) -> bool {
        self.subscription.is_some()
    }
}

/// Pure resolution over already-fetched inputs. Precedence:
/// active subscription with a recognized product > stored anchor > the
/// user's account-creation timestamp.
pub fn resolve(
    catalog: &PlanCatalog,
    now: DateTime<Utc>,
    user_created_at: DateTime<Utc>,
    stored_anchor: Option<DateTime<Utc>>,
    subscription: Option<SubscriptionRecord>,
) -> BillingState {
    if let Some(record) = subscription {
        let status = SubscriptionStatus::from_provider(&record.status);
        if status.is_entitling() {
            if let Some(plan) = catalog.plan_for_product(&record.product_id) {
                return paid_state(catalog, plan, status, &record, now);
            }
        }
    }

    let anchor = stored_anchor.unwrap_or(user_created_at);
    BillingState {
        plan: Plan::Starter,
        limits: catalog.limits_for(Plan::Starter),
        cycle: cycle::window(anchor, now),
        subscription: None,
    }
}

fn paid_state(
    catalog: &PlanCatalog,
    plan: Plan,
    status: SubscriptionStatus,
    record: &SubscriptionRecord,
    now: DateTime<Utc>,
) -> BillingState {
    // Unparseable period start degrades to "a cycle starting now" rather
    // than failing the entitlement check.
    let start = record
        .current_period_start
        .as_deref()
        .and_then(parse_instant)
        .unwrap_or(now);
    let end = record
        .current_period_end
        .as_deref()
        .and_then(parse_instant)
        .filter(|end| *end > start)
        .unwrap_or_else(|| cycle::shift_one_month(start));

    BillingState {
        plan,
        limits: catalog.limits_for(plan),
        cycle: CycleWindow { start, end },
        subscription: Some(SubscriptionSummary {
            plan,
            status,
            current_period_start: start,
            current_period_end: end,
            cancel_at_period_end: record.cancel_at_period_end,
            product_name: record
                .product_name
                .clone()
                .unwrap_or_else(|| plan.as_str().to_string()),
        }),
    }
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
