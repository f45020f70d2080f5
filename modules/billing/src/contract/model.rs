use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Plan tiers. Closed set; limits live in the plan catalog, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plan {
    Starter,
    Pro,
    Agency,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Starter => "starter",
            Plan::Pro => "pro",
            Plan::Agency => "agency",
        }
    }

    /// Parse a plan name as it appears in configuration files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "starter" => Some(Plan::Starter),
            "pro" => Some(Plan::Pro),
            "agency" => Some(Plan::Agency),
            _ => None,
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality tier of the AI model a plan is entitled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Basic,
    Premium,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Basic => "basic",
            ModelTier::Premium => "premium",
        }
    }
}

/// Metered features gated by plan limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Sites,
    Messages,
    PageSpeedReports,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Sites => "sites",
            Feature::Messages => "messages",
            Feature::PageSpeedReports => "page_speed_reports",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-cycle quota. `Unlimited` never rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Limited(u64),
    Unlimited,
}

impl Limit {
    /// Whether one more unit may be consumed at the given usage level.
    pub fn allows(&self, used: u64) -> bool {
        match self {
            Limit::Limited(cap) => used < *cap,
            Limit::Unlimited => true,
        }
    }

    /// Quota left at the given usage level (saturating; unlimited stays unlimited).
    pub fn remaining(&self, used: u64) -> Limit {
        match self {
            Limit::Limited(cap) => Limit::Limited(cap.saturating_sub(used)),
            Limit::Unlimited => Limit::Unlimited,
        }
    }

    /// Finite cap, if any. `None` means unlimited.
    pub fn as_cap(&self) -> Option<u64> {
        match self {
            Limit::Limited(cap) => Some(*cap),
            Limit::Unlimited => None,
        }
    }
}

impl From<Option<u64>> for Limit {
    fn from(cap: Option<u64>) -> Self {
        match cap {
            Some(n) => Limit::Limited(n),
            None => Limit::Unlimited,
        }
    }
}

/// Per-feature quota table for one plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureCaps {
    pub sites: Limit,
    pub messages: Limit,
    pub page_speed_reports: Limit,
}

impl FeatureCaps {
    pub fn get(&self, feature: Feature) -> Limit {
        match feature {
            Feature::Sites => self.sites,
            Feature::Messages => self.messages,
            Feature::PageSpeedReports => self.page_speed_reports,
        }
    }
}

/// Per-feature usage counts within one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureUsage {
    pub sites: u64,
    pub messages: u64,
    pub page_speed_reports: u64,
}

/// Half-open billing period `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CycleWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Lifecycle status reported by the subscription provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Unknown,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Unknown => "unknown",
        }
    }

    /// Lenient parse of provider status strings; anything unrecognized is `Unknown`.
    pub fn from_provider(status: &str) -> Self {
        match status {
            "active" => SubscriptionStatus::Active,
            "trialing" => SubscriptionStatus::Trialing,
            "past_due" => SubscriptionStatus::PastDue,
            "canceled" | "cancelled" => SubscriptionStatus::Canceled,
            _ => SubscriptionStatus::Unknown,
        }
    }

    /// Statuses that entitle the user to the paid plan right now.
    pub fn is_entitling(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }
}

/// Resolved view of an active external subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSummary {
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub cancel_at_period_end: bool,
    pub product_name: String,
}

/// Caller identity. Owned by the auth collaborator; read-only here.
/// `created_at` is the last-resort billing anchor for users who never
/// subscribed and have no stored anchor yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRef {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Full entitlements view for display and guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entitlements {
    pub plan: Plan,
    pub model_tier: ModelTier,
    pub limits: FeatureCaps,
    pub usage: FeatureUsage,
    pub remaining: FeatureCaps,
    pub cycle: CycleWindow,
    pub subscription: Option<SubscriptionSummary>,
}

/// Result of a successful metered consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterReceipt {
    pub feature: Feature,
    pub plan: Plan,
    pub used: u64,
    pub limit: Limit,
    pub remaining: Limit,
    pub cycle: CycleWindow,
}

/// Outcome of the site-creation guard. Site creation itself happens in an
/// unrelated CRUD flow after this check passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteGuard {
    pub allowed: bool,
    pub entitlements: Entitlements,
    pub denial: Option<LimitExceeded>,
}

/// Structured limit-exceeded payload. The UI renders an upgrade prompt from
/// these fields without a second round-trip, so all of them are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitExceeded {
    pub feature: Feature,
    pub plan: Plan,
    pub limit: u64,
    pub used: u64,
    pub cycle: CycleWindow,
    pub message: String,
}

impl LimitExceeded {
    pub fn new(feature: Feature, plan: Plan, limit: u64, used: u64, cycle: CycleWindow) -> Self {
        let message = format!(
            "You've used {used} of {limit} {feature} on the {plan} plan this billing cycle. \
             Upgrade to continue."
        );
        Self {
            feature,
            plan,
            limit,
            used,
            cycle,
            message,
        }
    }
}

/// Webhook-driven anchor update extracted from a provider event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorUpdate {
    pub user_id: Uuid,
    pub anchor: DateTime<Utc>,
}
