use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::contract::model::{
    Entitlements, FeatureCaps, FeatureUsage, Limit, LimitExceeded, MeterReceipt, SiteGuard,
    SubscriptionSummary,
};

/// REST DTO for the entitlements view
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntitlementsDto {
    pub plan: String,
    pub model_tier: String,
    pub limits: CapsDto,
    pub usage: UsageDto,
    pub remaining: CapsDto,
    pub cycle: CycleDto,
    pub subscription: Option<SubscriptionSummaryDto>,
}

/// Per-feature caps; `null` means unlimited
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CapsDto {
    pub sites: Option<u64>,
    pub messages: Option<u64>,
    pub page_speed_reports: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UsageDto {
    pub sites: u64,
    pub messages: u64,
    pub page_speed_reports: u64,
}

/// Cycle window as epoch milliseconds, the shape the dashboard consumes
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CycleDto {
    pub start_ms: i64,
    pub end_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SubscriptionSummaryDto {
    pub plan: String,
    pub status: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub cancel_at_period_end: bool,
    pub product_name: String,
}

/// REST DTO for a successful metered consumption
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MeterReceiptDto {
    pub feature: String,
    pub plan: String,
    pub used: u64,
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    pub cycle_start_ms: i64,
    pub cycle_end_ms: i64,
}

/// Structured limit-exceeded payload; the UI pattern-matches on `code`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LimitExceededDto {
    pub code: String,
    pub feature: String,
    pub plan: String,
    pub limit: u64,
    pub used: u64,
    pub cycle_start_ms: i64,
    pub cycle_end_ms: i64,
    pub cta: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SiteGuardDto {
    pub allowed: bool,
    pub entitlements: EntitlementsDto,
    pub error: Option<LimitExceededDto>,
}

/// Request body for batched page-speed report consumption
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ConsumePageSpeedReq {
    pub count: Option<u32>,
}

/// Webhook event from the subscription provider. Everything is optional:
/// events that don't carry what we need are silently ignored.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SubscriptionEventDto {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub user_id: Option<String>,
    pub current_period_start: Option<String>,
}

// Conversion implementations between REST DTOs and contract models

fn caps_to_dto(caps: FeatureCaps) -> CapsDto {
    CapsDto {
        sites: caps.sites.as_cap(),
        messages: caps.messages.as_cap(),
        page_speed_reports: caps.page_speed_reports.as_cap(),
    }
}

impl From<FeatureUsage> for UsageDto {
    fn from(usage: FeatureUsage) -> Self {
        Self {
            sites: usage.sites,
            messages: usage.messages,
            page_speed_reports: usage.page_speed_reports,
        }
    }
}

impl From<SubscriptionSummary> for SubscriptionSummaryDto {
    fn from(summary: SubscriptionSummary) -> Self {
        Self {
            plan: summary.plan.as_str().to_string(),
            status: summary.status.as_str().to_string(),
            current_period_start: summary.current_period_start,
            current_period_end: summary.current_period_end,
            cancel_at_period_end: summary.cancel_at_period_end,
            product_name: summary.product_name,
        }
    }
}

impl From<Entitlements> for EntitlementsDto {
    fn from(entitlements: Entitlements) -> Self {
        Self {
            plan: entitlements.plan.as_str().to_string(),
            model_tier: entitlements.model_tier.as_str().to_string(),
            limits: caps_to_dto(entitlements.limits),
            usage: entitlements.usage.into(),
            remaining: caps_to_dto(entitlements.remaining),
            cycle: CycleDto {
                start_ms: entitlements.cycle.start.timestamp_millis(),
                end_ms: entitlements.cycle.end.timestamp_millis(),
            },
            subscription: entitlements.subscription.map(Into::into),
        }
    }
}

impl From<MeterReceipt> for MeterReceiptDto {
    fn from(receipt: MeterReceipt) -> Self {
        Self {
            feature: receipt.feature.as_str().to_string(),
            plan: receipt.plan.as_str().to_string(),
            used: receipt.used,
            limit: receipt.limit.as_cap(),
            remaining: match receipt.remaining {
                Limit::Limited(n) => Some(n),
                Limit::Unlimited => None,
            },
            cycle_start_ms: receipt.cycle.start.timestamp_millis(),
            cycle_end_ms: receipt.cycle.end.timestamp_millis(),
        }
    }
}

impl From<LimitExceeded> for LimitExceededDto {
    fn from(payload: LimitExceeded) -> Self {
        Self {
            code: "LIMIT_EXCEEDED".to_string(),
            feature: payload.feature.as_str().to_string(),
            plan: payload.plan.as_str().to_string(),
            limit: payload.limit,
            used: payload.used,
            cycle_start_ms: payload.cycle.start.timestamp_millis(),
            cycle_end_ms: payload.cycle.end.timestamp_millis(),
            cta: "upgrade".to_string(),
            message: payload.message,
        }
    }
}

impl From<SiteGuard> for SiteGuardDto {
    fn from(guard: SiteGuard) -> Self {
        Self {
            allowed: guard.allowed,
            entitlements: guard.entitlements.into(),
            error: guard.denial.map(Into::into),
        }
    }
}
