pub mod client;
pub mod error;
pub mod model;

pub use client::BillingApi;
pub use error::BillingError;
pub use model::{
    AnchorUpdate, CycleWindow, Entitlements, Feature, FeatureCaps, FeatureUsage, Limit,
    LimitExceeded, MeterReceipt, ModelTier, Plan, SiteGuard, SubscriptionStatus,
    SubscriptionSummary, UserRef,
};
