use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configuration for the billing module.
///
/// Plan limits and the provider product map have built-in defaults; config
/// entries override them per plan name. Loaded once at startup and handed to
/// the plan catalog, never consulted as global state afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BillingConfig {
    /// Provider product id -> plan name ("pro", "agency").
    #[serde(default = "default_products")]
    pub products: HashMap<String, String>,

    /// Plan name -> limit overrides.
    #[serde(default)]
    pub plans: HashMap<String, PlanLimitsConfig>,

    /// Base URL of the subscription provider API. When unset the module
    /// resolves every user as never-subscribed.
    #[serde(default)]
    pub subscription_provider_url: Option<String>,
}

/// Limit overrides for a single plan. `None` fields keep the built-in
/// default; an explicit `~` (null) in YAML cannot lift a cap to unlimited —
/// unlimited tiers are part of the built-in tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanLimitsConfig {
    #[serde(default)]
    pub sites: Option<u64>,
    #[serde(default)]
    pub messages: Option<u64>,
    #[serde(default)]
    pub page_speed_reports: Option<u64>,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            products: default_products(),
            plans: HashMap::new(),
            subscription_provider_url: None,
        }
    }
}

fn default_products() -> HashMap<String, String> {
    let mut products = HashMap::new();
    products.insert("prod_pro".to_string(), "pro".to_string());
    products.insert("prod_agency".to_string(), "agency".to_string());
    products
}
