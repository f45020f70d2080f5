//! Static plan-limit tables and the provider product mapping.

use std::collections::HashMap;

use tracing::warn;

use crate::config::BillingConfig;
use crate::contract::model::{FeatureCaps, Limit, ModelTier, Plan};

/// Immutable plan catalog, built once from configuration and injected into
/// the service. Replaces mutable module-level tables.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    limits: HashMap<Plan, FeatureCaps>,
    products: HashMap<String, Plan>,
}

impl PlanCatalog {
    pub fn from_config(config: &BillingConfig) -> Self {
        let mut limits = default_limits();

        for (name, overrides) in &config.plans {
            let Some(plan) = Plan::from_name(name) else {
                warn!(plan = %name, "Ignoring limit overrides for unknown plan");
                continue;
            };
            let caps = limits.entry(plan).or_insert_with(|| default_caps(plan));
            if let Some(sites) = overrides.sites {
                caps.sites = Limit::Limited(sites);
            }
            if let Some(messages) = overrides.messages {
                caps.messages = Limit::Limited(messages);
            }
            if let Some(reports) = overrides.page_speed_reports {
                caps.page_speed_reports = Limit::Limited(reports);
            }
        }

        let mut products = HashMap::new();
        for (product_id, plan_name) in &config.products {
            match Plan::from_name(plan_name) {
                Some(plan) => {
                    products.insert(product_id.clone(), plan);
                }
                None => warn!(
                    product = %product_id,
                    plan = %plan_name,
                    "Ignoring product mapping to unknown plan"
                ),
            }
        }

        Self { limits, products }
    }

    pub fn limits_for(&self, plan: Plan) -> FeatureCaps {
        self.limits
            .get(&plan)
            .copied()
            .unwrap_or_else(|| default_caps(plan))
    }

    /// Paid plan a provider product id maps to, if recognized.
    pub fn plan_for_product(&self, product_id: &str) -> Option<Plan> {
        self.products.get(product_id).copied()
    }

    pub fn model_tier(&self, plan: Plan) -> ModelTier {
        match plan {
            Plan::Starter => ModelTier::Basic,
            Plan::Pro | Plan::Agency => ModelTier::Premium,
        }
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::from_config(&BillingConfig::default())
    }
}

fn default_limits() -> HashMap<Plan, FeatureCaps> {
    [Plan::Starter, Plan::Pro, Plan::Agency]
        .into_iter()
        .map(|plan| (plan, default_caps(plan)))
        .collect()
}

fn default_caps(plan: Plan) -> FeatureCaps {
    match plan {
        Plan::Starter => FeatureCaps {
            sites: Limit::Limited(1),
            messages: Limit::Limited(50),
            page_speed_reports: Limit::Limited(5),
        },
        Plan::Pro => FeatureCaps {
            sites: Limit::Limited(5),
            messages: Limit::Limited(1000),
            page_speed_reports: Limit::Limited(100),
        },
        Plan::Agency => FeatureCaps {
            sites: Limit::Limited(25),
            messages: Limit::Unlimited,
            page_speed_reports: Limit::Limited(500),
        },
    }
}
