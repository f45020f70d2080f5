use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;

use crate::api::rest::handlers;
use crate::domain::service::BillingService;

/// Mount the billing routes onto a router and attach the service extension.
pub fn register_routes(router: Router, service: Arc<BillingService>) -> Router {
    router
        .route("/billing/entitlements", get(handlers::get_entitlements))
        .route("/billing/sites/check", post(handlers::check_site_creation))
        .route(
            "/billing/usage/messages",
            post(handlers::consume_chat_message),
        )
        .route(
            "/billing/usage/page-speed-reports",
            post(handlers::consume_page_speed_reports),
        )
        .route(
            "/billing/webhooks/subscriptions",
            post(handlers::subscription_webhook),
        )
        .layer(Extension(service))
}
