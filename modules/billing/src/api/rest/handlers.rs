use axum::{body::Bytes, http::StatusCode, response::Response, Extension, Json};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::api::rest::dto::{
    ConsumePageSpeedReq, EntitlementsDto, MeterReceiptDto, SiteGuardDto, SubscriptionEventDto,
};
use crate::api::rest::error::domain_error_response;
use crate::api::rest::extract::CurrentUser;
use crate::domain::service::BillingService;

/// Current entitlements for the calling user. Read-only.
pub async fn get_entitlements(
    Extension(svc): Extension<std::sync::Arc<BillingService>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<EntitlementsDto>, Response> {
    match svc.entitlements(user).await {
        Ok(entitlements) => Ok(Json(entitlements.into())),
        Err(e) => {
            error!("Failed to resolve entitlements: {}", e);
            Err(domain_error_response(e))
        }
    }
}

/// Site-creation guard. Reports the limit-exceeded shape inline instead of
/// failing the request, since "not allowed" is an expected answer here.
pub async fn check_site_creation(
    Extension(svc): Extension<std::sync::Arc<BillingService>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SiteGuardDto>, Response> {
    match svc.check_site_creation(user).await {
        Ok(guard) => Ok(Json(guard.into())),
        Err(e) => {
            error!("Site-creation check failed: {}", e);
            Err(domain_error_response(e))
        }
    }
}

/// Consume one chat message.
pub async fn consume_chat_message(
    Extension(svc): Extension<std::sync::Arc<BillingService>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MeterReceiptDto>, Response> {
    match svc.consume_chat_message(user).await {
        Ok(receipt) => Ok(Json(receipt.into())),
        Err(e) => Err(domain_error_response(e)),
    }
}

/// Consume a batch of page-speed reports (default 1).
pub async fn consume_page_speed_reports(
    Extension(svc): Extension<std::sync::Arc<BillingService>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<ConsumePageSpeedReq>,
) -> Result<Json<MeterReceiptDto>, Response> {
    let count = req.count.unwrap_or(1);
    match svc.consume_page_speed_reports(user, count).await {
        Ok(receipt) => Ok(Json(receipt.into())),
        Err(e) => Err(domain_error_response(e)),
    }
}

/// Webhook receiver for subscription provider events.
///
/// Best-effort by contract: malformed or unidentifiable events are dropped
/// silently and the provider always gets a 200, so it never retries. The
/// body is parsed by hand rather than through the `Json` extractor, which
/// would answer 400/415 before this handler runs. The upsert is idempotent,
/// so duplicate deliveries converge.
pub async fn subscription_webhook(
    Extension(svc): Extension<std::sync::Arc<BillingService>>,
    body: Bytes,
) -> StatusCode {
    let Some(event) = serde_json::from_slice::<SubscriptionEventDto>(&body).ok() else {
        debug!("Ignoring unparseable subscription event body");
        return StatusCode::OK;
    };
    let Some((user_id, anchor)) = extract_anchor_update(&event) else {
        debug!(event_type = ?event.event_type, "Ignoring unusable subscription event");
        return StatusCode::OK;
    };

    match svc.record_anchor_update(user_id, anchor).await {
        Ok(()) => info!(%user_id, "Processed subscription event"),
        // Still 200: the provider expects best-effort handling, and a later
        // delivery (or the resolver's bake-in) will converge the anchor.
        Err(e) => error!("Failed to persist billing anchor from event: {}", e),
    }
    StatusCode::OK
}

fn extract_anchor_update(event: &SubscriptionEventDto) -> Option<(Uuid, DateTime<Utc>)> {
    match event.event_type.as_deref() {
        Some("subscription.created") | Some("subscription.updated") => {}
        _ => return None,
    }
    let user_id = event.user_id.as_deref().and_then(|v| Uuid::parse_str(v).ok())?;
    let anchor = event
        .current_period_start
        .as_deref()
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|dt| dt.with_timezone(&Utc))?;
    Some((user_id, anchor))
}
