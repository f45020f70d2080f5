use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use sea_orm::{Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use tower::ServiceExt;
use uuid::Uuid;

use billing::{
    api::rest::routes::register_routes,
    config::{BillingConfig, PlanLimitsConfig},
    contract::model::{Feature, Limit, Plan, UserRef},
    domain::{
        catalog::PlanCatalog,
        error::DomainError,
        ports::{SubscriptionProvider, SubscriptionRecord},
        repo::BillingRepository,
        service::BillingService,
    },
    infra::storage::{entity::site, migrations::Migrator, SeaOrmBillingRepository},
};

fn utc(s: &str) -> DateTime<Utc> {
    s.parse().expect("valid test timestamp")
}

/// Subscription provider stub returning a fixed record.
struct StaticSubscriptions(Option<SubscriptionRecord>);

#[async_trait]
impl SubscriptionProvider for StaticSubscriptions {
    async fn current_subscription(
        &self,
        _user_id: Uuid,
    ) -> anyhow::Result<Option<SubscriptionRecord>> {
        Ok(self.0.clone())
    }
}

/// Create a fresh test database for each test
async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");

    Migrator::up(&db, None).await.expect("Failed to run migrations");

    db
}

/// Small starter caps so limit tests don't need dozens of calls.
fn test_catalog() -> Arc<PlanCatalog> {
    let mut config = BillingConfig::default();
    config.plans.insert(
        "starter".to_string(),
        PlanLimitsConfig {
            sites: Some(1),
            messages: Some(3),
            page_speed_reports: Some(5),
        },
    );
    Arc::new(PlanCatalog::from_config(&config))
}

struct TestEnv {
    db: DatabaseConnection,
    service: Arc<BillingService>,
    repo: Arc<dyn BillingRepository>,
}

async fn create_test_env(subscription: Option<SubscriptionRecord>) -> TestEnv {
    let db = create_test_db().await;
    let repo: Arc<dyn BillingRepository> = Arc::new(SeaOrmBillingRepository::new(db.clone()));
    let service = Arc::new(BillingService::new(
        repo.clone(),
        Arc::new(StaticSubscriptions(subscription)),
        test_catalog(),
    ));
    TestEnv { db, service, repo }
}

fn test_user() -> UserRef {
    UserRef {
        id: Uuid::new_v4(),
        created_at: utc("2024-01-15T00:00:00Z"),
    }
}

fn pro_subscription() -> SubscriptionRecord {
    SubscriptionRecord {
        product_id: "prod_pro".to_string(),
        status: "active".to_string(),
        current_period_start: Some("2024-06-01T00:00:00Z".to_string()),
        current_period_end: Some("2024-07-01T00:00:00Z".to_string()),
        cancel_at_period_end: false,
        product_name: Some("RankPilot Pro".to_string()),
    }
}

#[tokio::test]
async fn test_entitlements_for_new_user() -> Result<()> {
    let env = create_test_env(None).await;
    let user = test_user();

    let entitlements = env.service.entitlements(user).await?;

    assert_eq!(entitlements.plan, Plan::Starter);
    assert_eq!(entitlements.usage.messages, 0);
    assert_eq!(entitlements.usage.sites, 0);
    assert_eq!(entitlements.limits.messages, Limit::Limited(3));
    assert_eq!(entitlements.remaining.messages, Limit::Limited(3));
    assert!(entitlements.subscription.is_none());
    assert!(entitlements.cycle.start < entitlements.cycle.end);

    // Display queries must not create buckets as a side effect.
    let counters = env.repo.usage_for_cycle(user.id, entitlements.cycle.start).await?;
    assert_eq!(counters.messages, 0);

    Ok(())
}

#[tokio::test]
async fn test_consume_messages_monotonic_until_limit() -> Result<()> {
    let env = create_test_env(None).await;
    let user = test_user();

    for expected in 1..=3u64 {
        let receipt = env.service.consume_chat_message(user).await?;
        assert_eq!(receipt.used, expected);
        assert_eq!(receipt.feature, Feature::Messages);
        assert_eq!(receipt.remaining, Limit::Limited(3 - expected));
    }

    // At the cap: rejected with the full payload, counter untouched.
    let err = env.service.consume_chat_message(user).await.unwrap_err();
    match err {
        DomainError::LimitExceeded(payload) => {
            assert_eq!(payload.feature, Feature::Messages);
            assert_eq!(payload.plan, Plan::Starter);
            assert_eq!(payload.limit, 3);
            assert_eq!(payload.used, 3);
            assert!(payload.message.contains("Upgrade"));
        }
        other => panic!("expected LimitExceeded, got {other:?}"),
    }

    let entitlements = env.service.entitlements(user).await?;
    assert_eq!(entitlements.usage.messages, 3);
    assert_eq!(entitlements.remaining.messages, Limit::Limited(0));

    Ok(())
}

#[tokio::test]
async fn test_page_speed_reports_batch_delta() -> Result<()> {
    let env = create_test_env(None).await;
    let user = test_user();

    let receipt = env.service.consume_page_speed_reports(user, 3).await?;
    assert_eq!(receipt.used, 3);
    assert_eq!(receipt.remaining, Limit::Limited(2));

    let receipt = env.service.consume_page_speed_reports(user, 2).await?;
    assert_eq!(receipt.used, 5);

    // Cap reached: even a batch of one is rejected now.
    let err = env.service.consume_page_speed_reports(user, 1).await.unwrap_err();
    assert!(matches!(err, DomainError::LimitExceeded(_)));

    Ok(())
}

#[tokio::test]
async fn test_cross_cycle_isolation() -> Result<()> {
    let env = create_test_env(None).await;
    let user = test_user();

    let receipt = env.service.consume_chat_message(user).await?;
    let current_start = receipt.cycle.start;

    // A different cycle start must see none of this usage.
    let other_start = utc("2020-05-15T00:00:00Z");
    assert_ne!(current_start, other_start);
    let counters = env.repo.usage_for_cycle(user.id, other_start).await?;
    assert_eq!(counters.messages, 0);

    let counters = env.repo.usage_for_cycle(user.id, current_start).await?;
    assert_eq!(counters.messages, 1);

    Ok(())
}

#[tokio::test]
async fn test_site_guard_allows_then_denies() -> Result<()> {
    let env = create_test_env(None).await;
    let user = test_user();

    let guard = env.service.check_site_creation(user).await?;
    assert!(guard.allowed);
    assert!(guard.denial.is_none());

    // Site CRUD is external; simulate it by inserting a row directly.
    let m = site::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        domain: Set("example.com".to_string()),
        created_at: Set(Utc::now()),
    };
    sea_orm::ActiveModelTrait::insert(m, &env.db).await?;

    let guard = env.service.check_site_creation(user).await?;
    assert!(!guard.allowed);
    let denial = guard.denial.expect("denial payload");
    assert_eq!(denial.feature, Feature::Sites);
    assert_eq!(denial.limit, 1);
    assert_eq!(denial.used, 1);
    // The guard mutates nothing.
    assert_eq!(guard.entitlements.usage.sites, 1);

    Ok(())
}

#[tokio::test]
async fn test_paid_plan_uses_subscription_window_and_bakes_anchor() -> Result<()> {
    let env = create_test_env(Some(pro_subscription())).await;
    let user = test_user();

    assert_eq!(env.repo.find_anchor(user.id).await?, None);

    let receipt = env.service.consume_chat_message(user).await?;
    assert_eq!(receipt.plan, Plan::Pro);
    assert_eq!(receipt.cycle.start, utc("2024-06-01T00:00:00Z"));
    assert_eq!(receipt.cycle.end, utc("2024-07-01T00:00:00Z"));

    // The paid cycle start is now the stored anchor.
    assert_eq!(
        env.repo.find_anchor(user.id).await?,
        Some(utc("2024-06-01T00:00:00Z"))
    );

    let entitlements = env.service.entitlements(user).await?;
    let summary = entitlements.subscription.expect("subscription summary");
    assert_eq!(summary.plan, Plan::Pro);
    assert_eq!(summary.product_name, "RankPilot Pro");

    Ok(())
}

#[tokio::test]
async fn test_subscription_precedence_over_stored_anchor() -> Result<()> {
    let env = create_test_env(Some(pro_subscription())).await;
    let user = test_user();

    // A stale local anchor must not override the provider's period dates.
    env.repo.upsert_anchor(user.id, utc("2023-03-09T00:00:00Z")).await?;

    let entitlements = env.service.entitlements(user).await?;
    assert_eq!(entitlements.cycle.start, utc("2024-06-01T00:00:00Z"));
    assert_eq!(entitlements.cycle.end, utc("2024-07-01T00:00:00Z"));

    Ok(())
}

#[tokio::test]
async fn test_anchor_upsert_is_idempotent() -> Result<()> {
    let env = create_test_env(None).await;
    let user_id = Uuid::new_v4();
    let anchor = utc("2024-06-01T00:00:00Z");

    assert!(env.repo.upsert_anchor(user_id, anchor).await?);
    // Second identical call is a no-op comparison.
    assert!(!env.repo.upsert_anchor(user_id, anchor).await?);
    assert_eq!(env.repo.find_anchor(user_id).await?, Some(anchor));

    // A different value writes again.
    let moved = utc("2024-07-01T00:00:00Z");
    assert!(env.repo.upsert_anchor(user_id, moved).await?);
    assert_eq!(env.repo.find_anchor(user_id).await?, Some(moved));

    Ok(())
}

// --- REST API ---

async fn create_test_router(subscription: Option<SubscriptionRecord>) -> (Router, TestEnv) {
    let env = create_test_env(subscription).await;
    let router = register_routes(Router::new(), env.service.clone());
    (router, env)
}

fn authed_request(method: &str, uri: &str, user: &UserRef, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-user-id", user.id.to_string())
        .header("x-user-created-at", user.created_at.to_rfc3339())
        .body(body)
        .expect("valid request")
}

#[tokio::test]
async fn test_rest_entitlements() -> Result<()> {
    let (router, _env) = create_test_router(None).await;
    let user = test_user();

    let response = router
        .oneshot(authed_request("GET", "/billing/entitlements", &user, Body::empty()))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let dto: billing::api::rest::dto::EntitlementsDto = serde_json::from_slice(&body)?;
    assert_eq!(dto.plan, "starter");
    assert_eq!(dto.model_tier, "basic");
    assert_eq!(dto.limits.messages, Some(3));
    assert_eq!(dto.usage.messages, 0);
    assert!(dto.cycle.start_ms < dto.cycle.end_ms);

    Ok(())
}

#[tokio::test]
async fn test_rest_missing_identity_headers() -> Result<()> {
    let (router, _env) = create_test_router(None).await;

    let request = Request::builder()
        .method("GET")
        .uri("/billing/entitlements")
        .body(Body::empty())?;

    let response = router.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_rest_consume_messages_until_limit_exceeded() -> Result<()> {
    let (router, _env) = create_test_router(None).await;
    let user = test_user();

    for _ in 0..3 {
        let response = router
            .clone()
            .oneshot(authed_request("POST", "/billing/usage/messages", &user, Body::empty()))
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .oneshot(authed_request("POST", "/billing/usage/messages", &user, Body::empty()))
        .await?;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let dto: billing::api::rest::dto::LimitExceededDto = serde_json::from_slice(&body)?;
    assert_eq!(dto.code, "LIMIT_EXCEEDED");
    assert_eq!(dto.feature, "messages");
    assert_eq!(dto.plan, "starter");
    assert_eq!(dto.limit, 3);
    assert_eq!(dto.used, 3);
    assert_eq!(dto.cta, "upgrade");

    Ok(())
}

#[tokio::test]
async fn test_rest_webhook_upserts_anchor() -> Result<()> {
    let (router, env) = create_test_router(None).await;
    let user_id = Uuid::new_v4();

    let payload = serde_json::json!({
        "type": "subscription.created",
        "user_id": user_id.to_string(),
        "current_period_start": "2024-06-01T00:00:00Z",
    });
    let request = Request::builder()
        .method("POST")
        .uri("/billing/webhooks/subscriptions")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))?;

    let response = router.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        env.repo.find_anchor(user_id).await?,
        Some(utc("2024-06-01T00:00:00Z"))
    );

    Ok(())
}

#[tokio::test]
async fn test_rest_webhook_ignores_malformed_events() -> Result<()> {
    let (router, env) = create_test_router(None).await;
    let user_id = Uuid::new_v4();

    for payload in [
        // Wrong event type
        serde_json::json!({
            "type": "invoice.paid",
            "user_id": user_id.to_string(),
            "current_period_start": "2024-06-01T00:00:00Z",
        }),
        // Unparseable period start
        serde_json::json!({
            "type": "subscription.updated",
            "user_id": user_id.to_string(),
            "current_period_start": "yesterday",
        }),
        // Missing user
        serde_json::json!({
            "type": "subscription.created",
            "current_period_start": "2024-06-01T00:00:00Z",
        }),
    ] {
        let request = Request::builder()
            .method("POST")
            .uri("/billing/webhooks/subscriptions")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))?;

        // Always 200, never an error back to the provider.
        let response = router.clone().oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Bodies that are not even valid JSON (or mistype a field) must also be
    // dropped silently, not rejected before the handler runs.
    for raw in ["not json at all", "{\"type\": 7}", ""] {
        let request = Request::builder()
            .method("POST")
            .uri("/billing/webhooks/subscriptions")
            .header("content-type", "application/json")
            .body(Body::from(raw))?;

        let response = router.clone().oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(env.repo.find_anchor(user_id).await?, None);

    Ok(())
}

#[tokio::test]
async fn test_rest_site_check_reports_denial_inline() -> Result<()> {
    let (router, env) = create_test_router(None).await;
    let user = test_user();

    let m = site::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        domain: Set("example.com".to_string()),
        created_at: Set(Utc::now()),
    };
    sea_orm::ActiveModelTrait::insert(m, &env.db).await?;

    let response = router
        .oneshot(authed_request("POST", "/billing/sites/check", &user, Body::empty()))
        .await?;
    // Denial is an expected answer, not an error status.
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let dto: billing::api::rest::dto::SiteGuardDto = serde_json::from_slice(&body)?;
    assert!(!dto.allowed);
    let error = dto.error.expect("denial payload");
    assert_eq!(error.code, "LIMIT_EXCEEDED");
    assert_eq!(error.feature, "sites");

    Ok(())
}
