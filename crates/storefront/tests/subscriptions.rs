//! Database integration tests for subscription accounting.
//!
//! These tests require a running `PostgreSQL` database reachable through
//! `YUPAY_DATABASE_URL` (or `DATABASE_URL`). Migrations are applied on connect.
//!
//! Run with: `cargo test -p yupay-storefront --test subscriptions -- --ignored`

use std::sync::Arc;

use chrono::Utc;
use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

use yupay_core::{
    DenyReason, Limit, PlanCatalog, PlanTier, SubscriptionStatus, UserId,
};
use yupay_storefront::db::{StoreRepository, SubscriptionRepository, create_pool};
use yupay_storefront::services::{SubscriptionError, SubscriptionService};

async fn test_pool() -> PgPool {
    dotenvy::dotenv().ok();
    let url = std::env::var("YUPAY_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("YUPAY_DATABASE_URL must be set for database tests");

    let pool = create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

fn new_owner() -> UserId {
    UserId::new(Uuid::new_v4())
}

async fn set_sales(pool: &PgPool, owner: UserId, sales: i64) {
    sqlx::query("UPDATE yupay.subscription SET sales_this_month = $2 WHERE user_id = $1")
        .bind(owner)
        .bind(sales)
        .execute(pool)
        .await
        .expect("Failed to set sales counter");
}

async fn insert_store(pool: &PgPool, owner: UserId, name: &str, is_active: bool) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r"
        INSERT INTO yupay.store (id, owner_id, name, lat, lng, locality, is_active)
        VALUES ($1, $2, $3, -34.6037, -58.3816, 'Buenos Aires', $4)
        ",
    )
    .bind(id)
    .bind(owner)
    .bind(name)
    .bind(is_active)
    .execute(pool)
    .await
    .expect("Failed to insert store");
    id
}

async fn insert_product(pool: &PgPool, store_id: Uuid, name: &str) {
    sqlx::query(
        "INSERT INTO yupay.product (id, store_id, name, price) VALUES ($1, $2, $3, 1500.00)",
    )
    .bind(Uuid::new_v4())
    .bind(store_id)
    .bind(name)
    .execute(pool)
    .await
    .expect("Failed to insert product");
}

// ============================================================================
// Subscription lifecycle
// ============================================================================

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_subscription_round_trips_through_database() {
    let pool = test_pool().await;
    let catalog = PlanCatalog::default();
    let service = SubscriptionService::new(&pool, &catalog);
    let owner = new_owner();
    let now = Utc::now();

    let opened = service
        .subscribe(owner, PlanTier::Basico, now)
        .await
        .expect("Failed to subscribe");
    assert_eq!(opened.status, SubscriptionStatus::Trial);

    let stored = SubscriptionRepository::new(&pool)
        .get_by_user(owner)
        .await
        .expect("Failed to load subscription")
        .expect("Subscription should exist");
    assert_eq!(stored.id, opened.id);
    assert_eq!(stored.plan, PlanTier::Basico);
    assert_eq!(stored.status, SubscriptionStatus::Trial);
    assert_eq!(stored.sales_this_month, 0);
    assert!(stored.trial_end_date.is_some());
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_pooled_connections_keep_schema_off_search_path() {
    let pool = test_pool().await;

    let search_path: String = sqlx::query_scalar("SHOW search_path")
        .fetch_one(&pool)
        .await
        .expect("Failed to read search_path");
    assert_eq!(search_path, yupay_storefront::db::SEARCH_PATH);

    let tier: String = sqlx::query_scalar("SELECT pg_typeof('basico'::yupay.plan_tier)::text")
        .fetch_one(&pool)
        .await
        .expect("Failed to read enum type name");
    assert_eq!(tier, "yupay.plan_tier");
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_duplicate_subscribe_is_rejected() {
    let pool = test_pool().await;
    let catalog = PlanCatalog::default();
    let service = SubscriptionService::new(&pool, &catalog);
    let owner = new_owner();

    service
        .subscribe(owner, PlanTier::Free, Utc::now())
        .await
        .expect("Failed to subscribe");

    let err = service
        .subscribe(owner, PlanTier::Profesional, Utc::now())
        .await
        .expect_err("Second subscription should fail");
    assert!(matches!(err, SubscriptionError::AlreadySubscribed));
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_unknown_owner_is_not_subscribed() {
    let pool = test_pool().await;
    let catalog = PlanCatalog::default();
    let service = SubscriptionService::new(&pool, &catalog);

    let err = service
        .quota(new_owner(), Utc::now())
        .await
        .expect_err("Owner without subscription should fail");
    assert!(matches!(err, SubscriptionError::NotSubscribed));
}

// ============================================================================
// Usage and quota
// ============================================================================

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_quota_counts_stores_and_products() {
    let pool = test_pool().await;
    let catalog = PlanCatalog::default();
    let service = SubscriptionService::new(&pool, &catalog);
    let owner = new_owner();

    service
        .subscribe(owner, PlanTier::Free, Utc::now())
        .await
        .expect("Failed to subscribe");
    set_sales(&pool, owner, 4).await;

    let open = insert_store(&pool, owner, "Kiosco Abierto", true).await;
    let closed = insert_store(&pool, owner, "Kiosco Cerrado", false).await;
    insert_product(&pool, open, "Alfajor").await;
    insert_product(&pool, open, "Mate").await;
    insert_product(&pool, closed, "Yerba").await;

    // Another owner's inventory stays out of the count.
    let other = insert_store(&pool, new_owner(), "Vecino", true).await;
    insert_product(&pool, other, "Facturas").await;

    let quota = service.quota(owner, Utc::now()).await.expect("Failed to get quota");
    assert_eq!(quota.plan, PlanTier::Free);
    assert_eq!(quota.sales.used, 4);
    assert_eq!(quota.sales.remaining, Limit::Finite(16));
    assert_eq!(quota.products.used, 3);
    assert_eq!(quota.products.remaining, Limit::Finite(7));
    // Disabled stores still occupy a slot.
    assert_eq!(quota.stores.used, 2);
    assert_eq!(quota.stores.remaining, Limit::Finite(0));

    let active = StoreRepository::new(&pool)
        .list_active()
        .await
        .expect("Failed to list stores");
    assert!(active.iter().any(|store| store.name == "Kiosco Abierto"));
    assert!(!active.iter().any(|store| store.name == "Kiosco Cerrado"));
}

// ============================================================================
// Sale accounting
// ============================================================================

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_sale_at_limit_is_denied() {
    let pool = test_pool().await;
    let catalog = PlanCatalog::default();
    let service = SubscriptionService::new(&pool, &catalog);
    let owner = new_owner();

    service
        .subscribe(owner, PlanTier::Free, Utc::now())
        .await
        .expect("Failed to subscribe");
    set_sales(&pool, owner, 19).await;

    let last = service.record_sale(owner, Utc::now()).await.expect("Last sale should pass");
    assert_eq!(last.sales_this_month, 20);
    assert_eq!(last.status, SubscriptionStatus::LimitReached);
    assert_eq!(last.remaining, Limit::Finite(0));

    let err = service
        .record_sale(owner, Utc::now())
        .await
        .expect_err("Sale over the limit should fail");
    let SubscriptionError::Denied(decision) = err else {
        panic!("expected a denial, got {err:?}");
    };
    assert!(matches!(
        decision.reason,
        Some(DenyReason::InactiveSubscription {
            status: SubscriptionStatus::LimitReached
        })
    ));
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_concurrent_sales_never_exceed_limit() {
    let pool = test_pool().await;
    let catalog = Arc::new(PlanCatalog::default());
    let owner = new_owner();

    SubscriptionService::new(&pool, &catalog)
        .subscribe(owner, PlanTier::Free, Utc::now())
        .await
        .expect("Failed to subscribe");
    set_sales(&pool, owner, 15).await;

    let handles: Vec<_> = (0..30)
        .map(|_| {
            let pool = pool.clone();
            let catalog = Arc::clone(&catalog);
            tokio::spawn(async move {
                SubscriptionService::new(&pool, &catalog)
                    .record_sale(owner, Utc::now())
                    .await
            })
        })
        .collect();

    let mut counters = Vec::new();
    let mut denied = 0;
    let mut contended = 0;
    for handle in handles {
        match handle.await.expect("Sale task panicked") {
            Ok(sale) => counters.push(sale.sales_this_month),
            Err(SubscriptionError::Denied(_)) => denied += 1,
            Err(SubscriptionError::Contended { .. }) => contended += 1,
            Err(err) => panic!("unexpected error: {err:?}"),
        }
    }
    assert_eq!(counters.len() + denied + contended, 30);

    // Every successful write produced a distinct counter value.
    let recorded = u32::try_from(counters.len()).expect("count fits u32");
    counters.sort_unstable();
    counters.dedup();
    assert_eq!(counters.len(), recorded as usize, "two sales shared a counter value");
    assert!(recorded <= 5, "{recorded} sales recorded past a 20 sale limit");

    let stored = SubscriptionRepository::new(&pool)
        .get_by_user(owner)
        .await
        .expect("Failed to load subscription")
        .expect("Subscription should exist");
    assert_eq!(stored.sales_this_month, 15 + recorded);
    assert!(stored.sales_this_month <= 20);
    if recorded == 5 {
        assert_eq!(stored.status, SubscriptionStatus::LimitReached);
    }
}
