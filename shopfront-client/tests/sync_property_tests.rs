//! End-to-end properties of the data synchronization layer.

use proptest::prelude::*;
use serde_json::{json, Value};
use shopfront_client::api;
use shopfront_client::cache::CacheStore;
use shopfront_client::keys;
use shopfront_client::mutation::{MutationCoordinator, MutationOptions};
use shopfront_client::query::{to_cache_value, QueryCoordinator, RevalidationPolicy};
use shopfront_client::session::{MemoryCredentialStore, Session};
use shopfront_client::transport::{Transport, DEFAULT_TIMEOUT};
use shopfront_core::{ApiError, CountResponse};
use shopfront_test_utils::{sample_user, MockServer};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn coordinator() -> QueryCoordinator {
    QueryCoordinator::new(CacheStore::default())
}

/// Poll `predicate` on the snapshot of `key` until it holds or the
/// deadline passes.
async fn wait_for_snapshot<F>(queries: &QueryCoordinator, key: &str, predicate: F)
where
    F: Fn(&Value) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if let Some(data) = queries.snapshot(Some(key)).data {
            if predicate(&data) {
                return;
            }
        }
        if tokio::time::Instant::now() > deadline {
            panic!("snapshot for {key} did not converge in time");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// ----------------------------------------------------------------------------
// Property: N concurrent queries within the dedupe window -> 1 transport call,
// all callers observe the same value.
// ----------------------------------------------------------------------------
#[tokio::test]
async fn concurrent_queries_share_one_transport_call() {
    let queries = coordinator();
    let calls = Arc::new(AtomicUsize::new(0));
    let policy = RevalidationPolicy::default().with_dedupe_window(Duration::from_secs(60));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let queries = queries.clone();
        let calls = calls.clone();
        let policy = policy;
        handles.push(tokio::spawn(async move {
            queries
                .fetch(
                    Some("cart-count"),
                    move || async move {
                        let n = calls.fetch_add(1, Ordering::SeqCst);
                        // Slow enough that every sibling joins this fetch.
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(json!({ "count": n }))
                    },
                    &policy,
                )
                .await
        }));
    }

    let mut seen = Vec::new();
    for handle in handles {
        let snap = handle.await.expect("task");
        seen.push(snap.data.expect("data"));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1, "exactly one transport call");
    assert!(seen.windows(2).all(|pair| pair[0] == pair[1]));
}

// ----------------------------------------------------------------------------
// Property: a fetch failure never clobbers cached data.
// ----------------------------------------------------------------------------
#[tokio::test]
async fn failure_leaves_cached_data_intact() {
    let queries = coordinator();
    let policy = RevalidationPolicy::default().with_dedupe_window(Duration::from_millis(0));

    queries
        .fetch(Some("orders"), || async { Ok(json!(["order-1"])) }, &policy)
        .await;
    let snap = queries
        .fetch(
            Some("orders"),
            || async { Err(ApiError::Network) },
            &policy,
        )
        .await;

    assert_eq!(snap.data, Some(json!(["order-1"])));
    assert_eq!(snap.error, Some(ApiError::Network));
    // A view can therefore keep rendering stale data beside the error.
    assert!(!snap.never_loaded());
}

// ----------------------------------------------------------------------------
// Property: after logout, the gated key is the sentinel and no transport
// call is made.
// ----------------------------------------------------------------------------
#[tokio::test]
async fn logout_gates_queries_to_the_sentinel() {
    let session = Session::new(Box::new(MemoryCredentialStore::default())).unwrap();
    session
        .login("tok-1".to_string(), sample_user("alice"))
        .unwrap();
    let queries = coordinator();
    let calls = Arc::new(AtomicUsize::new(0));

    session.logout().unwrap();
    assert!(!session.is_authenticated());

    let key = session.is_authenticated().then(|| keys::CART_COUNT.to_string());
    let calls_in = calls.clone();
    let snap = queries
        .fetch(
            key.as_deref(),
            move || async move {
                calls_in.fetch_add(1, Ordering::SeqCst);
                Ok(json!({ "count": 1 }))
            },
            &RevalidationPolicy::default(),
        )
        .await;

    assert!(snap.data.is_none());
    assert!(!snap.loading);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ----------------------------------------------------------------------------
// Property: an optimistic mutation that fails ends with the cache
// reflecting server ground truth, never the rejected optimistic value.
// ----------------------------------------------------------------------------
#[tokio::test]
async fn optimistic_failure_reconciles_to_ground_truth() {
    let queries = coordinator();
    let (mutations, _notices) = MutationCoordinator::new(queries.clone());
    let policy = RevalidationPolicy::default().with_dedupe_window(Duration::from_secs(60));

    let ground_truth = json!([{ "id": "n-1", "read": false }]);
    let server = ground_truth.clone();
    queries
        .fetch(
            Some(keys::NOTIFICATIONS),
            move || async move { Ok(server) },
            &policy,
        )
        .await;

    let mutation = mutations.mutation();
    let result: Option<()> = mutation
        .run_optimistic(
            keys::NOTIFICATIONS,
            json!([{ "id": "n-1", "read": true }]),
            async { Err(ApiError::Network) },
            MutationOptions::default().silent(),
        )
        .await;
    assert!(result.is_none());

    // Reconcile: the key was invalidated, so the next fetch bypasses the
    // dedupe window and restores what the server says.
    let server = ground_truth.clone();
    let snap = queries
        .fetch(
            Some(keys::NOTIFICATIONS),
            move || async move { Ok(server) },
            &policy,
        )
        .await;
    assert_eq!(snap.data, Some(ground_truth));
}

// ----------------------------------------------------------------------------
// Scenario: login -> token persisted -> cart-count key becomes active ->
// fetch issued -> badge reflects the returned count.
// ----------------------------------------------------------------------------
#[tokio::test]
async fn login_activates_cart_count_badge() {
    let server = MockServer::start().await;
    server.mock(
        "POST",
        "/auth/login",
        200,
        json!({"token": "tok-1", "user": {"id": "u-alice", "username": "alice"}}),
    );
    server.mock("GET", "/cart/count", 200, json!({"count": 3}));

    let session = Session::new(Box::new(MemoryCredentialStore::default())).unwrap();
    let transport = Transport::new(&server.base_url(), DEFAULT_TIMEOUT, session.clone()).unwrap();
    let queries = coordinator();
    let policy = RevalidationPolicy::default();

    // Unauthenticated: the badge key is the sentinel, nothing fetched.
    let key = session.is_authenticated().then(|| keys::CART_COUNT.to_string());
    let t = transport.clone();
    let snap = queries
        .fetch(
            key.as_deref(),
            move || async move { api::cart::get_cart_count(&t).await.map(to_cache_value) },
            &policy,
        )
        .await;
    assert!(snap.data.is_none());
    assert_eq!(server.hits("GET", "/cart/count"), 0);

    // Login with the seeded demo credentials.
    let response = api::auth::login(&transport, "alice", "password123")
        .await
        .expect("login");
    session.login(response.token, response.user).unwrap();
    assert!(session.is_authenticated());

    let key = session.is_authenticated().then(|| keys::CART_COUNT.to_string());
    let t = transport.clone();
    let snap = queries
        .fetch(
            key.as_deref(),
            move || async move { api::cart::get_cart_count(&t).await.map(to_cache_value) },
            &policy,
        )
        .await;
    let count: CountResponse = snap.data_as().expect("count");
    assert_eq!(count.count, 3);
    assert_eq!(server.hits("GET", "/cart/count"), 1);
}

// ----------------------------------------------------------------------------
// Scenario: add-to-cart succeeds -> cart-count invalidated -> the active
// badge subscription reflects the incremented count without a manual
// refresh.
// ----------------------------------------------------------------------------
#[tokio::test]
async fn add_to_cart_refreshes_badge_through_invalidation() {
    let queries = coordinator();
    let (mutations, _notices) = MutationCoordinator::new(queries.clone());
    let server_count = Arc::new(AtomicU32::new(1));

    let reader = server_count.clone();
    let mut badge = queries.subscribe(
        Some(keys::CART_COUNT.to_string()),
        move || {
            let reader = reader.clone();
            async move { Ok(json!({ "count": reader.load(Ordering::SeqCst) })) }
        },
        RevalidationPolicy::default().with_dedupe_window(Duration::from_millis(0)),
    );

    badge.changed().await;
    assert_eq!(
        badge.snapshot().data_as::<CountResponse>().map(|c| c.count),
        Some(1)
    );

    // The write increments the server-side count.
    let writer = server_count.clone();
    let mutation = mutations.mutation();
    let added = mutation
        .run(
            async move {
                writer.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            MutationOptions::default()
                .silent()
                .revalidating([keys::CART_COUNT]),
        )
        .await;
    assert_eq!(added, Some(()));

    wait_for_snapshot(&queries, keys::CART_COUNT, |data| {
        data.get("count").and_then(Value::as_u64) == Some(2)
    })
    .await;
}

// ----------------------------------------------------------------------------
// Subscriptions gated on the session react to a logout by being rebuilt
// with the sentinel: the old driver stops issuing calls.
// ----------------------------------------------------------------------------
#[tokio::test]
async fn dropping_subscription_stops_polling() {
    let queries = coordinator();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    let badge = queries.subscribe(
        Some(keys::CART_COUNT.to_string()),
        move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(json!({ "count": 0 }))
            }
        },
        RevalidationPolicy::badge(Duration::from_millis(20), Duration::from_millis(0)),
    );

    tokio::time::sleep(Duration::from_millis(100)).await;
    let while_active = calls.load(Ordering::SeqCst);
    assert!(while_active >= 2, "interval revalidation should have fired");

    drop(badge);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let after_drop = calls.load(Ordering::SeqCst);
    // One in-flight tick may complete after the drop; no further polling.
    assert!(after_drop <= while_active + 1);
}

// ----------------------------------------------------------------------------
// Proptest: policy constructors and cache keys hold their invariants for
// arbitrary inputs.
// ----------------------------------------------------------------------------
proptest! {
    #[test]
    fn badge_policy_always_revalidates_on_focus_and_reconnect(
        interval_ms in 1u64..120_000,
        dedupe_ms in 0u64..30_000,
    ) {
        let policy = RevalidationPolicy::badge(
            Duration::from_millis(interval_ms),
            Duration::from_millis(dedupe_ms),
        );
        prop_assert!(policy.revalidate_on_focus);
        prop_assert!(policy.revalidate_on_reconnect);
        prop_assert_eq!(policy.interval, Some(Duration::from_millis(interval_ms)));
        prop_assert_eq!(policy.dedupe_window, Duration::from_millis(dedupe_ms));
    }

    #[test]
    fn product_page_keys_are_injective(
        page_a in 1u32..10_000, limit_a in 1u32..500,
        page_b in 1u32..10_000, limit_b in 1u32..500,
    ) {
        let same = page_a == page_b && limit_a == limit_b;
        prop_assert_eq!(
            keys::products(page_a, limit_a) == keys::products(page_b, limit_b),
            same
        );
    }

    #[test]
    fn detail_keys_never_collide_across_resources(id in "[a-z0-9-]{1,20}") {
        let product = keys::product_details(&id);
        let order = keys::order_details(&id);
        let review = keys::reviews(&id);
        prop_assert_ne!(&product, &order);
        prop_assert_ne!(&product, &review);
        prop_assert_ne!(&order, &review);
    }
}
