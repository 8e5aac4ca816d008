//! Transport normalization tests against a canned-response HTTP server.

use serde_json::json;
use shopfront_client::api;
use shopfront_client::session::{MemoryCredentialStore, Session, SessionEvent};
use shopfront_client::transport::{Transport, DEFAULT_TIMEOUT};
use shopfront_core::{ApiError, Cart, CountResponse};
use shopfront_test_utils::{sample_cart, sample_cart_item, sample_user, MockServer};
use std::time::Duration;

fn session() -> Session {
    Session::new(Box::new(MemoryCredentialStore::default())).expect("session")
}

fn logged_in_session() -> Session {
    let session = session();
    session
        .login("tok-alice".to_string(), sample_user("alice"))
        .expect("login");
    session
}

async fn transport_for(server: &MockServer, session: Session) -> Transport {
    Transport::new(&server.base_url(), DEFAULT_TIMEOUT, session).expect("transport")
}

#[tokio::test]
async fn success_body_is_deserialized() {
    let server = MockServer::start().await;
    let cart = sample_cart(vec![sample_cart_item(1, 2)]);
    server.mock("GET", "/cart", 200, serde_json::to_value(&cart).unwrap());

    let transport = transport_for(&server, logged_in_session()).await;
    let fetched: Cart = transport.get("/cart").await.expect("cart");
    assert_eq!(fetched.item_count, 2);
    assert_eq!(server.hits("GET", "/cart"), 1);
}

#[tokio::test]
async fn server_error_message_is_extracted() {
    let server = MockServer::start().await;
    server.mock("GET", "/cart", 500, json!({"error": "Internal server error"}));

    let transport = transport_for(&server, logged_in_session()).await;
    let err = transport.get::<Cart>("/cart").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Http {
            status: 500,
            message: "Internal server error".to_string()
        }
    );
}

#[tokio::test]
async fn missing_error_field_gets_generic_server_message() {
    let server = MockServer::start().await;
    server.mock("GET", "/cart", 500, json!({"detail": "??"}));

    let transport = transport_for(&server, logged_in_session()).await;
    let err = transport.get::<Cart>("/cart").await.unwrap_err();
    assert_eq!(err.server_message(), Some("An error occurred"));
}

#[tokio::test]
async fn conflict_maps_to_conflict_kind() {
    let server = MockServer::start().await;
    server.mock(
        "POST",
        "/reviews",
        409,
        json!({"error": "Review already exists"}),
    );

    let transport = transport_for(&server, logged_in_session()).await;
    let request = shopfront_core::CreateReviewRequest {
        product_id: "prod-00001".to_string(),
        user_id: "u-alice".to_string(),
        rating: 5,
        title: "Great".to_string(),
        comment: "Loved it".to_string(),
    };
    let err = api::reviews::create_review(&transport, &request)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn four_xx_maps_to_validation() {
    let server = MockServer::start().await;
    server.mock("GET", "/orders/o-9", 404, json!({"error": "Order not found"}));

    let transport = transport_for(&server, logged_in_session()).await;
    let err = api::orders::get_order(&transport, "o-9").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Validation {
            status: 404,
            message: "Order not found".to_string()
        }
    );
    assert_eq!(err.user_message(), "Order not found.");
}

#[tokio::test]
async fn connection_failure_is_network_error() {
    // Ephemeral port that nothing listens on.
    let gone = MockServer::start().await;
    let base_url = gone.base_url();
    drop(gone);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let session = logged_in_session();
    let transport = Transport::new(&base_url, Duration::from_millis(500), session).unwrap();
    let err = transport.get::<CountResponse>("/cart/count").await.unwrap_err();
    assert_eq!(err, ApiError::Network);
}

#[tokio::test]
async fn unauthorized_expires_session_and_broadcasts_once() {
    let server = MockServer::start().await;
    server.mock("GET", "/cart/count", 401, json!({"error": "Invalid or expired token"}));
    server.mock(
        "GET",
        "/notifications/count",
        401,
        json!({"error": "Invalid or expired token"}),
    );

    let session = logged_in_session();
    let mut events = session.subscribe();
    let transport = transport_for(&server, session.clone()).await;

    // Two near-simultaneous failures, e.g. both badge polls firing at once.
    let (a, b) = tokio::join!(
        transport.get::<CountResponse>("/cart/count"),
        transport.get::<CountResponse>("/notifications/count"),
    );
    assert_eq!(a.unwrap_err(), ApiError::SessionExpired);
    assert_eq!(b.unwrap_err(), ApiError::SessionExpired);
    assert!(!session.is_authenticated());

    assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedOut);
    assert!(events.try_recv().is_err(), "second broadcast must not happen");
}

#[tokio::test]
async fn auth_endpoints_opt_out_of_session_expiry() {
    let server = MockServer::start().await;
    server.mock(
        "POST",
        "/auth/login",
        401,
        json!({"error": "invalid credentials"}),
    );

    let session = logged_in_session();
    let mut events = session.subscribe();
    let transport = transport_for(&server, session.clone()).await;

    let err = api::auth::login(&transport, "alice", "wrong")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::Validation {
            status: 401,
            message: "invalid credentials".to_string()
        }
    );
    // The existing session survives a failed login attempt.
    assert!(session.is_authenticated());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn login_success_roundtrip() {
    let server = MockServer::start().await;
    server.mock(
        "POST",
        "/auth/login",
        200,
        json!({"token": "tok-1", "user": {"id": "u-alice", "username": "alice"}}),
    );

    let session = session();
    let transport = transport_for(&server, session.clone()).await;
    let response = api::auth::login(&transport, "alice", "password123")
        .await
        .expect("login");
    assert_eq!(response.token, "tok-1");
    assert_eq!(response.user.username, "alice");
}

#[tokio::test]
async fn empty_success_body_decodes_to_null() {
    let server = MockServer::start().await;
    server.mock("DELETE", "/cart", 200, json!({}));

    let transport = transport_for(&server, logged_in_session()).await;
    let value = api::cart::clear_cart(&transport).await.expect("clear");
    assert_eq!(value, json!({}));
}

#[tokio::test]
async fn shipping_endpoints_roundtrip() {
    let server = MockServer::start().await;
    server.mock(
        "GET",
        "/shipping/track",
        200,
        json!({"carrier": "FastShip", "status": "in_transit", "tracking_number": "FS1"}),
    );
    server.mock(
        "GET",
        "/shipping/estimate",
        200,
        json!({"origin": "SEA", "destination": "NYC", "weight": 2.5, "cost": 12.0, "estimated_days": 4}),
    );

    let transport = transport_for(&server, logged_in_session()).await;
    let shipment = api::shipping::track_shipment(&transport, "FS1").await.unwrap();
    assert_eq!(shipment.status, shopfront_core::ShipmentStatus::InTransit);

    let estimate = api::shipping::estimate_shipment(&transport, "SEA", "NYC", 2.5)
        .await
        .unwrap();
    assert_eq!(estimate.cost, 12.0);
    assert_eq!(estimate.estimated_days, Some(4));
}

#[tokio::test]
async fn product_endpoints_roundtrip() {
    let server = MockServer::start().await;
    server.mock(
        "GET",
        "/products",
        200,
        json!({"items": [{"id": "prod-00001", "name": "Smart Watch", "price": 49.99}], "total": 5013}),
    );
    server.mock(
        "GET",
        "/products/prod-00001",
        200,
        json!({"id": "prod-00001", "name": "Smart Watch", "price": 49.99, "stock": 12}),
    );
    server.mock(
        "GET",
        "/reviews",
        200,
        json!([{"id": "rev-1", "product_id": "prod-00001", "user_id": "u-bob", "rating": 4}]),
    );

    let transport = transport_for(&server, logged_in_session()).await;

    let page = api::products::get_products(
        &transport,
        shopfront_core::ProductListParams { page: 1, limit: 30 },
    )
    .await
    .unwrap();
    assert_eq!(page.total, 5013);
    assert_eq!(page.items[0].id, "prod-00001");

    let product = api::products::get_product(&transport, "prod-00001")
        .await
        .unwrap();
    assert_eq!(product.stock, Some(12));

    let reviews = api::reviews::get_reviews(&transport, "prod-00001")
        .await
        .unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].rating, 4);
}

#[tokio::test]
async fn user_endpoints_roundtrip() {
    let server = MockServer::start().await;
    server.mock(
        "GET",
        "/users/u-alice",
        200,
        json!({"id": "u-alice", "username": "alice"}),
    );
    server.mock(
        "GET",
        "/notifications/n-1",
        200,
        json!({"id": "n-1", "type": "promotion", "message": "sale"}),
    );

    let transport = transport_for(&server, logged_in_session()).await;
    let user = api::users::get_user(&transport, "u-alice").await.unwrap();
    assert_eq!(user.username, "alice");

    let notification = api::notifications::get_notification(&transport, "n-1")
        .await
        .unwrap();
    assert_eq!(notification.kind, shopfront_core::NotificationKind::Promotion);
}
