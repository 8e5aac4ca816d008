//! Shopfront Test Utilities
//!
//! Centralized test infrastructure for the workspace:
//! - A canned-response HTTP server for transport tests
//! - Fixtures for common entities
//! - Proptest generators for domain enums and records

pub use shopfront_core::{
    AuthResponse, Cart, CartItem, CountResponse, Notification, NotificationKind, Order,
    OrderDetails, OrderItem, OrderStatus, Product, ProductDetails, Review, Shipment,
    ShipmentStatus, User, UserProfile,
};

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use uuid::Uuid;

// ============================================================================
// MOCK HTTP SERVER
// ============================================================================

/// Just enough HTTP/1.1 to satisfy a real client in tests: canned JSON
/// responses per method+path, hit counting, connection-close framing.
pub struct MockServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    accept_task: JoinHandle<()>,
}

#[derive(Clone)]
struct CannedResponse {
    status: u16,
    body: String,
}

#[derive(Default)]
struct ServerState {
    routes: Mutex<HashMap<String, CannedResponse>>,
    hits: Mutex<HashMap<String, usize>>,
}

impl MockServer {
    /// Bind an ephemeral port and start serving.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server addr");
        let state = Arc::new(ServerState::default());
        let accept_state = Arc::clone(&state);
        let accept_task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, _)) => {
                        let state = Arc::clone(&accept_state);
                        tokio::spawn(async move {
                            let _ = handle_connection(state, stream).await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });
        Self {
            addr,
            state,
            accept_task,
        }
    }

    /// Base URL including the reverse-proxy path prefix, ready to hand to
    /// a transport.
    pub fn base_url(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    /// Register a canned response. `path` is relative to `/api/v1`.
    pub fn mock(&self, method: &str, path: &str, status: u16, body: Value) {
        let key = route_key(method, path);
        self.lock_routes().insert(
            key,
            CannedResponse {
                status,
                body: body.to_string(),
            },
        );
    }

    /// How many requests hit `method path` so far (query strings ignored).
    pub fn hits(&self, method: &str, path: &str) -> usize {
        let key = route_key(method, path);
        self.lock_hits().get(&key).copied().unwrap_or(0)
    }

    fn lock_routes(&self) -> std::sync::MutexGuard<'_, HashMap<String, CannedResponse>> {
        match self.state.routes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_hits(&self) -> std::sync::MutexGuard<'_, HashMap<String, usize>> {
        match self.state.hits.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

fn route_key(method: &str, path: &str) -> String {
    format!("{} /api/v1{}", method.to_ascii_uppercase(), path)
}

async fn handle_connection(state: Arc<ServerState>, mut stream: TcpStream) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];

    // Read until end of headers.
    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buffer.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_header_end(&buffer) {
            break pos;
        }
        if buffer.len() > 64 * 1024 {
            return Ok(());
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_ascii_uppercase();
    let target = parts.next().unwrap_or_default();
    let path = target.split('?').next().unwrap_or_default().to_string();

    // Drain any body so the client can finish writing before we respond.
    let content_length = lines
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .next()
        .unwrap_or(0);
    let mut remaining = content_length.saturating_sub(buffer.len() - header_end - 4);
    while remaining > 0 {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        remaining = remaining.saturating_sub(n);
    }

    let key = format!("{} {}", method, path);
    {
        let mut hits = match state.hits.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *hits.entry(key.clone()).or_insert(0) += 1;
    }

    let response = {
        let routes = match state.routes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        routes.get(&key).cloned().unwrap_or(CannedResponse {
            status: 404,
            body: r#"{"error":"Not found"}"#.to_string(),
        })
    };

    let payload = format!(
        "HTTP/1.1 {} Mock\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        response.status,
        response.body.len(),
        response.body
    );
    stream.write_all(payload.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

// ============================================================================
// FIXTURES
// ============================================================================

pub fn sample_user(username: &str) -> User {
    User {
        id: format!("u-{username}"),
        username: username.to_string(),
        email: Some(format!("{username}@example.com")),
    }
}

pub fn sample_profile(username: &str) -> UserProfile {
    UserProfile {
        id: format!("u-{username}"),
        username: username.to_string(),
        email: Some(format!("{username}@example.com")),
        name: None,
        phone: None,
    }
}

pub fn sample_product(index: u32) -> Product {
    Product {
        id: format!("prod-{index:05}"),
        name: format!("Gadget {index}"),
        description: Some("High quality gadget for everyday use.".to_string()),
        price: 9.99 + f64::from(index),
        stock: Some(i64::from(index % 200)),
    }
}

pub fn sample_cart_item(index: u32, quantity: u32) -> CartItem {
    let product = sample_product(index);
    CartItem {
        id: format!("ci-{index}"),
        product_id: product.id,
        product_name: product.name,
        product_price: product.price,
        quantity,
        subtotal: Some(product.price * f64::from(quantity)),
    }
}

pub fn sample_cart(items: Vec<CartItem>) -> Cart {
    let item_count = items.iter().map(|item| item.quantity).sum();
    let subtotal: f64 = items
        .iter()
        .map(|item| item.product_price * f64::from(item.quantity))
        .sum();
    let shipping = if items.is_empty() { 0.0 } else { 5.0 };
    Cart {
        items,
        item_count,
        subtotal,
        shipping,
        total: subtotal + shipping,
    }
}

pub fn sample_order(id: &str, status: OrderStatus) -> Order {
    Order {
        id: id.to_string(),
        status,
        total: 104.98,
        items: vec![OrderItem {
            product_id: "prod-00001".to_string(),
            product_name: "Gadget 1".to_string(),
            quantity: 2,
            price: 49.99,
        }],
        created_at: Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap(),
    }
}

pub fn sample_notification(id: &str, read: bool) -> Notification {
    Notification {
        id: id.to_string(),
        kind: NotificationKind::OrderShipped,
        title: Some("Order shipped".to_string()),
        message: "Your order is on its way.".to_string(),
        read,
        created_at: Some(Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap()),
    }
}

pub fn sample_review(product_id: &str, user_id: &str, rating: u8) -> Review {
    Review {
        id: Uuid::now_v7().to_string(),
        product_id: product_id.to_string(),
        user_id: user_id.to_string(),
        username: None,
        rating,
        title: Some("Solid".to_string()),
        comment: Some("Does what it says.".to_string()),
        created_at: None,
    }
}

pub fn sample_shipment(status: ShipmentStatus) -> Shipment {
    Shipment {
        carrier: Some("FastShip".to_string()),
        status,
        tracking_number: "FS123456789".to_string(),
        estimated_delivery: Some(Utc.with_ymd_and_hms(2026, 1, 9, 12, 0, 0).unwrap()),
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub fn arb_order_status() -> impl Strategy<Value = OrderStatus> {
    prop_oneof![
        Just(OrderStatus::Pending),
        Just(OrderStatus::Processing),
        Just(OrderStatus::Shipped),
        Just(OrderStatus::Completed),
        Just(OrderStatus::Cancelled),
    ]
}

pub fn arb_shipment_status() -> impl Strategy<Value = ShipmentStatus> {
    prop_oneof![
        Just(ShipmentStatus::Preparing),
        Just(ShipmentStatus::InTransit),
        Just(ShipmentStatus::OutForDelivery),
        Just(ShipmentStatus::Delivered),
    ]
}

pub fn arb_notification_kind() -> impl Strategy<Value = NotificationKind> {
    prop_oneof![
        Just(NotificationKind::OrderPlaced),
        Just(NotificationKind::OrderProcessing),
        Just(NotificationKind::OrderShipped),
        Just(NotificationKind::OrderCompleted),
        Just(NotificationKind::ReviewReminder),
        Just(NotificationKind::Promotion),
        Just(NotificationKind::CartReminder),
        Just(NotificationKind::Email),
        Just(NotificationKind::Sms),
        Just(NotificationKind::Other),
    ]
}

pub fn arb_product() -> impl Strategy<Value = Product> {
    (0u32..10_000, 1.0f64..500.0).prop_map(|(index, price)| Product {
        id: format!("prod-{index:05}"),
        name: format!("Gadget {index}"),
        description: None,
        price,
        stock: Some(i64::from(index % 200)),
    })
}

pub fn arb_notification() -> impl Strategy<Value = Notification> {
    (
        "[a-z0-9]{4,12}",
        arb_notification_kind(),
        any::<bool>(),
        "[a-zA-Z ]{1,40}",
    )
        .prop_map(|(id, kind, read, message)| Notification {
            id,
            kind,
            title: None,
            message,
            read,
            created_at: None,
        })
}
