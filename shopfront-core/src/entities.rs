//! Request/response types for the storefront microservices.
//!
//! Field names mirror the wire contract exactly (snake_case JSON); keep
//! serde renames out of here unless the backend forces one.

use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// AUTH / USER
// ============================================================================

/// Authenticated user as returned by the auth service and persisted locally
/// alongside the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// `POST /auth/login` and `POST /auth/register` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Full profile from the user service (`GET /users/profile`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// `PUT /users/profile` body. Only these two fields are editable.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub phone: String,
}

// ============================================================================
// PRODUCTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub stock: Option<i64>,
}

/// Paginated product listing (`GET /products?page&limit`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProductListParams {
    pub page: u32,
    pub limit: u32,
}

/// Aggregated detail response (`GET /products/:id/details`). The backend
/// joins product, stock, and reviews; the client never assembles this from
/// separate calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetails {
    pub product: Product,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

// ============================================================================
// CART
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub product_price: f64,
    pub quantity: u32,
    #[serde(default)]
    pub subtotal: Option<f64>,
}

/// `GET /cart` response: line items plus server-computed totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub item_count: u32,
    pub subtotal: f64,
    pub shipping: f64,
    pub total: f64,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddToCartRequest {
    pub product_id: String,
    pub product_name: String,
    pub product_price: f64,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

/// Shared shape of `GET /cart/count` and `GET /notifications/count`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u32,
}

// ============================================================================
// ORDERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Completed,
    Cancelled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    pub total: f64,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItem>,
}

/// Aggregated order detail (`GET /orders/:id/details`): the shipment is
/// absent until the shipping service has picked the order up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    #[serde(default)]
    pub shipment: Option<Shipment>,
}

// ============================================================================
// SHIPPING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Preparing,
    InTransit,
    OutForDelivery,
    Delivered,
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ShipmentStatus::Preparing => "preparing",
            ShipmentStatus::InTransit => "in transit",
            ShipmentStatus::OutForDelivery => "out for delivery",
            ShipmentStatus::Delivered => "delivered",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    #[serde(default)]
    pub carrier: Option<String>,
    pub status: ShipmentStatus,
    pub tracking_number: String,
    #[serde(default)]
    pub estimated_delivery: Option<Timestamp>,
}

/// `GET /shipping/estimate?origin&destination&weight` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingEstimate {
    pub origin: String,
    pub destination: String,
    pub weight: f64,
    pub cost: f64,
    #[serde(default)]
    pub estimated_days: Option<u32>,
}

// ============================================================================
// NOTIFICATIONS
// ============================================================================

/// Notification category. Unknown backend kinds deserialize to `Other`
/// rather than failing the whole list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderPlaced,
    OrderProcessing,
    OrderShipped,
    OrderCompleted,
    ReviewReminder,
    Promotion,
    CartReminder,
    Email,
    Sms,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type", default = "NotificationKind::fallback")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub title: Option<String>,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl NotificationKind {
    fn fallback() -> Self {
        NotificationKind::Other
    }
}

impl Notification {
    /// Heading shown in lists: title when set, message otherwise.
    pub fn heading(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.message)
    }
}

// ============================================================================
// REVIEWS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub product_id: String,
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    pub rating: u8,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateReviewRequest {
    pub product_id: String,
    pub user_id: String,
    pub rating: u8,
    pub title: String,
    pub comment: String,
}

/// Average rating over a review set, `None` when there are no reviews.
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    Some(f64::from(sum) / reviews.len() as f64)
}

/// Whether `user_id` already has a review in `reviews`.
pub fn has_reviewed(reviews: &[Review], user_id: &str) -> bool {
    reviews.iter().any(|r| r.user_id == user_id)
}

// ============================================================================
// TESTS
// ============================================================================
