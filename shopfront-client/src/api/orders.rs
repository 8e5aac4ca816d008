//! Order service endpoints.

use crate::transport::Transport;
use shopfront_core::{ApiResult, CreateOrderRequest, Order, OrderDetails};

/// `GET /orders`
pub async fn get_orders(transport: &Transport) -> ApiResult<Vec<Order>> {
    transport.get("/orders").await
}

/// `GET /orders/:id`
pub async fn get_order(transport: &Transport, id: &str) -> ApiResult<Order> {
    transport.get(&format!("/orders/{id}")).await
}

/// `GET /orders/:id/details` - aggregation with the shipment, when one
/// exists.
pub async fn get_order_details(transport: &Transport, id: &str) -> ApiResult<OrderDetails> {
    transport.get(&format!("/orders/{id}/details")).await
}

/// `POST /orders` - the user id comes from the auth token server-side.
pub async fn create_order(transport: &Transport, request: &CreateOrderRequest) -> ApiResult<Order> {
    transport.post("/orders", request).await
}
