//! Cart service endpoints.

use crate::transport::Transport;
use serde_json::Value;
use shopfront_core::{AddToCartRequest, ApiResult, Cart, CountResponse, UpdateCartItemRequest};

/// `GET /cart`
pub async fn get_cart(transport: &Transport) -> ApiResult<Cart> {
    transport.get("/cart").await
}

/// `GET /cart/count` - powers the header badge.
pub async fn get_cart_count(transport: &Transport) -> ApiResult<CountResponse> {
    transport.get("/cart/count").await
}

/// `POST /cart`
pub async fn add_to_cart(transport: &Transport, request: &AddToCartRequest) -> ApiResult<Value> {
    transport.post("/cart", request).await
}

/// `PATCH /cart/items/:id`
pub async fn update_cart_item(transport: &Transport, item_id: &str, quantity: u32) -> ApiResult<Value> {
    transport
        .patch(
            &format!("/cart/items/{item_id}"),
            &UpdateCartItemRequest { quantity },
        )
        .await
}

/// `DELETE /cart/items/:id`
pub async fn remove_cart_item(transport: &Transport, item_id: &str) -> ApiResult<Value> {
    transport.delete(&format!("/cart/items/{item_id}")).await
}

/// `DELETE /cart`
pub async fn clear_cart(transport: &Transport) -> ApiResult<Value> {
    transport.delete("/cart").await
}
