//! Review service endpoints.

use crate::transport::Transport;
use serde_json::Value;
use shopfront_core::{ApiResult, CreateReviewRequest, Review};

#[derive(serde::Serialize)]
struct ReviewListParams<'a> {
    product_id: &'a str,
}

/// `GET /reviews?product_id=...`
pub async fn get_reviews(transport: &Transport, product_id: &str) -> ApiResult<Vec<Review>> {
    transport
        .get_with_query("/reviews", &ReviewListParams { product_id })
        .await
}

/// `POST /reviews` - fails with the conflict kind when the user already
/// reviewed the product.
pub async fn create_review(transport: &Transport, request: &CreateReviewRequest) -> ApiResult<Value> {
    transport.post("/reviews", request).await
}
