//! Product service endpoints.

use crate::transport::Transport;
use shopfront_core::{ApiResult, Product, ProductDetails, ProductListParams, ProductPage};

/// `GET /products?page&limit`
pub async fn get_products(transport: &Transport, params: ProductListParams) -> ApiResult<ProductPage> {
    transport.get_with_query("/products", &params).await
}

/// `GET /products/:id`
pub async fn get_product(transport: &Transport, id: &str) -> ApiResult<Product> {
    transport.get(&format!("/products/{id}")).await
}

/// `GET /products/:id/details` - aggregation endpoint. The backend joins
/// product, stock, and reviews; the client must not orchestrate those
/// calls itself.
pub async fn get_product_details(transport: &Transport, id: &str) -> ApiResult<ProductDetails> {
    transport.get(&format!("/products/{id}/details")).await
}
