//! User service endpoints.

use crate::transport::Transport;
use serde_json::Value;
use shopfront_core::{ApiResult, UpdateProfileRequest, UserProfile};

/// `GET /users/profile`
pub async fn get_profile(transport: &Transport) -> ApiResult<UserProfile> {
    transport.get("/users/profile").await
}

/// `GET /users/:id`
pub async fn get_user(transport: &Transport, id: &str) -> ApiResult<UserProfile> {
    transport.get(&format!("/users/{id}")).await
}

/// `PUT /users/profile`
pub async fn update_profile(transport: &Transport, name: &str, phone: &str) -> ApiResult<Value> {
    let body = UpdateProfileRequest {
        name: name.to_string(),
        phone: phone.to_string(),
    };
    transport.put("/users/profile", &body).await
}
