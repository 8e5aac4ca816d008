//! Auth service endpoints.
//!
//! Both calls opt out of the 401 -> logout side effect: a rejected
//! credential is a validation failure, not an expired session, and must
//! never recurse into the logout broadcast.

use crate::transport::{RequestOptions, Transport};
use shopfront_core::{ApiResult, AuthResponse, LoginRequest, RegisterRequest};

/// `POST /auth/login`
pub async fn login(transport: &Transport, username: &str, password: &str) -> ApiResult<AuthResponse> {
    let body = LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    };
    transport
        .post_with("/auth/login", &body, RequestOptions::auth_endpoint())
        .await
}

/// `POST /auth/register`
pub async fn register(
    transport: &Transport,
    username: &str,
    email: &str,
    password: &str,
) -> ApiResult<AuthResponse> {
    let body = RegisterRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    };
    transport
        .post_with("/auth/register", &body, RequestOptions::auth_endpoint())
        .await
}
