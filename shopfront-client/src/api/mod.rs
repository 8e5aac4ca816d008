//! Typed wrappers over the storefront services, one module per backend.
//!
//! Mutation endpoints whose bodies the application never consumes return
//! `serde_json::Value`; callers revalidate the affected cache keys instead
//! of trusting a write response.

pub mod auth;
pub mod cart;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod shipping;
pub mod users;
