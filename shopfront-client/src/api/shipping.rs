//! Shipping service endpoints.

use crate::transport::Transport;
use shopfront_core::{ApiResult, Shipment, ShippingEstimate};

#[derive(serde::Serialize)]
struct TrackParams<'a> {
    tracking_number: &'a str,
}

#[derive(serde::Serialize)]
struct EstimateParams<'a> {
    origin: &'a str,
    destination: &'a str,
    weight: f64,
}

/// `GET /shipping/track?tracking_number=...`
pub async fn track_shipment(transport: &Transport, tracking_number: &str) -> ApiResult<Shipment> {
    transport
        .get_with_query("/shipping/track", &TrackParams { tracking_number })
        .await
}

/// `GET /shipping/estimate?origin&destination&weight`
pub async fn estimate_shipment(
    transport: &Transport,
    origin: &str,
    destination: &str,
    weight: f64,
) -> ApiResult<ShippingEstimate> {
    transport
        .get_with_query(
            "/shipping/estimate",
            &EstimateParams {
                origin,
                destination,
                weight,
            },
        )
        .await
}
