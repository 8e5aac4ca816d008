//! Notification service endpoints.

use crate::transport::Transport;
use serde_json::{json, Value};
use shopfront_core::{ApiResult, CountResponse, Notification};

/// `GET /notifications`
pub async fn get_notifications(transport: &Transport) -> ApiResult<Vec<Notification>> {
    transport.get("/notifications").await
}

/// `GET /notifications/:id`
pub async fn get_notification(transport: &Transport, id: &str) -> ApiResult<Notification> {
    transport.get(&format!("/notifications/{id}")).await
}

/// `PATCH /notifications/:id` - mark as read. The body is empty; the id in
/// the path is the whole instruction.
pub async fn mark_as_read(transport: &Transport, id: &str) -> ApiResult<Value> {
    transport
        .patch(&format!("/notifications/{id}"), &json!({}))
        .await
}

/// `GET /notifications/count` - unread count for the header badge.
pub async fn get_notification_count(transport: &Transport) -> ApiResult<CountResponse> {
    transport.get("/notifications/count").await
}
