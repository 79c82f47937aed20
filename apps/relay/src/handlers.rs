//! HTTP handlers for the relay routes.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use permwatch_application::RelayOutcome;
use serde::Serialize;

use crate::state::AppState;

/// Response body for the no-data short circuit.
pub const NO_DATA_BODY: &str = "No data in message";
/// Response body after a successful delivery.
pub const DELIVERED_BODY: &str = "Notification sent to Google Chat";
/// Response body for any handled pipeline failure.
pub const FAILURE_BODY: &str = "Error processing message";

/// Health probe payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Fixed status marker.
    pub status: &'static str,
}

/// Accepts one Pub/Sub push delivery and relays it to the chat webhook.
pub async fn push_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, &'static str) {
    match state.relay_service.handle_push(&body).await {
        RelayOutcome::NoData => (StatusCode::OK, NO_DATA_BODY),
        RelayOutcome::Delivered => (StatusCode::OK, DELIVERED_BODY),
        RelayOutcome::Failed => (StatusCode::INTERNAL_SERVER_ERROR, FAILURE_BODY),
    }
}

/// Liveness probe.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
