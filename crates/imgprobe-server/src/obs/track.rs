//! Request-duration middleware for instrumented routes.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app_state::AppState;

/// Record entry/exit of one request into `image_processing_duration_seconds`.
pub async fn track_processing(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();

    let response = next.run(req).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16().to_string();
    let metrics = state.metrics();
    metrics
        .processing_duration
        .observe(&[("method", &method), ("status", &status)], elapsed);
    metrics.requests.inc(&[("status", &status)]);

    response
}
