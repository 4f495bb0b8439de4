//! Axum router wiring.
//!
//! `/` is the only instrumented route; operational endpoints are added after
//! the `route_layer` so they are not timed.

use axum::{middleware, routing::get, Router};

use crate::{app_state::AppState, obs, ops, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(transport::http::process_image))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            obs::track::track_processing,
        ))
        .route("/metrics", get(ops::metrics))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .with_state(state)
}
