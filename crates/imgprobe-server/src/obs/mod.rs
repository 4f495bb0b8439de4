//! Lightweight in-process metrics.
//!
//! Metrics are stored as atomics in an explicit registry owned by `AppState`
//! and rendered by the `/metrics` handler. `track` is the middleware that
//! times requests on instrumented routes.

pub mod metrics;
pub mod track;
