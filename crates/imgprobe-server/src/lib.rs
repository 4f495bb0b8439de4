//! imgprobe server library entry.
//!
//! This crate wires config, the processing collaborator, the request handler
//! and the metrics registry into an axum service. It is consumed by the binary
//! (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod processing;
pub mod router;
pub mod transport;
