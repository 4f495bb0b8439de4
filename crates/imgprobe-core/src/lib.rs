//! imgprobe core: transport-agnostic error types and report rendering.
//!
//! This crate defines the processing result record and the two response
//! renderings shared by the server and its tests. It carries no transport or
//! runtime dependencies.
//!
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `ImgProbeError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod report;

/// Shared result type.
pub use error::{ClientCode, ImgProbeError, Result};
pub use report::{Breakdown, DetailedReport, ProcessingReport, ReportFormat};
