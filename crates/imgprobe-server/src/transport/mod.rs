//! Transport layer (HTTP).
//!
//! Exposes the request handler and the error-to-response mapping.

pub mod http;
