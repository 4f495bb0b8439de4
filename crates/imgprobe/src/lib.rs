//! Top-level facade crate for imgprobe.
//!
//! Re-exports core types and the server library so users can depend on a single crate.

pub mod core {
    pub use imgprobe_core::*;
}

pub mod server {
    pub use imgprobe_server::*;
}
