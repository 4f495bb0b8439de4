//! Image-processing collaborator seam.
//!
//! The request handler only knows [`ImageProcessor`]. [`RasterPipeline`] is the
//! built-in implementation; tests plug in stubs.

pub mod raster;

use std::path::Path;

use async_trait::async_trait;

use imgprobe_core::{ProcessingReport, Result};

pub use raster::RasterPipeline;

/// Processes one image and reports how long it took.
#[async_trait]
pub trait ImageProcessor: Send + Sync {
    fn name(&self) -> &'static str;
    async fn process(&self, file_name: &str, image_path: &Path) -> Result<ProcessingReport>;
}
