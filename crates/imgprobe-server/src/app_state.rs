//! Shared application state for the imgprobe server.
//!
//! Holds immutable config, the processing collaborator and the metrics
//! registry. Cloning is cheap (`Arc`s only).

use std::sync::Arc;

use crate::config::ImgProbeConfig;
use crate::obs::metrics::ServerMetrics;
use crate::processing::{ImageProcessor, RasterPipeline};

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<ImgProbeConfig>,
    processor: Arc<dyn ImageProcessor>,
    metrics: Arc<ServerMetrics>,
}

impl AppState {
    /// Build state with the built-in raster pipeline.
    pub fn new(cfg: ImgProbeConfig) -> Self {
        let pipeline = RasterPipeline::new(cfg.pipeline.clone());
        Self::with_processor(cfg, Arc::new(pipeline))
    }

    /// Build state around an arbitrary processor.
    pub fn with_processor(cfg: ImgProbeConfig, processor: Arc<dyn ImageProcessor>) -> Self {
        Self {
            cfg: Arc::new(cfg),
            processor,
            metrics: Arc::new(ServerMetrics::default()),
        }
    }

    pub fn cfg(&self) -> &ImgProbeConfig {
        &self.cfg
    }

    pub fn processor(&self) -> Arc<dyn ImageProcessor> {
        Arc::clone(&self.processor)
    }

    pub fn metrics(&self) -> Arc<ServerMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn is_draining(&self) -> bool {
        self.metrics.is_draining()
    }
}
