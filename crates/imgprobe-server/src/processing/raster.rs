//! `image`-crate pipeline: decode once, then write one derived file per
//! transform variant into the output directory.
//!
//! Decoding and encoding are CPU bound, so the whole job runs on the blocking
//! pool.

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use image::imageops::FilterType;
use image::DynamicImage;

use imgprobe_core::error::{ImgProbeError, Result};
use imgprobe_core::ProcessingReport;

use crate::config::{Operation, PipelineSection};
use crate::processing::ImageProcessor;

#[derive(Debug, Clone)]
pub struct RasterPipeline {
    cfg: PipelineSection,
}

impl RasterPipeline {
    pub fn new(cfg: PipelineSection) -> Self {
        Self { cfg }
    }

    pub fn output_dir(&self) -> &Path {
        &self.cfg.output_dir
    }

    /// Synchronous body of [`ImageProcessor::process`].
    pub fn run(&self, file_name: &str, image_path: &Path) -> Result<ProcessingReport> {
        let started = Instant::now();

        let img = image::open(image_path).map_err(|e| {
            ImgProbeError::Processing(format!("decode {} failed: {e}", image_path.display()))
        })?;
        let load_time = started.elapsed();

        let mut generated = Vec::new();
        for op in &self.cfg.operations {
            for (tag, out) in self.apply(*op, &img) {
                let path = self.cfg.output_dir.join(format!("{tag}-{file_name}"));
                out.save(&path).map_err(|e| {
                    ImgProbeError::Processing(format!("write {} failed: {e}", path.display()))
                })?;
                generated.push(path);
            }
        }

        let total = started.elapsed();
        let total_latency = total.as_secs_f64();
        let load_time = load_time.as_secs_f64();

        tracing::debug!(
            file = %file_name,
            files = generated.len(),
            total_latency,
            load_time,
            "raster pipeline finished"
        );

        Ok(ProcessingReport {
            total_latency,
            load_time,
            processing_time: (total_latency - load_time).max(0.0),
            generated_files: generated,
        })
    }

    fn apply(&self, op: Operation, img: &DynamicImage) -> Vec<(&'static str, DynamicImage)> {
        match op {
            Operation::Flip => vec![
                ("flip-horizontal", img.fliph()),
                ("flip-vertical", img.flipv()),
            ],
            Operation::Rotate => vec![
                ("rotate-90", img.rotate90()),
                ("rotate-180", img.rotate180()),
                ("rotate-270", img.rotate270()),
            ],
            Operation::Blur => vec![("blur", img.blur(self.cfg.blur_sigma))],
            Operation::Grayscale => vec![("grayscale", img.grayscale())],
            Operation::Resize => vec![(
                "resize",
                img.resize(self.cfg.resize_width, self.cfg.resize_height, FilterType::Triangle),
            )],
        }
    }
}

#[async_trait]
impl ImageProcessor for RasterPipeline {
    fn name(&self) -> &'static str {
        "raster"
    }

    async fn process(&self, file_name: &str, image_path: &Path) -> Result<ProcessingReport> {
        let pipeline = self.clone();
        let file_name = file_name.to_string();
        let image_path: PathBuf = image_path.to_path_buf();

        tokio::task::spawn_blocking(move || pipeline.run(&file_name, &image_path))
            .await
            .map_err(|e| ImgProbeError::Processing(format!("processing task failed: {e}")))?
    }
}
