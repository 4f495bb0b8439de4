use std::path::PathBuf;

use serde::Deserialize;

use imgprobe_core::error::{ImgProbeError, Result};
use imgprobe_core::ReportFormat;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImgProbeConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub pipeline: PipelineSection,
}

impl ImgProbeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ImgProbeError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.pipeline.validate()?;

        Ok(())
    }
}

impl Default for ImgProbeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            pipeline: PipelineSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_image_path")]
    pub default_image_path: String,

    #[serde(default)]
    pub report: ReportFormat,

    /// Upper bound for one processing call. `None` waits indefinitely.
    #[serde(default)]
    pub processing_timeout_ms: Option<u64>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            default_image_path: default_image_path(),
            report: ReportFormat::default(),
            processing_timeout_ms: None,
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if let Some(ms) = self.processing_timeout_ms {
            if !(1..=600_000).contains(&ms) {
                return Err(ImgProbeError::BadRequest(
                    "server.processing_timeout_ms must be between 1 and 600000".into(),
                ));
            }
        }
        if self.default_image_path.is_empty() {
            return Err(ImgProbeError::BadRequest(
                "server.default_image_path must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_image_path() -> String {
    "/app/images/sample.jpg".into()
}

/// Transform applied by the built-in pipeline. Each one writes one or more files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Flip,
    Rotate,
    Blur,
    Grayscale,
    Resize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSection {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_operations")]
    pub operations: Vec<Operation>,

    #[serde(default = "default_blur_sigma")]
    pub blur_sigma: f32,

    #[serde(default = "default_resize_edge")]
    pub resize_width: u32,

    #[serde(default = "default_resize_edge")]
    pub resize_height: u32,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            operations: default_operations(),
            blur_sigma: default_blur_sigma(),
            resize_width: default_resize_edge(),
            resize_height: default_resize_edge(),
        }
    }
}

impl PipelineSection {
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(ImgProbeError::BadRequest(
                "pipeline.output_dir must not be empty".into(),
            ));
        }
        if !(self.blur_sigma.is_finite() && self.blur_sigma > 0.0) {
            return Err(ImgProbeError::BadRequest(
                "pipeline.blur_sigma must be a positive number".into(),
            ));
        }
        if self.resize_width == 0 || self.resize_height == 0 {
            return Err(ImgProbeError::BadRequest(
                "pipeline.resize_width and resize_height must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("/tmp")
}
fn default_operations() -> Vec<Operation> {
    vec![
        Operation::Flip,
        Operation::Rotate,
        Operation::Blur,
        Operation::Grayscale,
        Operation::Resize,
    ]
}
fn default_blur_sigma() -> f32 {
    1.5
}
fn default_resize_edge() -> u32 {
    128
}
