//! Server config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use imgprobe_core::error::{ImgProbeError, Result};

pub use schema::{ImgProbeConfig, Operation, PipelineSection, ServerSection};

pub fn load_from_file(path: &str) -> Result<ImgProbeConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ImgProbeError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

/// Like [`load_from_file`], but a missing file yields the built-in defaults.
pub fn load_or_default(path: &str) -> Result<ImgProbeConfig> {
    match fs::read_to_string(path) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(%path, "config file not found, using defaults");
            Ok(ImgProbeConfig::default())
        }
        Err(e) => Err(ImgProbeError::Internal(format!("read config failed: {e}"))),
    }
}

pub fn load_from_str(s: &str) -> Result<ImgProbeConfig> {
    let cfg: ImgProbeConfig = serde_yaml::from_str(s)
        .map_err(|e| ImgProbeError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
