//! Processing result record and its two renderings.
//!
//! - `detailed`: JSON object with rounded timings and a percentage breakdown.
//! - `latency`: the total latency as a bare decimal string.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ImgProbeError, Result};

/// Result of one call into the image-processing collaborator.
///
/// Created per request and dropped once the response is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingReport {
    /// Wall time of the whole call, seconds.
    pub total_latency: f64,
    /// Time spent decoding the source image, seconds.
    pub load_time: f64,
    /// Time spent transforming and encoding derived images, seconds.
    pub processing_time: f64,
    /// Derived files written by the collaborator. Only the count is reported.
    pub generated_files: Vec<PathBuf>,
}

impl ProcessingReport {
    /// Reject timings that are negative, NaN or infinite.
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("total_latency", self.total_latency),
            ("load_time", self.load_time),
            ("processing_time", self.processing_time),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(ImgProbeError::Processing(format!(
                    "invalid {name} reported by processor: {v}"
                )));
            }
        }
        Ok(())
    }
}

/// Response contract for `GET /`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// JSON with percentage breakdown.
    #[default]
    Detailed,
    /// Plain-text latency.
    Latency,
}

impl ReportFormat {
    /// Config spelling, also used in startup logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ReportFormat::Detailed => "detailed",
            ReportFormat::Latency => "latency",
        }
    }
}

/// Share of the total latency spent in each phase, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    /// `load_time / total_latency * 100`, one decimal.
    pub load_percentage: f64,
    /// `processing_time / total_latency * 100`, one decimal.
    pub processing_percentage: f64,
}

/// JSON body of the detailed rendering. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedReport {
    /// Total latency, seconds, four decimals.
    pub total_time: f64,
    /// Decode time, seconds, four decimals.
    pub load_time: f64,
    /// Transform and encode time, seconds, four decimals.
    pub processing_time: f64,
    /// Number of derived files the processor wrote.
    pub files_generated: usize,
    pub breakdown: Breakdown,
}

impl DetailedReport {
    /// Validate and round a raw report.
    pub fn from_report(report: &ProcessingReport) -> Result<Self> {
        report.validate()?;
        Ok(Self {
            total_time: round_to(report.total_latency, 4),
            load_time: round_to(report.load_time, 4),
            processing_time: round_to(report.processing_time, 4),
            files_generated: report.generated_files.len(),
            breakdown: Breakdown {
                load_percentage: percentage(report.load_time, report.total_latency),
                processing_percentage: percentage(report.processing_time, report.total_latency),
            },
        })
    }

    /// Serialize in wire field order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ImgProbeError::Processing(format!("encode report failed: {e}")))
    }
}

/// Render the latency rendering body. Integral values keep a `.0` suffix.
pub fn latency_text(report: &ProcessingReport) -> Result<String> {
    report.validate()?;
    let v = report.total_latency;
    if v.fract() == 0.0 {
        Ok(format!("{v:.1}"))
    } else {
        Ok(v.to_string())
    }
}

/// `part / total * 100`, one decimal. A zero total yields 0.0.
pub fn percentage(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    round_to(part / total * 100.0, 1)
}

/// Round to `places` decimals, ties to even.
pub fn round_to(v: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (v * scale).round_ties_even() / scale
}
