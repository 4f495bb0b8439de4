//! `GET /` request handler.
//!
//! Flow: resolve `image_path` -> stat -> basename -> delegate to the
//! processor -> render. The response is built in full before it is returned.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use imgprobe_core::error::{ImgProbeError, Result};
use imgprobe_core::report::{latency_text, DetailedReport};
use imgprobe_core::{ProcessingReport, ReportFormat};

use crate::app_state::AppState;

/// Query parameters of `GET /`.
///
/// Extracted from raw key/value pairs so a repeated key never rejects the
/// request; the first occurrence wins.
#[derive(Debug, Default)]
pub struct ProcessQuery {
    pub image_path: Option<String>,
}

impl ProcessQuery {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let image_path = pairs
            .into_iter()
            .find(|(k, _)| k == "image_path")
            .map(|(_, v)| v);
        Self { image_path }
    }
}

/// Maps an `ImgProbeError` to a plain-text HTTP response.
#[derive(Debug)]
pub struct ApiError(pub ImgProbeError);

impl From<ImgProbeError> for ApiError {
    fn from(e: ImgProbeError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.client_code().http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, self.0.client_message()).into_response()
    }
}

pub async fn process_image(
    State(app): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let image_path = ProcessQuery::from_pairs(pairs)
        .image_path
        .unwrap_or_else(|| app.cfg().server.default_image_path.clone());

    match handle(&app, &image_path).await {
        Ok(resp) => resp,
        Err(err) => {
            let kind = match &err {
                ImgProbeError::NotFound(_) => {
                    tracing::warn!(%image_path, "image not found");
                    "not_found"
                }
                ImgProbeError::Timeout(_) => {
                    tracing::error!(%image_path, "{}", err.client_message());
                    "timeout"
                }
                _ => {
                    tracing::error!(%image_path, "{}", err.client_message());
                    "processing"
                }
            };
            app.metrics().failures.inc(&[("kind", kind)]);
            ApiError(err).into_response()
        }
    }
}

async fn handle(app: &AppState, image_path: &str) -> Result<Response> {
    ensure_file(image_path).await?;
    let file_name = file_name_of(image_path)?;

    let report = delegate(app, &file_name, Path::new(image_path)).await?;
    app.metrics()
        .files_generated
        .add(&[], report.generated_files.len() as u64);

    render(app.cfg().server.report, &report)
}

/// Only an existing regular file passes. Directories and the empty path are
/// reported as not found.
async fn ensure_file(image_path: &str) -> Result<()> {
    match tokio::fs::metadata(image_path).await {
        Ok(m) if m.is_file() => Ok(()),
        Ok(_) => Err(ImgProbeError::NotFound(image_path.to_string())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(ImgProbeError::NotFound(image_path.to_string()))
        }
        Err(e) => Err(ImgProbeError::Processing(format!(
            "stat {image_path} failed: {e}"
        ))),
    }
}

fn file_name_of(image_path: &str) -> Result<String> {
    Path::new(image_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ImgProbeError::Processing(format!("cannot derive file name from {image_path}"))
        })
}

async fn delegate(app: &AppState, file_name: &str, image_path: &Path) -> Result<ProcessingReport> {
    let processor = app.processor();
    match app.cfg().server.processing_timeout_ms {
        Some(ms) => tokio::time::timeout(
            Duration::from_millis(ms),
            processor.process(file_name, image_path),
        )
        .await
        .map_err(|_| ImgProbeError::Timeout(ms))?,
        None => processor.process(file_name, image_path).await,
    }
}

fn render(format: ReportFormat, report: &ProcessingReport) -> Result<Response> {
    match format {
        ReportFormat::Detailed => {
            let body = DetailedReport::from_report(report)?.to_json()?;
            Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response())
        }
        ReportFormat::Latency => {
            let body = latency_text(report)?;
            Ok((StatusCode::OK, body).into_response())
        }
    }
}
