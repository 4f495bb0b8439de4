//! HTTP contract of `GET /` and the operational endpoints, driven through the
//! router with a stub processor.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use imgprobe_core::error::{ImgProbeError, Result};
use imgprobe_core::{ProcessingReport, ReportFormat};
use imgprobe_server::app_state::AppState;
use imgprobe_server::config::ImgProbeConfig;
use imgprobe_server::processing::ImageProcessor;
use imgprobe_server::router::build_router;

enum Behavior {
    Report(f64, f64, f64, usize),
    Fail(&'static str),
    Stall(Duration),
}

struct StubProcessor {
    behavior: Behavior,
    calls: Mutex<Vec<(String, PathBuf)>>,
}

impl StubProcessor {
    fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self { behavior, calls: Mutex::new(Vec::new()) })
    }

    fn calls(&self) -> Vec<(String, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageProcessor for StubProcessor {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn process(&self, file_name: &str, image_path: &Path) -> Result<ProcessingReport> {
        self.calls
            .lock()
            .unwrap()
            .push((file_name.to_string(), image_path.to_path_buf()));
        match &self.behavior {
            Behavior::Report(total, load, processing, files) => Ok(ProcessingReport {
                total_latency: *total,
                load_time: *load,
                processing_time: *processing,
                generated_files: (0..*files).map(|i| PathBuf::from(format!("/tmp/{i}"))).collect(),
            }),
            Behavior::Fail(msg) => Err(ImgProbeError::Processing((*msg).to_string())),
            Behavior::Stall(d) => {
                tokio::time::sleep(*d).await;
                Err(ImgProbeError::Processing("stalled".into()))
            }
        }
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    image: PathBuf,
    state: AppState,
    stub: Arc<StubProcessor>,
}

impl Fixture {
    fn new(behavior: Behavior, edit: impl FnOnce(&mut ImgProbeConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("sample.jpg");
        std::fs::write(&image, b"not really a jpeg").unwrap();

        let mut cfg = ImgProbeConfig::default();
        edit(&mut cfg);
        let stub = StubProcessor::new(behavior);
        let state = AppState::with_processor(cfg, stub.clone());
        Self { _dir: dir, image, state, stub }
    }

    fn app(&self) -> Router {
        build_router(self.state.clone())
    }

    fn image_uri(&self) -> String {
        format!("/?image_path={}", self.image.display())
    }
}

async fn get(app: Router, uri: &str) -> (StatusCode, String, String) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn detailed_report_json() {
    let fx = Fixture::new(Behavior::Report(0.5, 0.1, 0.4, 3), |_| {});
    let (status, ct, body) = get(fx.app(), &fx.image_uri()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ct, "application/json");
    assert_eq!(
        body,
        r#"{"total_time":0.5,"load_time":0.1,"processing_time":0.4,"files_generated":3,"breakdown":{"load_percentage":20.0,"processing_percentage":80.0}}"#
    );

    let calls = fx.stub.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "sample.jpg");
    assert_eq!(calls[0].1, fx.image);
    assert_eq!(fx.state.metrics().files_generated.get(&[]), 3);
}

#[tokio::test]
async fn missing_image_is_404() {
    let fx = Fixture::new(Behavior::Report(0.5, 0.1, 0.4, 3), |_| {});
    let (status, ct, body) = get(fx.app(), "/?image_path=/nope.jpg").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(ct.starts_with("text/plain"));
    assert_eq!(body, "Error: Image not found at /nope.jpg");
    assert!(fx.stub.calls().is_empty());
    assert_eq!(fx.state.metrics().failures.get(&[("kind", "not_found")]), 1);
}

#[tokio::test]
async fn repeated_image_path_uses_first_value() {
    let fx = Fixture::new(Behavior::Report(0.5, 0.1, 0.4, 3), |_| {});

    let uri = format!("/?image_path=/nope.jpg&image_path={}", fx.image.display());
    let (status, _, body) = get(fx.app(), &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Error: Image not found at /nope.jpg");

    let uri = format!("{}&image_path=/nope.jpg", fx.image_uri());
    let (status, _, _) = get(fx.app(), &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fx.stub.calls().len(), 1);
}

#[tokio::test]
async fn directory_and_empty_path_are_404() {
    let fx = Fixture::new(Behavior::Report(0.5, 0.1, 0.4, 3), |_| {});
    let dir = fx.image.parent().unwrap().display().to_string();

    let (status, _, body) = get(fx.app(), &format!("/?image_path={dir}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, format!("Error: Image not found at {dir}"));

    let (status, _, body) = get(fx.app(), "/?image_path=").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Error: Image not found at ");
    assert!(fx.stub.calls().is_empty());
}

#[tokio::test]
async fn absent_query_uses_default_path() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("default.png");
    std::fs::write(&image, b"x").unwrap();
    let default = image.display().to_string();

    let fx = Fixture::new(Behavior::Report(1.0, 0.25, 0.75, 0), |cfg| {
        cfg.server.default_image_path = default.clone();
    });
    let (status, _, body) = get(fx.app(), "/").await;

    assert_eq!(status, StatusCode::OK);
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["files_generated"], 0);
    assert_eq!(v["breakdown"]["load_percentage"], 25.0);
    assert_eq!(fx.stub.calls()[0].0, "default.png");
}

#[tokio::test]
async fn latency_report_is_plain_text() {
    let fx = Fixture::new(Behavior::Report(0.237, 0.037, 0.2, 1), |cfg| {
        cfg.server.report = ReportFormat::Latency;
    });
    let (status, ct, body) = get(fx.app(), &fx.image_uri()).await;

    assert_eq!(status, StatusCode::OK);
    assert!(ct.starts_with("text/plain"));
    assert_eq!(body, "0.237");
}

#[tokio::test]
async fn processor_error_is_500() {
    let fx = Fixture::new(Behavior::Fail("unsupported image format"), |_| {});
    let (status, ct, body) = get(fx.app(), &fx.image_uri()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(ct.starts_with("text/plain"));
    assert!(body.starts_with("Error processing image:"));
    assert!(body.contains("unsupported image format"));
    assert_eq!(fx.state.metrics().failures.get(&[("kind", "processing")]), 1);
}

#[tokio::test]
async fn invalid_timing_is_500() {
    let fx = Fixture::new(Behavior::Report(-0.1, 0.0, 0.0, 0), |_| {});
    let (status, _, body) = get(fx.app(), &fx.image_uri()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Error processing image:"));
}

#[tokio::test]
async fn zero_total_latency_is_well_defined() {
    let fx = Fixture::new(Behavior::Report(0.0, 0.0, 0.0, 2), |_| {});
    let (status, _, body) = get(fx.app(), &fx.image_uri()).await;

    assert_eq!(status, StatusCode::OK);
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["breakdown"]["load_percentage"], 0.0);
    assert_eq!(v["breakdown"]["processing_percentage"], 0.0);
    assert_eq!(v["files_generated"], 2);
}

#[tokio::test]
async fn repeated_requests_have_same_shape() {
    let fx = Fixture::new(Behavior::Report(0.3, 0.1, 0.2, 4), |_| {});
    let (s1, _, b1) = get(fx.app(), &fx.image_uri()).await;
    let (s2, _, b2) = get(fx.app(), &fx.image_uri()).await;

    assert_eq!((s1, s2), (StatusCode::OK, StatusCode::OK));
    let keys = |b: &str| {
        let v: serde_json::Value = serde_json::from_str(b).unwrap();
        let mut k: Vec<String> = v.as_object().unwrap().keys().cloned().collect();
        k.sort();
        k
    };
    assert_eq!(keys(&b1), keys(&b2));
    assert_eq!(fx.stub.calls().len(), 2);
}

#[tokio::test]
async fn slow_processor_times_out() {
    let fx = Fixture::new(Behavior::Stall(Duration::from_secs(5)), |cfg| {
        cfg.server.processing_timeout_ms = Some(50);
    });
    let (status, _, body) = get(fx.app(), &fx.image_uri()).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body, "Error processing image: timed out after 50 ms");
    assert_eq!(fx.state.metrics().failures.get(&[("kind", "timeout")]), 1);
}

#[tokio::test]
async fn metrics_track_root_but_not_themselves() {
    let fx = Fixture::new(Behavior::Report(0.5, 0.1, 0.4, 3), |_| {});
    get(fx.app(), &fx.image_uri()).await;
    get(fx.app(), "/?image_path=/nope.jpg").await;
    get(fx.app(), "/metrics").await;

    let (status, ct, body) = get(fx.app(), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ct, "text/plain; version=0.0.4; charset=utf-8");
    assert!(body.contains("# TYPE image_processing_duration_seconds histogram"));
    assert!(body.contains(r#"image_processing_duration_seconds_count{method="GET",status="200"} 1"#));
    assert!(body.contains(r#"image_processing_duration_seconds_count{method="GET",status="404"} 1"#));
    assert!(body.contains(r#"imgprobe_requests_total{status="200"} 1"#));

    let m = fx.state.metrics();
    assert_eq!(m.requests.get(&[("status", "200")]), 1);
    assert_eq!(m.requests.get(&[("status", "404")]), 1);
}

#[tokio::test]
async fn health_and_readiness() {
    let fx = Fixture::new(Behavior::Report(0.5, 0.1, 0.4, 3), |_| {});

    let (status, _, body) = get(fx.app(), "/healthz").await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "ok"));

    let (status, _, body) = get(fx.app(), "/readyz").await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "ready"));

    fx.state.metrics().set_draining();
    let (status, _, body) = get(fx.app(), "/readyz").await;
    assert_eq!((status, body.as_str()), (StatusCode::SERVICE_UNAVAILABLE, "draining"));
    assert!(!fx.state.metrics().render().contains(r#"status="503""#));
}
