//! imgprobe server
//!
//! - `GET /?image_path=...` : run the processing pipeline, report timings
//! - `GET /metrics`         : Prometheus text exposition
//! - `GET /healthz`, `GET /readyz`

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use imgprobe_core::error::{ImgProbeError, Result};
use imgprobe_server::{app_state, config, router};

const CONFIG_ENV: &str = "IMGPROBE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "imgprobe.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::load_or_default(&path)?;
    let listen: SocketAddr = cfg.server.listen.parse().map_err(|e| {
        ImgProbeError::BadRequest(format!("server.listen must be a valid SocketAddr: {e}"))
    })?;

    let state = app_state::AppState::new(cfg);
    let app = router::build_router(state.clone());

    tracing::info!(
        %listen,
        report = state.cfg().server.report.as_str(),
        processor = state.processor().name(),
        default_image_path = %state.cfg().server.default_image_path,
        "imgprobe-server starting"
    );
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| ImgProbeError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            state.metrics().set_draining();
            tracing::info!("draining in-flight requests");
        })
        .await
        .map_err(|e| ImgProbeError::Internal(format!("server failed: {e}")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    ctrl_c.await;

    tracing::info!("shutdown signal received");
}
