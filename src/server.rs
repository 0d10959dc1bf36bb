//! HTTP surface of the aggregated statistics.
pub mod error;
pub mod routes;

use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};
use tokio::{net::TcpListener, signal::ctrl_c};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use crate::record_sources::SourceContext;
use routes::{health_handler, hourly_handler, overview_handler};

pub fn router(ctx: SourceContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/analytics/overview", get(overview_handler))
        .route("/api/analytics/hourly", get(hourly_handler))
        .route("/api/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(ctx)
}

pub async fn start_server(ctx: SourceContext) -> anyhow::Result<()> {
    let address = format!("0.0.0.0:{}", ctx.config.port);
    let app = router(ctx);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("couldn't bind to {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Config;
    use super::routes::RECORD_SOURCE_HEADER;

    async fn get_json(uri: &str) -> anyhow::Result<(StatusCode, Option<String>, Value)> {
        let app = router(SourceContext::new(Config::default())?);

        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty())?)
            .await?;

        let status = response.status();
        let source = response
            .headers()
            .get(RECORD_SOURCE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = to_bytes(response.into_body(), usize::MAX).await?;

        Ok((status, source, serde_json::from_slice(&body)?))
    }

    #[tokio::test]
    async fn overview_from_sample_records() -> anyhow::Result<()> {
        let (status, source, body) = get_json("/api/analytics/overview?source=sample").await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(source.as_deref(), Some("sample"));
        for key in [
            "totalRidership",
            "averagePerRoute",
            "peakHour",
            "topRoute",
            "evasionRatePercent",
            "hourlyTrend",
            "paymentMethodBreakdown",
        ] {
            assert!(body.get(key).is_some(), "missing {key}");
        }
        assert_eq!(body["hourlyTrend"].as_array().map(Vec::len), Some(24));
        assert!(body["paymentMethodBreakdown"].get("NoFare").is_some());

        Ok(())
    }

    #[tokio::test]
    async fn hourly_rows_from_sample_records() -> anyhow::Result<()> {
        let (status, _, body) = get_json("/api/analytics/hourly?source=sample").await?;

        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().cloned().unwrap_or_default();
        assert_eq!(rows.len(), 24);
        assert_eq!(rows[0]["hour"], "0:00");
        assert!(rows[0].get("noFareRecorded").is_some());

        Ok(())
    }

    #[tokio::test]
    async fn unknown_source_is_a_bad_request() -> anyhow::Result<()> {
        let (status, source, body) = get_json("/api/analytics/overview?source=mongo").await?;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(source, None);
        assert_eq!(body["message"], "Invalid record source");

        Ok(())
    }

    #[tokio::test]
    async fn health() -> anyhow::Result<()> {
        let (status, _, body) = get_json("/api/health").await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        Ok(())
    }
}
