//! HTTP API for promptward.
//!
//! Exposes the health check and the v1 API: prompt builds, gated model
//! invocation, report lookup and the compliance report.
//!
//! Built on Axum. Every route shares one [`Runtime`].

pub mod api_v1;
pub mod runtime;

pub use runtime::{Runtime, RuntimeError, call_site_registry, policy_table, rogue_scan_at};

use axum::extract::DefaultBodyLimit;
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Request bodies are contexts; 1 MB leaves room for workspace files.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the full router: `/health` plus the v1 API under `/v1`.
pub fn build_router(runtime: Arc<Runtime>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router(runtime))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
}

/// Start the HTTP server on the configured host and port.
pub async fn start(runtime: Arc<Runtime>) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", runtime.config().server.host, runtime.config().server.port);
    let app = build_router(runtime);

    info!(addr = %addr, "Server starting with v1 API");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use promptward_config::AppConfig;
    use promptward_store::InMemoryReportStore;
    use tower::ServiceExt;

    fn test_runtime() -> Arc<Runtime> {
        let config = AppConfig::default();
        let provider = promptward_providers::build_from_config(&config)
            .default_provider()
            .unwrap();
        Arc::new(Runtime::new(config, Arc::new(InMemoryReportStore::new()), provider).unwrap())
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_runtime());

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = build_router(test_runtime());
        let req = Request::builder()
            .method("POST")
            .uri("/v1/prompts")
            .header("content-type", "application/json")
            .body(Body::from(vec![b' '; MAX_BODY_BYTES + 1]))
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
