use crate::catalog::{self, CatalogStore};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::header,
    response::IntoResponse,
    routing::get,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

const OPENAPI_YAML: &str = include_str!("../docs/openapi.yaml");

#[derive(Clone)]
pub struct AppState {
    pub openapi: Arc<serde_json::Value>,
    pub prometheus_handle: PrometheusHandle,
}

impl AppState {
    pub fn new(prometheus_handle: PrometheusHandle) -> Self {
        let openapi = serde_yaml::from_str(OPENAPI_YAML)
            .unwrap_or_else(|_| json!({"openapi": "3.0.3"}));
        Self {
            openapi: Arc::new(openapi),
            prometheus_handle,
        }
    }
}

/// HTTP surface of the `listing-quality` service: the mock catalog plus
/// health, metrics and the OpenAPI document.
pub fn router(state: AppState, store: Arc<dyn CatalogStore>, body_limit: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_headers(Any)
        .allow_methods(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/openapi.json", get(openapi_json))
        .with_state(state)
        .merge(catalog::router(store))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
}

/// Health and readiness check.
///
/// - Method: `GET`
/// - Path: `/health`
///
/// Returns a small JSON payload with `status` and `service`.
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "listing-quality",
    }))
}

async fn openapi_json(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json((*state.openapi).clone())
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.prometheus_handle.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalogStore;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    fn app() -> Router {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        router(
            AppState::new(handle),
            Arc::new(MemoryCatalogStore::new()),
            64 * 1024,
        )
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn openapi_document_lists_catalog_paths() {
        let (status, body) = get_json("/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/v1/products/{productId}"].is_object());
        assert!(body["paths"]["/api/v1/products/{productId}/quality"].is_object());
    }

    #[tokio::test]
    async fn catalog_routes_are_mounted() {
        let (status, body) = get_json("/api/v1/products/unknown").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Product not found");
    }

    #[tokio::test]
    async fn metrics_render_as_text() {
        let response = app()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn oversized_body_is_refused() {
        let body = format!(
            r#"{{"quality_score": 0.5, "quality_status": "APPROVED", "pad": "{}"}}"#,
            "x".repeat(128 * 1024)
        );
        let response = app()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/v1/products/p/quality")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
