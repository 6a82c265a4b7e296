//! Stand-in image and text analysis services for local runs.
//!
//! Scores are random; the text service also flags a couple of marketing
//! claims so the review path of the pipeline can be exercised.

use crate::models::{ApiError, ImageAnalysisResult, TextAnalysisResult};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;

const FLAGGED_CLAIMS: &[&str] = &["100% original", "best quality guaranteed"];

#[derive(Clone)]
pub struct MockAnalysisState {
    rng: Arc<Mutex<SmallRng>>,
}

impl MockAnalysisState {
    pub fn from_os_rng() -> Self {
        Self::with_rng(SmallRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Self {
        Self {
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    async fn unit_scores<const N: usize>(&self) -> [f64; N] {
        let mut rng = self.rng.lock().await;
        std::array::from_fn(|_| rng.random::<f64>())
    }
}

pub fn image_router(state: MockAnalysisState) -> Router {
    Router::new()
        .route("/api/v1/image/analyze", post(analyze_image))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub fn text_router(state: MockAnalysisState) -> Router {
    Router::new()
        .route("/api/v1/text/analyze", post(analyze_text))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Deserialize)]
struct ImageAnalyzeRequest {
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextAnalyzeRequest {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

async fn analyze_image(
    State(state): State<MockAnalysisState>,
    body: Result<Json<ImageAnalyzeRequest>, JsonRejection>,
) -> Response {
    const REQUIRED: &str = "image_url is required";
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return rejected(REQUIRED, rejection),
    };
    let Some(image_url) = req.image_url else {
        return bad_request(REQUIRED, None);
    };
    info!(target = "listing_quality.mock_analysis", %image_url, "analyzing image");
    let [blurriness_score, is_stock_photo] = state.unit_scores::<2>().await;
    Json(ImageAnalysisResult {
        blurriness_score,
        is_stock_photo,
    })
    .into_response()
}

async fn analyze_text(
    State(state): State<MockAnalysisState>,
    body: Result<Json<TextAnalyzeRequest>, JsonRejection>,
) -> Response {
    const REQUIRED: &str = "title and description are required";
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return rejected(REQUIRED, rejection),
    };
    let (Some(title), Some(description)) = (req.title, req.description) else {
        return bad_request(REQUIRED, None);
    };
    info!(target = "listing_quality.mock_analysis", %title, "analyzing text");
    let [clarity_score] = state.unit_scores::<1>().await;
    Json(TextAnalysisResult {
        clarity_score,
        flagged_phrases: detect_flagged_phrases(&description),
    })
    .into_response()
}

pub fn detect_flagged_phrases(description: &str) -> Vec<String> {
    let lowered = description.to_lowercase();
    FLAGGED_CLAIMS
        .iter()
        .filter(|claim| lowered.contains(*claim))
        .map(|claim| format!("'{claim}' claim detected"))
        .collect()
}

/// Unreadable bodies get the same 400 shape as missing fields.
fn rejected(message: &str, rejection: JsonRejection) -> Response {
    bad_request(message, Some(rejection.body_text()))
}

fn bad_request(message: &str, detail: Option<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: message.to_string(),
            detail,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use tower::ServiceExt;

    async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn flags_claims_case_insensitively() {
        let flagged = detect_flagged_phrases(
            "This is 100% ORIGINAL cotton. Best Quality Guaranteed!",
        );
        assert_eq!(
            flagged,
            vec![
                "'100% original' claim detected".to_string(),
                "'best quality guaranteed' claim detected".to_string(),
            ]
        );
        assert!(detect_flagged_phrases("These are old jeans.").is_empty());
    }

    #[tokio::test]
    async fn image_scores_are_in_unit_range() {
        let app = image_router(MockAnalysisState::seeded(1));
        let (status, body) = post_json(
            app,
            "/api/v1/image/analyze",
            serde_json::json!({"image_url": "http://example.com/a.jpg"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let result: ImageAnalysisResult = serde_json::from_value(body).unwrap();
        assert!((0.0..1.0).contains(&result.blurriness_score));
        assert!((0.0..1.0).contains(&result.is_stock_photo));
    }

    #[tokio::test]
    async fn same_seed_gives_same_scores() {
        let body = serde_json::json!({"image_url": "http://example.com/a.jpg"});
        let (_, first) = post_json(
            image_router(MockAnalysisState::seeded(99)),
            "/api/v1/image/analyze",
            body.clone(),
        )
        .await;
        let (_, second) = post_json(
            image_router(MockAnalysisState::seeded(99)),
            "/api/v1/image/analyze",
            body,
        )
        .await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_image_url_is_rejected() {
        let app = image_router(MockAnalysisState::seeded(1));
        let (status, body) = post_json(app, "/api/v1/image/analyze", serde_json::json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "image_url is required");
    }

    #[tokio::test]
    async fn text_requires_title_and_description() {
        let app = text_router(MockAnalysisState::seeded(1));
        let (status, body) = post_json(
            app,
            "/api/v1/text/analyze",
            serde_json::json!({"title": "only a title"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "title and description are required");
    }

    #[tokio::test]
    async fn unreadable_bodies_get_json_bad_request() {
        let not_json = Request::builder()
            .method("POST")
            .uri("/api/v1/image/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let no_content_type = Request::builder()
            .method("POST")
            .uri("/api/v1/text/analyze")
            .body(Body::from(r#"{"title":"t","description":"d"}"#))
            .unwrap();

        let cases = [
            (
                image_router(MockAnalysisState::seeded(1)),
                not_json,
                "image_url is required",
            ),
            (
                text_router(MockAnalysisState::seeded(1)),
                no_content_type,
                "title and description are required",
            ),
        ];
        for (app, request, expected) in cases {
            let response = app.oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body["error"], expected);
        }
    }

    #[tokio::test]
    async fn text_flags_marketing_claims() {
        let app = text_router(MockAnalysisState::seeded(3));
        let (status, body) = post_json(
            app,
            "/api/v1/text/analyze",
            serde_json::json!({
                "title": "Amazing New T-Shirt",
                "description": "Made from 100% original cotton. Best quality guaranteed!"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let result: TextAnalysisResult = serde_json::from_value(body).unwrap();
        assert!((0.0..1.0).contains(&result.clarity_score));
        assert_eq!(result.flagged_phrases.len(), 2);
    }
}
