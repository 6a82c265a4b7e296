//! Clients for the image and text analysis services.
//!
//! Both calls are wrapped by [`Analysis`]: a failed or timed-out call becomes
//! `Analysis::Fallback` carrying the reason, and scoring then uses the
//! type's explicit [`FallbackValue`].

use crate::error::DependencyError;
use crate::models::{ImageAnalysisResult, TextAnalysisResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::{future::Future, time::Instant};
use tracing::{debug, warn};

pub const IMAGE_SERVICE: &str = "image_analysis";
pub const TEXT_SERVICE: &str = "text_analysis";

#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze_image(&self, image_url: &str)
    -> Result<ImageAnalysisResult, DependencyError>;
}

#[async_trait]
pub trait TextAnalyzer: Send + Sync {
    async fn analyze_text(
        &self,
        title: &str,
        description: &str,
    ) -> Result<TextAnalysisResult, DependencyError>;
}

/// Value scored in place of an analysis that could not be obtained.
pub trait FallbackValue {
    fn fallback() -> Self;
}

impl FallbackValue for ImageAnalysisResult {
    fn fallback() -> Self {
        Self {
            blurriness_score: 0.0,
            is_stock_photo: 0.0,
        }
    }
}

impl FallbackValue for TextAnalysisResult {
    fn fallback() -> Self {
        Self {
            clarity_score: 0.0,
            flagged_phrases: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Analysis<T> {
    Scored(T),
    Fallback { reason: String },
}

impl<T: FallbackValue + Clone> Analysis<T> {
    pub fn value(&self) -> T {
        match self {
            Analysis::Scored(value) => value.clone(),
            Analysis::Fallback { .. } => T::fallback(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Analysis::Fallback { .. })
    }
}

/// Await one analysis call and fold its failure into `Analysis::Fallback`.
pub async fn with_fallback<T, Fut>(
    service: &'static str,
    product_id: &str,
    call: Fut,
) -> Analysis<T>
where
    Fut: Future<Output = Result<T, DependencyError>>,
{
    let started = Instant::now();
    let result = call.await;
    let elapsed_ms = started.elapsed().as_millis();
    crate::metrics::dependency_elapsed(service, result.is_ok(), elapsed_ms);
    match result {
        Ok(value) => {
            debug!(
                target = "listing_quality.analysis",
                service,
                product_id,
                elapsed_ms = elapsed_ms as u64,
                "analysis_ok",
            );
            Analysis::Scored(value)
        }
        Err(err) => {
            warn!(
                target = "listing_quality.analysis",
                service,
                product_id,
                error = %err,
                "analysis failed, scoring with fallback",
            );
            Analysis::Fallback {
                reason: err.to_string(),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    http: Client,
    image_url: String,
    text_url: String,
}

#[derive(Serialize)]
struct ImageAnalyzeRequest<'a> {
    image_url: &'a str,
}

#[derive(Serialize)]
struct TextAnalyzeRequest<'a> {
    title: &'a str,
    description: &'a str,
}

impl HttpAnalysisClient {
    pub fn new(http: Client, image_url: impl Into<String>, text_url: impl Into<String>) -> Self {
        Self {
            http,
            image_url: image_url.into(),
            text_url: text_url.into(),
        }
    }

    async fn post_json<B, T>(
        &self,
        service: &'static str,
        url: &str,
        body: &B,
    ) -> Result<T, DependencyError>
    where
        B: Serialize + ?Sized + Sync,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| DependencyError::from_reqwest(service, err))?;

        if !response.status().is_success() {
            return Err(DependencyError::Status {
                service,
                status: response.status().as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|err| DependencyError::from_reqwest(service, err))
    }
}

#[async_trait]
impl ImageAnalyzer for HttpAnalysisClient {
    async fn analyze_image(
        &self,
        image_url: &str,
    ) -> Result<ImageAnalysisResult, DependencyError> {
        self.post_json(IMAGE_SERVICE, &self.image_url, &ImageAnalyzeRequest { image_url })
            .await
    }
}

#[async_trait]
impl TextAnalyzer for HttpAnalysisClient {
    async fn analyze_text(
        &self,
        title: &str,
        description: &str,
    ) -> Result<TextAnalysisResult, DependencyError> {
        self.post_json(
            TEXT_SERVICE,
            &self.text_url,
            &TextAnalyzeRequest { title, description },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_analysis::{self, MockAnalysisState};
    use axum::{Router, http::StatusCode, routing::post};
    use std::{net::SocketAddr, time::Duration};

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn client(timeout: Duration) -> Client {
        Client::builder().no_proxy().timeout(timeout).build().unwrap()
    }

    #[tokio::test]
    async fn calls_both_mock_services() {
        let state = MockAnalysisState::seeded(7);
        let app = mock_analysis::image_router(state.clone()).merge(mock_analysis::text_router(state));
        let addr = serve(app).await;
        let analysis = HttpAnalysisClient::new(
            client(Duration::from_secs(5)),
            format!("http://{addr}/api/v1/image/analyze"),
            format!("http://{addr}/api/v1/text/analyze"),
        );

        let image = analysis
            .analyze_image("http://example.com/a.jpg")
            .await
            .expect("image analysis");
        assert!((0.0..1.0).contains(&image.blurriness_score));
        assert!((0.0..1.0).contains(&image.is_stock_photo));

        let text = analysis
            .analyze_text("Shirt", "100% original cotton, best quality guaranteed")
            .await
            .expect("text analysis");
        assert_eq!(text.flagged_phrases.len(), 2);
    }

    #[tokio::test]
    async fn non_success_status_is_a_dependency_error() {
        let app = Router::new().route(
            "/analyze",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let addr = serve(app).await;
        let url = format!("http://{addr}/analyze");
        let analysis = HttpAnalysisClient::new(client(Duration::from_secs(5)), &url, &url);

        let err = analysis.analyze_image("x").await.expect_err("503");
        assert!(matches!(
            err,
            DependencyError::Status {
                service: IMAGE_SERVICE,
                status: 503
            }
        ));
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let app = Router::new().route(
            "/analyze",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "{}"
            }),
        );
        let addr = serve(app).await;
        let url = format!("http://{addr}/analyze");
        let analysis = HttpAnalysisClient::new(client(Duration::from_millis(100)), &url, &url);

        let err = analysis.analyze_text("t", "d").await.expect_err("timeout");
        assert!(matches!(err, DependencyError::Timeout { service: TEXT_SERVICE }));
    }

    #[tokio::test]
    async fn unreachable_service_falls_back_to_zero_result() {
        let analysis = HttpAnalysisClient::new(
            client(Duration::from_secs(1)),
            "http://127.0.0.1:9/analyze",
            "http://127.0.0.1:9/analyze",
        );
        let outcome = with_fallback(IMAGE_SERVICE, "p-1", analysis.analyze_image("x")).await;
        assert!(outcome.is_fallback());
        assert_eq!(outcome.value(), ImageAnalysisResult::fallback());
    }

    #[tokio::test]
    async fn successful_call_is_scored() {
        let outcome = with_fallback(TEXT_SERVICE, "p-1", async {
            Ok(TextAnalysisResult {
                clarity_score: 0.9,
                flagged_phrases: vec!["x".into()],
            })
        })
        .await;
        assert!(!outcome.is_fallback());
        assert_eq!(outcome.value().clarity_score, 0.9);
    }
}
