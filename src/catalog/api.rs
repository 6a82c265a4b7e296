use super::store::CatalogStore;
use crate::models::{ApiError, ApiMessage, QualityAssessment, QualityUpdated};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use std::sync::Arc;
use tracing::{error, info};

pub const CATALOG_PREFIX: &str = "/api/v1/products";

#[derive(Clone)]
struct CatalogState {
    store: Arc<dyn CatalogStore>,
}

/// Mock product catalog.
///
/// - `PUT /api/v1/products/{product_id}/quality` stores `{quality_score, quality_status}`
/// - `GET /api/v1/products/{product_id}` returns the stored record or 404
pub fn router(store: Arc<dyn CatalogStore>) -> Router {
    Router::new()
        .nest(
            CATALOG_PREFIX,
            Router::new()
                .route("/{product_id}", get(get_product))
                .route("/{product_id}/quality", put(update_quality)),
        )
        .with_state(CatalogState { store })
}

async fn update_quality(
    State(state): State<CatalogState>,
    Path(product_id): Path<String>,
    Json(update): Json<QualityAssessment>,
) -> Result<Json<QualityUpdated>, CatalogApiError> {
    crate::metrics::inc_requests("/api/v1/products/{product_id}/quality");
    let record = state.store.put(&product_id, update).await?;
    info!(
        target = "listing_quality.catalog",
        product_id = %product_id,
        quality_score = record.quality_score,
        quality_status = %record.quality_status,
        "product quality updated",
    );
    Ok(Json(QualityUpdated {
        message: "Product quality updated successfully".to_string(),
        product_id,
        quality_score: record.quality_score,
        quality_status: record.quality_status,
    }))
}

async fn get_product(
    State(state): State<CatalogState>,
    Path(product_id): Path<String>,
) -> Result<Response, CatalogApiError> {
    crate::metrics::inc_requests("/api/v1/products/{product_id}");
    match state.store.get(&product_id).await? {
        Some(record) => Ok(Json(record).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(ApiMessage {
                message: "Product not found".to_string(),
            }),
        )
            .into_response()),
    }
}

#[derive(Debug)]
struct CatalogApiError(crate::error::StoreError);

impl From<crate::error::StoreError> for CatalogApiError {
    fn from(value: crate::error::StoreError) -> Self {
        Self(value)
    }
}

impl IntoResponse for CatalogApiError {
    fn into_response(self) -> Response {
        error!(target = "listing_quality.catalog", error = %self.0, "catalog store failed");
        let payload = ApiError {
            error: "catalog_store".to_string(),
            detail: Some(self.0.to_string()),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
    }
}
