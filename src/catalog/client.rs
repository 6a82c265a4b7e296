use crate::error::DependencyError;
use crate::models::{CatalogRecord, QualityAssessment};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use urlencoding::encode;

pub const CATALOG_SERVICE: &str = "catalog";

#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn put_quality(
        &self,
        product_id: &str,
        assessment: &QualityAssessment,
    ) -> Result<(), DependencyError>;

    /// `Ok(None)` when the catalog has no record for the product.
    async fn get_product(&self, product_id: &str)
    -> Result<Option<CatalogRecord>, DependencyError>;
}

/// Talks to a catalog exposing `{base}/{id}/quality` (PUT) and `{base}/{id}`
/// (GET), e.g. `http://localhost:3000/api/v1/products`.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    http: Client,
    base_url: String,
}

impl HttpCatalogClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn product_url(&self, product_id: &str) -> String {
        format!("{}/{}", self.base_url, encode(product_id))
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn put_quality(
        &self,
        product_id: &str,
        assessment: &QualityAssessment,
    ) -> Result<(), DependencyError> {
        let url = format!("{}/quality", self.product_url(product_id));
        let response = self
            .http
            .put(url)
            .json(assessment)
            .send()
            .await
            .map_err(|err| DependencyError::from_reqwest(CATALOG_SERVICE, err))?;

        if !response.status().is_success() {
            return Err(DependencyError::Status {
                service: CATALOG_SERVICE,
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    async fn get_product(
        &self,
        product_id: &str,
    ) -> Result<Option<CatalogRecord>, DependencyError> {
        let response = self
            .http
            .get(self.product_url(product_id))
            .send()
            .await
            .map_err(|err| DependencyError::from_reqwest(CATALOG_SERVICE, err))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json()
                .await
                .map(Some)
                .map_err(|err| DependencyError::from_reqwest(CATALOG_SERVICE, err)),
            status => Err(DependencyError::Status {
                service: CATALOG_SERVICE,
                status: status.as_u16(),
            }),
        }
    }
}
