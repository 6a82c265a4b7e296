use crate::error::StoreError;
use crate::models::{CatalogRecord, QualityAssessment, QualityStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Keyed quality records. `put` overwrites whatever was stored for the
/// product (last write wins).
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get(&self, product_id: &str) -> Result<Option<CatalogRecord>, StoreError>;

    async fn put(
        &self,
        product_id: &str,
        assessment: QualityAssessment,
    ) -> Result<CatalogRecord, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    records: Mutex<HashMap<String, CatalogRecord>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn get(&self, product_id: &str) -> Result<Option<CatalogRecord>, StoreError> {
        Ok(self.records.lock().await.get(product_id).cloned())
    }

    async fn put(
        &self,
        product_id: &str,
        assessment: QualityAssessment,
    ) -> Result<CatalogRecord, StoreError> {
        let record = new_record(assessment);
        self.records
            .lock()
            .await
            .insert(product_id.to_string(), record.clone());
        Ok(record)
    }
}

/// One Redis hash per product under `{prefix}{product_id}`.
#[derive(Debug, Clone)]
pub struct RedisCatalogStore {
    client: redis::Client,
    prefix: String,
}

const FIELD_SCORE: &str = "quality_score";
const FIELD_STATUS: &str = "quality_status";
const FIELD_UPDATED_AT: &str = "updated_at";

impl RedisCatalogStore {
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            prefix: "catalog:product:".to_string(),
        })
    }

    fn key(&self, product_id: &str) -> String {
        format!("{}{}", self.prefix, product_id)
    }
}

#[async_trait]
impl CatalogStore for RedisCatalogStore {
    async fn get(&self, product_id: &str) -> Result<Option<CatalogRecord>, StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let fields: HashMap<String, String> = conn.hgetall(self.key(product_id)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        decode_record(product_id, &fields).map(Some)
    }

    async fn put(
        &self,
        product_id: &str,
        assessment: QualityAssessment,
    ) -> Result<CatalogRecord, StoreError> {
        let record = new_record(assessment);
        let mut fields = vec![
            (FIELD_SCORE, record.quality_score.to_string()),
            (FIELD_STATUS, record.quality_status.as_str().to_string()),
        ];
        if let Some(updated_at) = record.updated_at {
            fields.push((FIELD_UPDATED_AT, updated_at.to_rfc3339()));
        }
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.hset_multiple(self.key(product_id), &fields[..]).await?;
        Ok(record)
    }
}

fn new_record(assessment: QualityAssessment) -> CatalogRecord {
    CatalogRecord {
        quality_score: assessment.quality_score,
        quality_status: assessment.quality_status,
        updated_at: Some(Utc::now()),
    }
}

fn decode_record(
    product_id: &str,
    fields: &HashMap<String, String>,
) -> Result<CatalogRecord, StoreError> {
    let corrupt = |detail: String| StoreError::Corrupt {
        product_id: product_id.to_string(),
        detail,
    };
    let quality_score = fields
        .get(FIELD_SCORE)
        .ok_or_else(|| corrupt(format!("missing {FIELD_SCORE}")))?
        .parse::<f64>()
        .map_err(|err| corrupt(err.to_string()))?;
    let quality_status = fields
        .get(FIELD_STATUS)
        .ok_or_else(|| corrupt(format!("missing {FIELD_STATUS}")))?
        .parse::<QualityStatus>()
        .map_err(corrupt)?;
    let updated_at = fields
        .get(FIELD_UPDATED_AT)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&Utc));
    Ok(CatalogRecord {
        quality_score,
        quality_status,
        updated_at,
    })
}
