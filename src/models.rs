use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::{fmt, str::FromStr};

/// Body of a `listing_created` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingCreatedEvent {
    pub product_id: String,
    pub image_url: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysisResult {
    pub blurriness_score: f64,
    pub is_stock_photo: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnalysisResult {
    pub clarity_score: f64,
    #[serde(default)]
    pub flagged_phrases: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityStatus {
    Approved,
    NeedsImprovement,
    PendingReview,
    Rejected,
}

impl QualityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityStatus::Approved => "APPROVED",
            QualityStatus::NeedsImprovement => "NEEDS_IMPROVEMENT",
            QualityStatus::PendingReview => "PENDING_REVIEW",
            QualityStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for QualityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityStatus {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_uppercase().as_str() {
            "APPROVED" => Ok(QualityStatus::Approved),
            "NEEDS_IMPROVEMENT" => Ok(QualityStatus::NeedsImprovement),
            "PENDING_REVIEW" => Ok(QualityStatus::PendingReview),
            "REJECTED" => Ok(QualityStatus::Rejected),
            other => Err(format!("unknown quality status `{other}`")),
        }
    }
}

/// Score and status derived for one listing. Also the body of the catalog
/// `PUT .../quality` request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub quality_score: f64,
    pub quality_status: QualityStatus,
}

/// What the catalog keeps per product.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub quality_score: f64,
    pub quality_status: QualityStatus,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CatalogRecord {
    pub fn assessment(&self) -> QualityAssessment {
        QualityAssessment {
            quality_score: self.quality_score,
            quality_status: self.quality_status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityUpdated {
    pub message: String,
    pub product_id: String,
    #[serde(rename = "quality_score")]
    pub quality_score: f64,
    #[serde(rename = "quality_status")]
    pub quality_status: QualityStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}
