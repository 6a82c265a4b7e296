//! Listing quality score and status.
//!
//! The score is a weighted blend of the image and text analyses normalised
//! into `[0, 1]`. The status starts at `APPROVED`, is raised to
//! `PENDING_REVIEW` by a hard penalty or any flagged phrase, and is then
//! overridden by the score bands: below 0.4 is `REJECTED`, below 0.7 is
//! `NEEDS_IMPROVEMENT`. A flagged listing therefore only stays in review when
//! its score lands in the approval band.

use crate::models::{ImageAnalysisResult, QualityAssessment, QualityStatus, TextAnalysisResult};

pub const BLURRINESS_WEIGHT: f64 = 0.4;
pub const STOCK_PHOTO_WEIGHT: f64 = 0.3;
pub const CLARITY_WEIGHT: f64 = 0.3;
pub const NORMALIZER: f64 = 1.6;

const BLURRINESS_REVIEW_THRESHOLD: f64 = 0.6;
const STOCK_PHOTO_REVIEW_THRESHOLD: f64 = 0.7;
const REJECT_BELOW: f64 = 0.4;
const APPROVE_FROM: f64 = 0.7;

pub fn assess(image: &ImageAnalysisResult, text: &TextAnalysisResult) -> QualityAssessment {
    let blurriness_penalty = image.blurriness_score * BLURRINESS_WEIGHT;
    let stock_photo_penalty = image.is_stock_photo * STOCK_PHOTO_WEIGHT;
    let clarity_bonus = text.clarity_score * CLARITY_WEIGHT;

    let raw = (1.0 - blurriness_penalty - stock_photo_penalty + clarity_bonus) / NORMALIZER;
    let quality_score = clamp_unit(raw);

    let mut quality_status = QualityStatus::Approved;
    if blurriness_penalty > BLURRINESS_REVIEW_THRESHOLD
        || stock_photo_penalty > STOCK_PHOTO_REVIEW_THRESHOLD
        || !text.flagged_phrases.is_empty()
    {
        quality_status = QualityStatus::PendingReview;
    }
    if quality_score < REJECT_BELOW {
        quality_status = QualityStatus::Rejected;
    } else if quality_score < APPROVE_FROM && quality_status != QualityStatus::Rejected {
        quality_status = QualityStatus::NeedsImprovement;
    }

    QualityAssessment {
        quality_score,
        quality_status,
    }
}

// NaN compares false against both bounds, so pin it to the floor.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
