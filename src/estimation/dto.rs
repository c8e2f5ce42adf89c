use bytes::Bytes;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItemBreakdown {
    pub item: String,
    pub calories: i64,
}

/// Structured estimate returned by the estimation service, after validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalorieEstimationDraft {
    pub description: String,
    pub total_calories: i64,
    pub breakdown: Vec<FoodItemBreakdown>,
}

/// What the user handed in for one estimation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EstimationRequest {
    Text { content: String },
    Image { bytes: Bytes, mime_type: String },
}

impl EstimationRequest {
    pub fn kind(&self) -> InputKind {
        match self {
            EstimationRequest::Text { .. } => InputKind::Text,
            EstimationRequest::Image { .. } => InputKind::Image,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    Image,
}
