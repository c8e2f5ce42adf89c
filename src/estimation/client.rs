use async_trait::async_trait;
use bytes::Bytes;

use super::dto::{CalorieEstimationDraft, EstimationRequest};
use crate::errors::{TrackerError, TrackerResult};

/// Calorie estimation capability. Implementations return only drafts that
/// passed [`crate::estimation::validator::validate`].
#[async_trait]
pub trait EstimationClient: Send + Sync {
    async fn estimate_from_text(&self, description: &str) -> TrackerResult<CalorieEstimationDraft>;

    async fn estimate_from_image(
        &self,
        bytes: Bytes,
        mime_type: &str,
    ) -> TrackerResult<CalorieEstimationDraft>;

    async fn estimate(&self, request: &EstimationRequest) -> TrackerResult<CalorieEstimationDraft> {
        match request {
            EstimationRequest::Text { content } => {
                if content.trim().is_empty() {
                    return Err(TrackerError::validation("meal description must not be empty"));
                }
                self.estimate_from_text(content).await
            }
            EstimationRequest::Image { bytes, mime_type } => {
                if bytes.is_empty() {
                    return Err(TrackerError::validation("image must not be empty"));
                }
                self.estimate_from_image(bytes.clone(), mime_type).await
            }
        }
    }
}
