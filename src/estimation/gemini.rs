use std::time::Duration;

use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};

use super::client::EstimationClient;
use super::dto::CalorieEstimationDraft;
use super::validator;
use crate::config::EstimatorConfig;
use crate::errors::{ResponseDefect, TrackerError, TrackerResult};

const SYSTEM_INSTRUCTION: &str = "You are a nutrition expert. Analyze the user's meal from the text or image. \
Identify the food items, estimate their individual caloric content, and then calculate the total. \
Respond in a valid JSON format according to the provided schema. Provide a 'description' of the meal, \
the 'totalCalories', and a 'breakdown' array listing each item and its calories.";

fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "description": {
                "type": "STRING",
                "description": "A concise but descriptive summary of the meal identified (e.g., 'Two fried eggs with whole wheat toast')."
            },
            "totalCalories": {
                "type": "INTEGER",
                "description": "The estimated total calorie count for the meal as a single integer."
            },
            "breakdown": {
                "type": "ARRAY",
                "description": "A breakdown of each food item identified and its estimated calories.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "item": { "type": "STRING", "description": "The name of the individual food item." },
                        "calories": { "type": "INTEGER", "description": "The estimated calories for this specific item." }
                    },
                    "required": ["item", "calories"]
                }
            }
        },
        "required": ["description", "totalCalories", "breakdown"]
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    InlineData {
        #[serde(rename = "mimeType")]
        mime_type: String,
        data: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn build_request(part: Part) -> GenerateRequest {
    GenerateRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part::Text(SYSTEM_INSTRUCTION.to_string())],
        },
        contents: vec![Content {
            role: Some("user"),
            parts: vec![part],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: response_schema(),
        },
    }
}

/// Text of the first part of the first candidate.
fn model_text(body: &str) -> TrackerResult<String> {
    let parsed: GenerateResponse = serde_json::from_str(body).map_err(|e| {
        error!(error = %e, "unreadable generateContent response");
        TrackerError::InvalidResponse(ResponseDefect::MalformedPayload)
    })?;
    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or(TrackerError::InvalidResponse(ResponseDefect::SchemaMismatch))
}

/// Gemini `generateContent` adapter.
#[derive(Debug, Clone)]
pub struct GeminiEstimator {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiEstimator {
    pub fn new(config: &EstimatorConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, part: Part) -> TrackerResult<CalorieEstimationDraft> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            TrackerError::ServiceUnavailable("estimation service is not configured".into())
        })?;

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!(%url, "sending estimation request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&build_request(part))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "estimation request failed");
                TrackerError::ServiceUnavailable(format!("request failed: {}", e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!(error = %e, "reading estimation response failed");
            TrackerError::ServiceUnavailable(format!("response read failed: {}", e))
        })?;

        if !status.is_success() {
            error!(%status, body = %body, "estimation service returned an error");
            return Err(TrackerError::ServiceUnavailable(format!("HTTP {}", status)));
        }

        let draft = validator::validate(&model_text(&body)?)?;
        info!(
            total_calories = draft.total_calories,
            items = draft.breakdown.len(),
            "estimation received"
        );
        Ok(draft)
    }
}

#[async_trait]
impl EstimationClient for GeminiEstimator {
    #[instrument(skip(self, description))]
    async fn estimate_from_text(&self, description: &str) -> TrackerResult<CalorieEstimationDraft> {
        self.generate(Part::Text(description.to_string())).await
    }

    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    async fn estimate_from_image(
        &self,
        bytes: Bytes,
        mime_type: &str,
    ) -> TrackerResult<CalorieEstimationDraft> {
        self.generate(Part::InlineData {
            mime_type: mime_type.to_string(),
            data: Base64::encode_string(&bytes),
        })
        .await
    }
}
