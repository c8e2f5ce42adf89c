use serde::Deserialize;

use super::workflow::DraftEdit;

#[derive(Debug, Deserialize)]
pub struct TextInputRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPatchRequest {
    pub description: Option<String>,
    pub total_calories: Option<i64>,
}

impl DraftPatchRequest {
    pub fn into_edits(self) -> Vec<DraftEdit> {
        let mut edits = Vec::with_capacity(2);
        if let Some(d) = self.description {
            edits.push(DraftEdit::Description(d));
        }
        if let Some(c) = self.total_calories {
            edits.push(DraftEdit::TotalCalories(c));
        }
        edits
    }
}
