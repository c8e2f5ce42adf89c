use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{instrument, warn};

use super::dto::{DraftPatchRequest, TextInputRequest};
use super::workflow::WorkflowSnapshot;
use crate::errors::{TrackerError, TrackerResult};
use crate::estimation::CalorieEstimationDraft;
use crate::ledger::dto::DayView;
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/meals/draft", get(get_draft).patch(patch_draft))
}

pub fn write_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/meals/input/text", put(put_text))
        .route(
            "/meals/input/image",
            post(post_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/meals/input", delete(clear_input))
        .route("/meals/estimate", post(estimate))
        .route("/meals/abandon", post(abandon))
        .route("/meals/draft/commit", post(commit))
        .route("/meals/draft/cancel", post(cancel))
}

#[instrument(skip(state))]
pub async fn get_draft(State(state): State<AppState>) -> Json<WorkflowSnapshot> {
    Json(state.workflow.snapshot().await)
}

#[instrument(skip(state, body))]
pub async fn put_text(
    State(state): State<AppState>,
    Json(body): Json<TextInputRequest>,
) -> TrackerResult<Json<WorkflowSnapshot>> {
    state.workflow.set_text(body.content).await?;
    Ok(Json(state.workflow.snapshot().await))
}

/// Multipart upload; the first `file` (or `image`) field is used.
#[instrument(skip(state, mp))]
pub async fn post_image(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> TrackerResult<Json<WorkflowSnapshot>> {
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| TrackerError::validation(format!("invalid multipart body: {}", e)))?
    {
        if !matches!(field.name(), Some("file") | Some("image")) {
            continue;
        }
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".into());
        if !content_type.starts_with("image/") {
            warn!(%content_type, "rejected non-image upload");
            return Err(TrackerError::validation("upload must be an image"));
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| TrackerError::validation(format!("could not read upload: {}", e)))?;
        state.workflow.set_image(data, content_type).await?;
        return Ok(Json(state.workflow.snapshot().await));
    }
    Err(TrackerError::validation("file is required"))
}

#[instrument(skip(state))]
pub async fn clear_input(State(state): State<AppState>) -> TrackerResult<Json<WorkflowSnapshot>> {
    state.workflow.clear_input().await?;
    Ok(Json(state.workflow.snapshot().await))
}

#[instrument(skip(state))]
pub async fn estimate(State(state): State<AppState>) -> TrackerResult<Json<WorkflowSnapshot>> {
    state.workflow.start().await?;
    Ok(Json(state.workflow.snapshot().await))
}

#[instrument(skip(state))]
pub async fn abandon(State(state): State<AppState>) -> TrackerResult<Json<WorkflowSnapshot>> {
    state.workflow.abandon().await?;
    Ok(Json(state.workflow.snapshot().await))
}

#[instrument(skip(state, body))]
pub async fn patch_draft(
    State(state): State<AppState>,
    Json(body): Json<DraftPatchRequest>,
) -> TrackerResult<Json<CalorieEstimationDraft>> {
    let edits = body.into_edits();
    if edits.is_empty() {
        return Err(TrackerError::validation("nothing to change"));
    }
    let draft = state.workflow.edit_draft_all(edits).await?;
    Ok(Json(draft))
}

#[instrument(skip(state))]
pub async fn commit(State(state): State<AppState>) -> TrackerResult<Json<DayView>> {
    let log = state.workflow.commit().await?;
    Ok(Json(log.into()))
}

#[instrument(skip(state))]
pub async fn cancel(State(state): State<AppState>) -> TrackerResult<Json<WorkflowSnapshot>> {
    state.workflow.cancel().await?;
    Ok(Json(state.workflow.snapshot().await))
}
