use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::calculator::{compute_burned, ActivityLevel};
use crate::errors::{TrackerError, TrackerResult};
use crate::ledger::dto::DayView;
use crate::ledger::repo_types::DateKey;
use crate::state::AppState;

pub fn activity_routes() -> Router<AppState> {
    Router::new()
        .route("/activity-levels", get(list_levels))
        .route(
            "/activity",
            axum::routing::post(record_activity).delete(clear_activity),
        )
}

#[derive(Debug, Serialize)]
pub struct ActivityLevelView {
    pub level: ActivityLevel,
    pub multiplier: f64,
    pub description: &'static str,
    pub example: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct RecordActivityRequest {
    pub level: ActivityLevel,
}

pub async fn list_levels() -> Json<Vec<ActivityLevelView>> {
    Json(
        ActivityLevel::ALL
            .iter()
            .map(|&level| ActivityLevelView {
                level,
                multiplier: level.multiplier(),
                description: level.description(),
                example: level.example(),
            })
            .collect(),
    )
}

/// Computes today's burned calories from the saved profile and overwrites
/// today's value.
#[instrument(skip(state))]
pub async fn record_activity(
    State(state): State<AppState>,
    Json(req): Json<RecordActivityRequest>,
) -> TrackerResult<Json<DayView>> {
    let profile = state
        .profiles
        .load()
        .await?
        .ok_or(TrackerError::InvalidState("save a profile before recording activity"))?;
    let burned = compute_burned(&profile, req.level);
    info!(level = ?req.level, burned, "activity level recorded");
    let log = state.ledger.set_burned(DateKey::today(), burned).await?;
    Ok(Json(log.into()))
}

#[instrument(skip(state))]
pub async fn clear_activity(State(state): State<AppState>) -> TrackerResult<Json<DayView>> {
    let log = state.ledger.clear_burned(DateKey::today()).await?;
    Ok(Json(log.into()))
}
