use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{DayView, HistoryQuery};
use super::repo_types::DateKey;
use crate::errors::{TrackerError, TrackerResult};
use crate::state::AppState;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/days/today", get(get_today))
        .route("/days/:date", get(get_day))
        .route("/history", get(get_history))
        .route("/history/past", get(get_past))
}

#[instrument(skip(state))]
pub async fn get_today(State(state): State<AppState>) -> TrackerResult<Json<DayView>> {
    Ok(Json(state.ledger.today().await?.into()))
}

#[instrument(skip(state))]
pub async fn get_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> TrackerResult<Json<DayView>> {
    let date: DateKey = date
        .parse()
        .map_err(|_| TrackerError::validation(format!("invalid date {:?}, expected YYYY-MM-DD", date)))?;
    Ok(Json(state.ledger.get_day(date).await?.into()))
}

/// Most recent days first, capped at 7 or 30.
#[instrument(skip(state))]
pub async fn get_history(
    State(state): State<AppState>,
    Query(q): Query<HistoryQuery>,
) -> TrackerResult<Json<Vec<DayView>>> {
    let logs = state.ledger.recent(q.view).await?;
    Ok(Json(logs.into_iter().map(DayView::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_past(State(state): State<AppState>) -> TrackerResult<Json<Vec<DayView>>> {
    let mut logs = state.ledger.history(DateKey::today()).await?;
    logs.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(Json(logs.into_iter().map(DayView::from).collect()))
}
