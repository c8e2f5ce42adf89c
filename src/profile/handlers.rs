use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::instrument;

use super::repo_types::{Onboarding, UserProfile};
use crate::errors::TrackerResult;
use crate::state::AppState;

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(get_profile).put(put_profile).delete(delete_profile),
        )
        .route("/onboarding", get(get_onboarding))
}

#[instrument(skip(state))]
pub async fn get_profile(State(state): State<AppState>) -> TrackerResult<Json<Option<UserProfile>>> {
    Ok(Json(state.profiles.load().await?))
}

#[instrument(skip(state, profile))]
pub async fn put_profile(
    State(state): State<AppState>,
    Json(profile): Json<UserProfile>,
) -> TrackerResult<Json<UserProfile>> {
    Ok(Json(state.profiles.save(profile).await?))
}

#[instrument(skip(state))]
pub async fn delete_profile(State(state): State<AppState>) -> TrackerResult<StatusCode> {
    state.profiles.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn get_onboarding(State(state): State<AppState>) -> TrackerResult<Json<Onboarding>> {
    Ok(Json(state.profiles.onboarding().await?))
}
