pub mod calculator;
pub mod handlers;

use crate::state::AppState;
use axum::Router;

pub use calculator::{basal_metabolic_rate, compute_burned, ActivityLevel};

pub fn router() -> Router<AppState> {
    handlers::activity_routes()
}
