pub mod handlers;
pub mod repo;
pub mod repo_types;

use crate::state::AppState;
use axum::Router;

pub use repo::ProfileStore;
pub use repo_types::{Gender, Onboarding, UserProfile};

pub fn router() -> Router<AppState> {
    handlers::profile_routes()
}
