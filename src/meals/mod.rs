mod dto;
pub mod handlers;
pub mod workflow;

use crate::state::AppState;
use axum::Router;

pub use workflow::{ConfirmationWorkflow, DraftEdit, Phase, WorkflowSnapshot};

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes(max_upload_bytes))
}
