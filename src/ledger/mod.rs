pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

use crate::state::AppState;
use axum::Router;

pub use repo::{Ledger, LedgerStore};
pub use repo_types::{Balance, DailyLog, DateKey, FoodLogEntry, HistoryWindow};

pub fn router() -> Router<AppState> {
    handlers::read_routes()
}
