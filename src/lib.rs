pub mod app;
pub mod config;
pub mod energy;
pub mod errors;
pub mod estimation;
pub mod ledger;
pub mod meals;
pub mod profile;
pub mod state;
pub mod storage;
