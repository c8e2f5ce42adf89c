pub mod client;
pub mod dto;
pub mod gemini;
pub mod validator;

pub use client::EstimationClient;
pub use dto::{CalorieEstimationDraft, EstimationRequest, FoodItemBreakdown, InputKind};
pub use gemini::GeminiEstimator;
