use serde::{Deserialize, Serialize};

use crate::errors::{TrackerError, TrackerResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[serde(alias = "Male")]
    Male,
    #[serde(alias = "Female")]
    Female,
}

/// The single user's body metrics. Metric units only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub weight: f64, // kg
    pub height: f64, // cm
}

impl UserProfile {
    pub fn validate(&self) -> TrackerResult<()> {
        if self.name.trim().is_empty() {
            return Err(TrackerError::validation("name must not be empty"));
        }
        if self.age == 0 {
            return Err(TrackerError::validation("age must be positive"));
        }
        if !(self.weight.is_finite() && self.weight > 0.0) {
            return Err(TrackerError::validation("weight must be positive"));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(TrackerError::validation("height must be positive"));
        }
        Ok(())
    }
}

/// Whether the onboarding form still has to be shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Onboarding {
    Required,
    Complete { profile: UserProfile },
}
