use serde::{Deserialize, Serialize};

use crate::profile::repo_types::{Gender, UserProfile};

/// Self-reported activity level used to scale BMR into TDEE.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtraActive,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 5] = [
        ActivityLevel::Sedentary,
        ActivityLevel::LightlyActive,
        ActivityLevel::ModeratelyActive,
        ActivityLevel::VeryActive,
        ActivityLevel::ExtraActive,
    ];

    pub fn multiplier(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtraActive => 1.9,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Little to no exercise.",
            ActivityLevel::LightlyActive => "Light exercise or sports 1-3 days/week.",
            ActivityLevel::ModeratelyActive => "Moderate exercise or sports 3-5 days/week.",
            ActivityLevel::VeryActive => "Hard exercise or sports 6-7 days a week.",
            ActivityLevel::ExtraActive => "Very hard exercise/sports & a physical job.",
        }
    }

    pub fn example(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => {
                "You spend most of the day sitting (e.g., desk job, driving)."
            }
            ActivityLevel::LightlyActive => "e.g., walking for 30-60 mins, light jogging, yoga.",
            ActivityLevel::ModeratelyActive => "e.g., running, cycling, swimming for an hour.",
            ActivityLevel::VeryActive => "e.g., intense weightlifting, HIIT, team sports practice.",
            ActivityLevel::ExtraActive => {
                "e.g., construction worker, professional athlete, marathon training."
            }
        }
    }
}

/// Basal metabolic rate, Mifflin-St Jeor (kcal/day).
pub fn basal_metabolic_rate(profile: &UserProfile) -> f64 {
    let base = 10.0 * profile.weight + 6.25 * profile.height - 5.0 * f64::from(profile.age);
    match profile.gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    }
}

/// Calories burned for the day: BMR scaled by the activity multiplier,
/// rounded half away from zero.
pub fn compute_burned(profile: &UserProfile, level: ActivityLevel) -> i64 {
    (basal_metabolic_rate(profile) * level.multiplier()).round() as i64
}

#[cfg(test)]
mod calculator_tests {
    use super::*;

    fn male_75_180_30() -> UserProfile {
        UserProfile {
            name: "Alex".into(),
            age: 30,
            gender: Gender::Male,
            weight: 75.0,
            height: 180.0,
        }
    }

    #[test]
    fn bmr_male_and_female() {
        let male = male_75_180_30();
        assert_eq!(basal_metabolic_rate(&male), 1730.0);

        let female = UserProfile { gender: Gender::Female, ..male };
        assert_eq!(basal_metabolic_rate(&female), 1564.0);
    }

    #[test]
    fn sedentary_and_very_active() {
        let p = male_75_180_30();
        assert_eq!(compute_burned(&p, ActivityLevel::Sedentary), 2076);
        assert_eq!(compute_burned(&p, ActivityLevel::VeryActive), 2984);
    }

    #[test]
    fn rounds_to_nearest_calorie() {
        // 10*70 + 6.25*170 - 5*40 + 5 = 1567.5
        let p = UserProfile {
            name: "B".into(),
            age: 40,
            gender: Gender::Male,
            weight: 70.0,
            height: 170.0,
        };
        assert_eq!(compute_burned(&p, ActivityLevel::Sedentary), 1881);
        // 1567.5 * 1.375 = 2155.3125
        assert_eq!(compute_burned(&p, ActivityLevel::LightlyActive), 2155);
    }

    #[test]
    fn multipliers_are_monotonic() {
        let p = male_75_180_30();
        let burned: Vec<i64> = ActivityLevel::ALL
            .iter()
            .map(|l| compute_burned(&p, *l))
            .collect();
        assert!(burned.windows(2).all(|w| w[0] < w[1]));
    }
}
