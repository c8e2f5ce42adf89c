use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use time::{macros::format_description, Date, OffsetDateTime};
use uuid::Uuid;

/// Calendar-day key, rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(Date);

impl DateKey {
    pub fn new(date: Date) -> Self {
        Self(date)
    }

    /// Current UTC calendar day, read from the clock on every call.
    pub fn today() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    pub fn date(&self) -> Date {
        self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self
            .0
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(|_| fmt::Error)?;
        f.write_str(&s)
    }
}

impl FromStr for DateKey {
    type Err = time::error::Parse;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s, format_description!("[year]-[month]-[day]")).map(Self)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|e| de::Error::custom(format!("invalid date key {:?}: {}", s, e)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodLogEntry {
    pub id: Uuid,
    pub description: String,
    pub calories: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub date: DateKey,
    pub calories_consumed: i64,
    /// `None` until an activity level has been recorded for the day.
    pub calories_burned: Option<i64>,
    /// Most recent first.
    #[serde(default)]
    pub food_entries: Vec<FoodLogEntry>,
}

impl DailyLog {
    pub fn empty(date: DateKey) -> Self {
        Self {
            date,
            calories_consumed: 0,
            calories_burned: None,
            food_entries: Vec::new(),
        }
    }

    /// Saturates at the `i64` bounds instead of wrapping.
    pub fn entries_total(&self) -> i64 {
        self.food_entries
            .iter()
            .fold(0i64, |acc, e| acc.saturating_add(e.calories))
    }

    /// Recomputes `calories_consumed` from the entries. Returns true when the
    /// cached total had drifted.
    pub fn reconcile(&mut self) -> bool {
        let total = self.entries_total();
        if total == self.calories_consumed {
            return false;
        }
        self.calories_consumed = total;
        true
    }

    /// Consumed minus burned; positive is a surplus.
    pub fn balance(&self) -> Option<i64> {
        self.calories_burned
            .map(|burned| self.calories_consumed.saturating_sub(burned))
    }

    pub fn balance_status(&self) -> Option<Balance> {
        self.balance().map(Balance::from_net)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "calories", rename_all = "lowercase")]
pub enum Balance {
    Surplus(i64),
    Deficit(i64),
    Even,
}

impl Balance {
    pub fn from_net(net: i64) -> Self {
        match net {
            n if n > 0 => Balance::Surplus(n),
            n if n < 0 => Balance::Deficit(n.saturating_neg()),
            _ => Balance::Even,
        }
    }
}

/// Chart windows over the most recent logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryWindow {
    Weekly,
    Monthly,
}

impl HistoryWindow {
    pub fn limit(self) -> usize {
        match self {
            HistoryWindow::Weekly => 7,
            HistoryWindow::Monthly => 30,
        }
    }
}

#[cfg(test)]
mod model_tests {
    use super::*;
    use time::macros::{date, datetime};

    fn log_with(consumed: i64, burned: Option<i64>) -> DailyLog {
        DailyLog {
            calories_consumed: consumed,
            calories_burned: burned,
            ..DailyLog::empty(DateKey::new(date!(2024 - 01 - 02)))
        }
    }

    #[test]
    fn date_key_formats_and_parses() {
        let key: DateKey = "2024-01-02".parse().unwrap();
        assert_eq!(key.date(), date!(2024 - 01 - 02));
        assert_eq!(key.to_string(), "2024-01-02");
        assert!("2024-1-2x".parse::<DateKey>().is_err());
    }

    #[test]
    fn balance_surplus_deficit_and_unset() {
        assert_eq!(log_with(2000, Some(1800)).balance(), Some(200));
        assert_eq!(
            log_with(2000, Some(1800)).balance_status(),
            Some(Balance::Surplus(200))
        );
        assert_eq!(log_with(1500, Some(1800)).balance(), Some(-300));
        assert_eq!(
            log_with(1500, Some(1800)).balance_status(),
            Some(Balance::Deficit(300))
        );
        assert_eq!(log_with(1800, Some(1800)).balance_status(), Some(Balance::Even));
        assert_eq!(log_with(1500, None).balance(), None);
    }

    #[test]
    fn burned_zero_is_distinct_from_unset() {
        assert_eq!(log_with(100, Some(0)).balance(), Some(100));
        assert_eq!(log_with(100, None).balance(), None);
    }

    #[test]
    fn extreme_totals_saturate_instead_of_wrapping() {
        assert_eq!(log_with(i64::MIN, Some(1)).balance(), Some(i64::MIN));
        assert_eq!(log_with(i64::MAX, Some(-1)).balance(), Some(i64::MAX));
        assert_eq!(Balance::from_net(i64::MIN), Balance::Deficit(i64::MAX));

        let mut log = log_with(0, None);
        for calories in [i64::MAX, 1] {
            log.food_entries.push(FoodLogEntry {
                id: Uuid::new_v4(),
                description: "Feast".into(),
                calories,
                timestamp: datetime!(2024-01-02 08:00 UTC),
            });
        }
        assert_eq!(log.entries_total(), i64::MAX);
    }

    #[test]
    fn reconcile_recomputes_from_entries() {
        let mut log = log_with(999, None);
        log.food_entries.push(FoodLogEntry {
            id: Uuid::new_v4(),
            description: "Toast".into(),
            calories: 200,
            timestamp: datetime!(2024-01-02 08:00 UTC),
        });
        assert!(log.reconcile());
        assert_eq!(log.calories_consumed, 200);
        assert!(!log.reconcile());
    }

    #[test]
    fn persisted_shape_is_camel_case_with_null_burned() {
        let json = serde_json::to_value(log_with(0, None)).unwrap();
        assert_eq!(json["date"], "2024-01-02");
        assert_eq!(json["caloriesConsumed"], 0);
        assert!(json["caloriesBurned"].is_null());
        assert!(json["foodEntries"].as_array().unwrap().is_empty());
    }
}
