use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::repo_types::{DailyLog, DateKey, FoodLogEntry, HistoryWindow};
use crate::errors::{TrackerError, TrackerResult};
use crate::storage::KeyValueStore;

pub const LOGS_KEY: &str = "calorieTrackerLogs";

pub type Ledger = HashMap<DateKey, DailyLog>;

/// Single writer over the persisted ledger.
///
/// Every mutation holds the cache lock across load, modify and save, so two
/// mutations for the same day never overwrite each other.
pub struct LedgerStore {
    kv: Arc<dyn KeyValueStore>,
    cache: Mutex<Option<Ledger>>,
}

impl LedgerStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            cache: Mutex::new(None),
        }
    }

    async fn read_from_store(&self) -> TrackerResult<Ledger> {
        let mut ledger: Ledger = match self.kv.get(LOGS_KEY).await? {
            None | Some(Value::Null) => Ledger::new(),
            Some(v) => serde_json::from_value(v).context("decode calorieTrackerLogs")?,
        };
        for (date, log) in ledger.iter_mut() {
            let cached = log.calories_consumed;
            if log.reconcile() {
                warn!(
                    %date,
                    cached,
                    recomputed = log.calories_consumed,
                    "consumed total diverged from entries; recomputed"
                );
            }
        }
        debug!(days = ledger.len(), "ledger loaded");
        Ok(ledger)
    }

    async fn ensure_loaded<'a>(&self, cache: &'a mut Option<Ledger>) -> TrackerResult<&'a mut Ledger> {
        if cache.is_none() {
            *cache = Some(self.read_from_store().await?);
        }
        Ok(cache.get_or_insert_with(Ledger::new))
    }

    async fn persist(&self, ledger: &Ledger) -> TrackerResult<()> {
        let value = serde_json::to_value(ledger).context("encode calorieTrackerLogs")?;
        self.kv.set(LOGS_KEY, value).await?;
        Ok(())
    }

    /// Snapshot of the whole ledger, reading through to the store on a cold cache.
    pub async fn load(&self) -> TrackerResult<Ledger> {
        let mut cache = self.cache.lock().await;
        Ok(self.ensure_loaded(&mut cache).await?.clone())
    }

    /// Writes the cached ledger back to the store.
    pub async fn save(&self) -> TrackerResult<()> {
        let mut cache = self.cache.lock().await;
        let ledger = self.ensure_loaded(&mut cache).await?;
        self.persist(ledger).await
    }

    /// Forget the cached ledger; call when the store was changed by someone else.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    /// Existing log or an unsaved empty one.
    pub async fn get_day(&self, date: DateKey) -> TrackerResult<DailyLog> {
        let mut cache = self.cache.lock().await;
        let ledger = self.ensure_loaded(&mut cache).await?;
        Ok(ledger
            .get(&date)
            .cloned()
            .unwrap_or_else(|| DailyLog::empty(date)))
    }

    pub async fn today(&self) -> TrackerResult<DailyLog> {
        self.get_day(DateKey::today()).await
    }

    #[instrument(skip(self, description), fields(%date))]
    pub async fn append_meal(
        &self,
        date: DateKey,
        description: &str,
        calories: i64,
    ) -> TrackerResult<DailyLog> {
        let description = description.trim();
        if description.is_empty() {
            return Err(TrackerError::validation("description must not be empty"));
        }
        if calories <= 0 {
            return Err(TrackerError::validation("calories must be greater than zero"));
        }

        let entry = FoodLogEntry {
            id: Uuid::new_v4(),
            description: description.to_string(),
            calories,
            timestamp: OffsetDateTime::now_utc(),
        };
        let log = self
            .mutate(date, move |log| {
                log.calories_consumed = log
                    .calories_consumed
                    .checked_add(entry.calories)
                    .ok_or_else(|| TrackerError::validation("daily calorie total out of range"))?;
                log.food_entries.insert(0, entry);
                Ok(())
            })
            .await?;
        info!(calories, consumed = log.calories_consumed, "meal logged");
        Ok(log)
    }

    /// Overwrites the burned value for the day.
    #[instrument(skip(self), fields(%date))]
    pub async fn set_burned(&self, date: DateKey, calories: i64) -> TrackerResult<DailyLog> {
        if calories < 0 {
            return Err(TrackerError::validation("burned calories must not be negative"));
        }
        let log = self
            .mutate(date, |log| {
                log.calories_burned = Some(calories);
                Ok(())
            })
            .await?;
        info!(calories, "burned calories recorded");
        Ok(log)
    }

    #[instrument(skip(self), fields(%date))]
    pub async fn clear_burned(&self, date: DateKey) -> TrackerResult<DailyLog> {
        let log = self
            .mutate(date, |log| {
                log.calories_burned = None;
                Ok(())
            })
            .await?;
        info!("burned calories cleared");
        Ok(log)
    }

    /// Every log except `exclude`, in no particular order.
    pub async fn history(&self, exclude: DateKey) -> TrackerResult<Vec<DailyLog>> {
        let mut cache = self.cache.lock().await;
        let ledger = self.ensure_loaded(&mut cache).await?;
        Ok(ledger
            .values()
            .filter(|log| log.date != exclude)
            .cloned()
            .collect())
    }

    /// Most recent logs first, today included, capped by the window.
    pub async fn recent(&self, window: HistoryWindow) -> TrackerResult<Vec<DailyLog>> {
        let mut logs: Vec<DailyLog> = self.load().await?.into_values().collect();
        logs.sort_by(|a, b| b.date.cmp(&a.date));
        logs.truncate(window.limit());
        Ok(logs)
    }

    async fn mutate<F>(&self, date: DateKey, apply: F) -> TrackerResult<DailyLog>
    where
        F: FnOnce(&mut DailyLog) -> TrackerResult<()>,
    {
        let mut cache = self.cache.lock().await;
        let ledger = self.ensure_loaded(&mut cache).await?;

        let previous = ledger.get(&date).cloned();
        let mut log = previous.clone().unwrap_or_else(|| DailyLog::empty(date));
        apply(&mut log)?;
        ledger.insert(date, log.clone());

        if let Err(e) = self.persist(ledger).await {
            match previous {
                Some(prev) => ledger.insert(date, prev),
                None => ledger.remove(&date),
            };
            return Err(e);
        }
        Ok(log)
    }
}
