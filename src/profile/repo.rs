use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use super::repo_types::{Onboarding, UserProfile};
use crate::errors::TrackerResult;
use crate::storage::KeyValueStore;

pub const PROFILE_KEY: &str = "userProfile";

/// Load/save of the single profile, cached after the first read.
pub struct ProfileStore {
    kv: Arc<dyn KeyValueStore>,
    cache: Mutex<Option<Option<UserProfile>>>,
}

impl ProfileStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            cache: Mutex::new(None),
        }
    }

    pub async fn load(&self) -> TrackerResult<Option<UserProfile>> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            return Ok(cached.clone());
        }
        let profile: Option<UserProfile> = match self.kv.get(PROFILE_KEY).await? {
            None | Some(Value::Null) => None,
            Some(v) => Some(serde_json::from_value(v).context("decode userProfile")?),
        };
        *cache = Some(profile.clone());
        Ok(profile)
    }

    /// Full replacement of the stored profile.
    #[instrument(skip(self, profile), fields(name = %profile.name))]
    pub async fn save(&self, profile: UserProfile) -> TrackerResult<UserProfile> {
        profile.validate()?;
        let mut cache = self.cache.lock().await;
        let value = serde_json::to_value(&profile).context("encode userProfile")?;
        self.kv.set(PROFILE_KEY, value).await?;
        *cache = Some(Some(profile.clone()));
        info!("profile saved");
        Ok(profile)
    }

    /// Removes the stored profile; onboarding is required again afterwards.
    pub async fn clear(&self) -> TrackerResult<()> {
        let mut cache = self.cache.lock().await;
        self.kv.delete(PROFILE_KEY).await?;
        *cache = Some(None);
        info!("profile cleared");
        Ok(())
    }

    pub async fn onboarding(&self) -> TrackerResult<Onboarding> {
        Ok(match self.load().await? {
            Some(profile) => Onboarding::Complete { profile },
            None => Onboarding::Required,
        })
    }

    /// Drop the cached copy so the next read goes to the store.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }
}
