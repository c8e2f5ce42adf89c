use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::config::{AppConfig, EstimatorConfig};
use crate::estimation::{EstimationClient, GeminiEstimator};
use crate::ledger::LedgerStore;
use crate::meals::ConfirmationWorkflow;
use crate::profile::ProfileStore;
use crate::storage::{KeyValueStore, MemoryStore, PgStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub profiles: Arc<ProfileStore>,
    pub ledger: Arc<LedgerStore>,
    pub workflow: Arc<ConfirmationWorkflow>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let kv: Arc<dyn KeyValueStore> = match &config.database_url {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    warn!(error = %e, "migration failed; continuing");
                }
                info!("using postgres key-value store");
                Arc::new(PgStore::new(db))
            }
            None => {
                warn!("DATABASE_URL not set; state is kept in memory only");
                Arc::new(MemoryStore::new())
            }
        };

        let estimator = GeminiEstimator::new(&config.estimator).context("build estimator")?;
        if !estimator.is_configured() {
            warn!("GEMINI_API_KEY not set; meal estimation will report service unavailable");
        }

        Ok(Self::from_parts(config, kv, Arc::new(estimator)))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        kv: Arc<dyn KeyValueStore>,
        estimator: Arc<dyn EstimationClient>,
    ) -> Self {
        let ledger = Arc::new(LedgerStore::new(kv.clone()));
        Self {
            config,
            profiles: Arc::new(ProfileStore::new(kv)),
            workflow: Arc::new(ConfirmationWorkflow::new(estimator, ledger.clone())),
            ledger,
        }
    }

    /// In-memory state around the given estimator, for tests.
    pub fn fake(estimator: Arc<dyn EstimationClient>) -> Self {
        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: None,
            estimator: EstimatorConfig {
                api_key: None,
                model: "test".into(),
                base_url: "http://fake.local".into(),
                timeout_secs: 1,
            },
            max_upload_bytes: 1024 * 1024,
        });
        Self::from_parts(config, Arc::new(MemoryStore::new()), estimator)
    }
}
