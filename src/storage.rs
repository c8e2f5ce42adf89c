use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tokio::sync::RwLock;

/// Opaque key-value persistence. Values are JSON documents.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> anyhow::Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Postgres-backed store, one JSONB row per key in `kv_store`.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KeyValueStore for PgStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let row: Option<(Value,)> = sqlx::query_as(
            r#"
            SELECT value
            FROM kv_store
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("kv get {}", key))?;
        Ok(row.map(|(v,)| v))
    }

    async fn set(&self, key: &str, value: Value) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await
        .with_context(|| format!("kv set {}", key))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = $1")
            .bind(key)
            .execute(&self.db)
            .await
            .with_context(|| format!("kv delete {}", key))?;
        Ok(())
    }
}
