#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use dawnlock_core::constants::PREFERENCES_NAMESPACE;
use sqlx::SqlitePool;
use tracing::trace;

/// Durable key/value preference store.
///
/// Values are stored as text. Writes are immediately durable and
/// last-writer-wins; there is no transactional grouping across keys.
///
/// # Implementation Note
///
/// Implementors provide the three string primitives; the typed accessors are
/// default methods that encode booleans as `true`/`false` and integers in
/// decimal.
pub trait PreferenceStore: Send + Sync {
    /// Raw stored value for `key`, if any.
    async fn get_string(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set_string(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete `key`. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Boolean stored under `key`, or `default` when absent.
    async fn get_bool(&self, key: &str, default: bool) -> StorageResult<bool> {
        match self.get_string(key).await? {
            None => Ok(default),
            Some(v) => match v.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(StorageError::invalid_value(key, v, "bool")),
            },
        }
    }

    async fn set_bool(&self, key: &str, value: bool) -> StorageResult<()> {
        self.set_string(key, if value { "true" } else { "false" })
            .await
    }

    /// Integer stored under `key`, or `default` when absent.
    async fn get_int(&self, key: &str, default: i64) -> StorageResult<i64> {
        match self.get_string(key).await? {
            None => Ok(default),
            Some(v) => v
                .parse()
                .map_err(|_| StorageError::invalid_value(key, v, "integer")),
        }
    }

    async fn set_int(&self, key: &str, value: i64) -> StorageResult<()> {
        self.set_string(key, &value.to_string()).await
    }
}

/// SQLite implementation of PreferenceStore
#[derive(Debug, Clone)]
pub struct SqlitePreferenceStore {
    pool: SqlitePool,
    namespace: String,
}

impl SqlitePreferenceStore {
    /// Create a store bound to the default namespace
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_namespace(pool, PREFERENCES_NAMESPACE)
    }

    /// Create a store bound to a custom namespace
    pub fn with_namespace(pool: SqlitePool, namespace: impl Into<String>) -> Self {
        Self {
            pool,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    async fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        let value: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT value FROM preferences
            WHERE namespace = ? AND key = ?
            "#,
        )
        .bind(&self.namespace)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value.map(|(v,)| v))
    }

    async fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
        trace!(namespace = %self.namespace, key, value, "Writing preference");
        sqlx::query(
            r#"
            INSERT INTO preferences (namespace, key, value, updated_at)
            VALUES (?, ?, ?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            ON CONFLICT (namespace, key)
            DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.namespace)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        sqlx::query("DELETE FROM preferences WHERE namespace = ? AND key = ?")
            .bind(&self.namespace)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
