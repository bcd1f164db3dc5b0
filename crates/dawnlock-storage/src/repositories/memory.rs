use crate::error::{StorageError, StorageResult};
use crate::repositories::PreferenceStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-process PreferenceStore
///
/// Nothing is written to disk. Clones share the same map, so a test can
/// inspect what a component under test persisted. Writes to keys passed to
/// [`fail_writes_to`](Self::fail_writes_to) fail like a timed-out pool.
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferenceStore {
    values: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.values.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.lock().await.is_empty()
    }

    /// Make every later write to `key` fail.
    pub async fn fail_writes_to(&self, key: &str) {
        self.failing.lock().await.insert(key.to_string());
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    async fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.failing.lock().await.contains(key) {
            return Err(StorageError::Database(sqlx::Error::PoolTimedOut));
        }
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.values.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_values() {
        let store = MemoryPreferenceStore::new();
        let observer = store.clone();

        store.set_bool("ALARM_RINGING", true).await.unwrap();

        assert!(observer.get_bool("ALARM_RINGING", false).await.unwrap());
        assert_eq!(observer.len().await, 1);

        observer.remove("ALARM_RINGING").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_failing_key_rejects_writes_only() {
        let store = MemoryPreferenceStore::new();
        store.set_bool("SNOOZE_USED", true).await.unwrap();
        store.fail_writes_to("SNOOZE_USED").await;

        assert!(store.set_bool("SNOOZE_USED", false).await.is_err());
        assert!(store.get_bool("SNOOZE_USED", false).await.unwrap());
        store.set_bool("ALARM_RINGING", true).await.unwrap();
    }
}
