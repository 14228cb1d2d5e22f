use crate::domain::CacheEntry;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Map of item -> cached entry behind a single exclusive lock
///
/// Reads and writes both take the same guard, and the guard is only ever held
/// for the duration of one map operation, never across a call to the source.
#[derive(Clone, Default)]
pub struct PriceStore {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl PriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, item: &str) -> Option<CacheEntry> {
        let entries = self.entries.lock().await;
        entries.get(item).copied()
    }

    /// Store an entry, returning the one it replaced
    pub async fn insert(&self, item: &str, entry: CacheEntry) -> Option<CacheEntry> {
        let mut entries = self.entries.lock().await;
        entries.insert(item.to_string(), entry)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl Debug for PriceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entry_count = match self.entries.try_lock() {
            Ok(entries) => entries.len().to_string(),
            Err(_) => "<locked>".to_string(),
        };

        f.debug_struct("PriceStore")
            .field("entries", &entry_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_then_get() {
        let store = PriceStore::new();
        assert!(store.is_empty().await);

        let previous = store.insert("apple", CacheEntry::fetched_now(1.5)).await;
        assert!(previous.is_none());

        let entry = store.get("apple").await.unwrap();
        assert_eq!(entry.value, 1.5);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn get_missing_item() {
        let store = PriceStore::new();
        assert!(store.get("nothing").await.is_none());
    }

    #[tokio::test]
    async fn insert_overwrites_and_returns_previous() {
        let store = PriceStore::new();
        store.insert("pear", CacheEntry::fetched_now(1.0)).await;

        let previous = store.insert("pear", CacheEntry::fetched_now(2.0)).await;
        assert_eq!(previous.map(|e| e.value), Some(1.0));
        assert_eq!(store.get("pear").await.map(|e| e.value), Some(2.0));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let store = PriceStore::new();
        let other = store.clone();
        other.insert("plum", CacheEntry::fetched_now(3.0)).await;
        assert_eq!(store.get("plum").await.map(|e| e.value), Some(3.0));
    }
}
