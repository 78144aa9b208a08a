//! In-memory record store.

use super::{assign_id, ConfigStore, RecordEdit};
use crate::error::Result;
use crate::model::DdnsConfig;
use async_trait::async_trait;
use tokio::sync::watch;

/// Record store that lives only as long as the process.
#[derive(Debug)]
pub struct MemoryConfigStore {
    tx: watch::Sender<Option<DdnsConfig>>,
}

impl MemoryConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Create a store already holding a record.
    pub fn with_config(config: DdnsConfig) -> Self {
        let (tx, _rx) = watch::channel(Some(assign_id(config)));
        Self { tx }
    }
}

impl Default for MemoryConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    fn subscribe(&self) -> watch::Receiver<Option<DdnsConfig>> {
        self.tx.subscribe()
    }

    async fn write(&self, config: DdnsConfig) -> Result<DdnsConfig> {
        let stored = assign_id(config);
        self.tx.send_replace(Some(stored.clone()));
        Ok(stored)
    }

    async fn update(&self, edit: RecordEdit) -> Result<Option<DdnsConfig>> {
        let mut stored = None;
        self.tx.send_if_modified(|slot| {
            let Some(next) = slot.as_ref().and_then(edit) else {
                return false;
            };
            let next = assign_id(next);
            stored = Some(next.clone());
            *slot = Some(next);
            true
        });
        Ok(stored)
    }

    async fn delete(&self) -> Result<()> {
        self.tx.send_replace(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_store() {
        let store = MemoryConfigStore::new();
        assert!(store.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = MemoryConfigStore::new();
        let config = DdnsConfig::new("h.ddns.net", "u", "p");

        let stored = store.write(config.clone()).await.unwrap();
        assert_eq!(stored.id, 1);

        let back = store.read().await.unwrap().unwrap();
        assert_eq!(back, DdnsConfig { id: 1, ..config });
        assert_eq!(back.last_update_time, None);
    }

    #[tokio::test]
    async fn test_write_replaces() {
        let store = MemoryConfigStore::new();
        store.write(DdnsConfig::new("a", "u", "p")).await.unwrap();
        store.write(DdnsConfig::new("b", "u", "p")).await.unwrap();

        let back = store.read().await.unwrap().unwrap();
        assert_eq!(back.hostname, "b");
        assert_eq!(back.id, 1);
    }

    #[tokio::test]
    async fn test_update_edits_current_record() {
        let store = MemoryConfigStore::new();
        let edited = store
            .update(Box::new(|c: &DdnsConfig| {
                Some(DdnsConfig {
                    last_update_time: Some(1),
                    ..c.clone()
                })
            }))
            .await
            .unwrap();
        assert!(edited.is_none());

        store.write(DdnsConfig::new("h", "u", "p")).await.unwrap();
        let edited = store
            .update(Box::new(|c: &DdnsConfig| {
                Some(DdnsConfig {
                    last_update_time: Some(7),
                    ..c.clone()
                })
            }))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(edited.hostname, "h");
        assert_eq!(store.read().await.unwrap(), Some(edited));

        let declined = store.update(Box::new(|_: &DdnsConfig| None)).await.unwrap();
        assert!(declined.is_none());
        assert_eq!(store.read().await.unwrap().unwrap().last_update_time, Some(7));
    }

    #[tokio::test]
    async fn test_subscribers_see_writes() {
        let store = MemoryConfigStore::new();
        let mut rx = store.subscribe();
        assert!(rx.borrow_and_update().is_none());

        store.write(DdnsConfig::new("h", "u", "p")).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().unwrap().hostname, "h");

        tokio_test::assert_ok!(store.delete().await);
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
