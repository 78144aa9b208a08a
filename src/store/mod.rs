//! Persistence of the single DDNS record.
//!
//! The store is a one-slot register: a write replaces the whole record and
//! every subscriber sees the new value.

mod file;
mod memory;

pub use file::FileConfigStore;
pub use memory::MemoryConfigStore;

use crate::error::Result;
use crate::model::DdnsConfig;
use async_trait::async_trait;
use tokio::sync::watch;

/// Id given to a record written without one.
pub const RECORD_ID: u64 = 1;

/// Edit applied by [`ConfigStore::update`]. Returning `None` leaves the
/// record untouched.
pub type RecordEdit = Box<dyn FnOnce(&DdnsConfig) -> Option<DdnsConfig> + Send>;

/// Trait for DDNS record stores.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Reactive read: the current record, then every later change.
    fn subscribe(&self) -> watch::Receiver<Option<DdnsConfig>>;

    /// Snapshot of the current record.
    async fn read(&self) -> Result<Option<DdnsConfig>> {
        let current = self.subscribe().borrow().clone();
        Ok(current)
    }

    /// Insert or replace the record. Returns the record as stored.
    async fn write(&self, config: DdnsConfig) -> Result<DdnsConfig>;

    /// Read-modify-write of the current record, atomic with respect to other
    /// writes on this store. Returns the stored record if `edit` produced one.
    async fn update(&self, edit: RecordEdit) -> Result<Option<DdnsConfig>>;

    /// Remove the record, if any.
    async fn delete(&self) -> Result<()>;
}

pub(crate) fn assign_id(mut config: DdnsConfig) -> DdnsConfig {
    if config.id == 0 {
        config.id = RECORD_ID;
    }
    config
}
