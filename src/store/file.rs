//! TOML file record store.

use super::{assign_id, ConfigStore, RecordEdit};
use crate::error::{DdnsError, Result};
use crate::model::DdnsConfig;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::{watch, Mutex};

/// Record store backed by a single TOML file.
///
/// A missing file means "no record". Writes go to a sibling temp file which
/// is then renamed over the target, so readers never see a torn record.
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    tx: watch::Sender<Option<DdnsConfig>>,
    write_lock: Mutex<()>,
}

impl FileConfigStore {
    /// Open the store, loading the record if the file exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let current = Self::load(&path).await?;
        tracing::debug!(
            "Opened record store at {} ({})",
            path.display(),
            if current.is_some() { "record present" } else { "empty" }
        );

        let (tx, _rx) = watch::channel(current);
        Ok(Self {
            path,
            tx,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(path: &Path) -> Result<Option<DdnsConfig>> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let config: DdnsConfig = toml::from_str(&content).map_err(|e| {
            DdnsError::Config(format!("Malformed record file {}: {}", path.display(), e))
        })?;
        Ok(Some(config))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    fn subscribe(&self) -> watch::Receiver<Option<DdnsConfig>> {
        self.tx.subscribe()
    }

    async fn write(&self, config: DdnsConfig) -> Result<DdnsConfig> {
        let _guard = self.write_lock.lock().await;
        self.persist(assign_id(config)).await
    }

    async fn update(&self, edit: RecordEdit) -> Result<Option<DdnsConfig>> {
        let _guard = self.write_lock.lock().await;
        let current = self.tx.borrow().clone();
        match current.as_ref().and_then(edit) {
            Some(next) => Ok(Some(self.persist(assign_id(next)).await?)),
            None => Ok(None),
        }
    }

    async fn delete(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.tx.send_replace(None);
        Ok(())
    }
}

impl FileConfigStore {
    /// Write `stored` to disk and publish it. Caller holds `write_lock`.
    async fn persist(&self, stored: DdnsConfig) -> Result<DdnsConfig> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let content = toml::to_string_pretty(&stored)?;
        let tmp = self.temp_path();
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;
        tracing::debug!("Wrote record for {} to {}", stored.hostname, self.path.display());

        self.tx.send_replace(Some(stored.clone()));
        Ok(stored)
    }
}
