//! DDNS update workflow.
//!
//! One call of [`DdnsUpdater::trigger_update`] runs, strictly in order:
//! read the stored record, validate it, detect the IPv6 address, call the
//! provider. Each step gates the next; any failure ends the run with the
//! matching [`DdnsError`].

use crate::detector::IpDetector;
use crate::error::{DdnsError, Result};
use crate::model::DdnsConfig;
use crate::providers::{ProviderRegistry, UpdateResult};
use crate::store::{ConfigStore, RecordEdit};
use std::future::Future;
use std::net::{IpAddr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::{Instant, MissedTickBehavior};

/// Orchestrates config store, address detection and providers.
pub struct DdnsUpdater {
    store: Arc<dyn ConfigStore>,
    detector: IpDetector,
    providers: ProviderRegistry,
    // Held for the whole run; a second trigger fails fast instead of queueing.
    in_flight: Mutex<()>,
}

impl DdnsUpdater {
    pub fn new(store: Arc<dyn ConfigStore>, detector: IpDetector, providers: ProviderRegistry) -> Self {
        Self {
            store,
            detector,
            providers,
            in_flight: Mutex::new(()),
        }
    }

    /// Run one update with the detected address.
    pub async fn trigger_update(&self) -> Result<UpdateResult> {
        self.run_exclusive(None, None).await
    }

    /// Run one update, giving up at `deadline`.
    pub async fn trigger_update_until(&self, deadline: Instant) -> Result<UpdateResult> {
        self.run_exclusive(None, Some(deadline)).await
    }

    /// Run one update with a caller-supplied address instead of detection.
    pub async fn trigger_update_with_address(&self, ip: Ipv6Addr) -> Result<UpdateResult> {
        self.run_exclusive(Some(ip), None).await
    }

    /// The address an update would publish right now.
    pub async fn current_public_ip(&self) -> Result<Ipv6Addr> {
        self.detector.detect_ipv6().await
    }

    /// Validate and persist a record.
    pub async fn save_config(&self, config: DdnsConfig) -> Result<DdnsConfig> {
        if config.hostname.trim().is_empty() {
            return Err(DdnsError::validation("hostname required"));
        }
        let stored = self.store.write(config).await?;
        tracing::info!("Saved DDNS configuration for {}", stored.hostname);
        Ok(stored)
    }

    /// The stored record, if any.
    pub async fn load_config(&self) -> Result<Option<DdnsConfig>> {
        self.store.read().await
    }

    /// Reactive view of the stored record.
    pub fn subscribe(&self) -> watch::Receiver<Option<DdnsConfig>> {
        self.store.subscribe()
    }

    async fn run_exclusive(
        &self,
        address: Option<Ipv6Addr>,
        deadline: Option<Instant>,
    ) -> Result<UpdateResult> {
        let _guard = self.in_flight.try_lock().map_err(|_| {
            tracing::warn!("Update requested while another is running");
            DdnsError::UpdateInProgress
        })?;

        // The deadline covers the provider exchange, not the stamp.
        let run = self.run_update(address);
        let result = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, run)
                .await
                .unwrap_or(Err(DdnsError::DeadlineExceeded)),
            None => run.await,
        };
        let result = match result {
            Ok((used, update)) => {
                self.stamp_success(&used, &update).await;
                Ok(update)
            }
            Err(e) => Err(e),
        };

        match &result {
            Ok(update) => tracing::info!(
                "DDNS update for {} succeeded ({})",
                update.hostname,
                if update.changed { "changed" } else { "unchanged" }
            ),
            Err(e) => tracing::warn!("DDNS update failed: {}", e),
        }
        result
    }

    async fn run_update(&self, address: Option<Ipv6Addr>) -> Result<(DdnsConfig, UpdateResult)> {
        let config = self
            .store
            .read()
            .await?
            .ok_or(DdnsError::ConfigurationMissing)?;

        let credentials = config.credentials();
        let hostname = config.hostname.trim();
        if hostname.is_empty()
            || credentials.username.trim().is_empty()
            || credentials.password.trim().is_empty()
        {
            return Err(DdnsError::validation("hostname/username/password required"));
        }

        let ip = match address {
            Some(ip) => ip,
            None => self.detector.detect_ipv6().await?,
        };

        let provider = self.providers.get(config.provider)?;
        tracing::debug!("Using provider {} for {}", config.provider, hostname);

        let result = provider
            .update(
                hostname,
                &credentials.username,
                &credentials.password,
                IpAddr::V6(ip),
            )
            .await?;

        Ok((config, result))
    }

    /// Record the success time on the stored record.
    ///
    /// A record replaced by a different hostname mid-update is left alone.
    /// Write failures are logged only; the DNS side already succeeded.
    async fn stamp_success(&self, used: &DdnsConfig, result: &UpdateResult) {
        let hostname = used.hostname.clone();
        let stamp = result.timestamp.timestamp_millis();
        let edit: RecordEdit = Box::new(move |current: &DdnsConfig| {
            (current.hostname == hostname).then(|| DdnsConfig {
                last_update_time: Some(stamp),
                ..current.clone()
            })
        });

        match self.store.update(edit).await {
            Ok(Some(_)) => {}
            Ok(None) => tracing::debug!("Record changed during update, not stamping"),
            Err(e) => tracing::warn!("Could not persist last update time: {}", e),
        }
    }

    /// Update now, then once per `interval`, until `shutdown` resolves.
    ///
    /// Shutdown is observed during a run too; the interrupted run is dropped.
    pub async fn run_periodic<F>(&self, interval: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut shutdown => break,
            }

            // A run may not spill into the next period.
            let deadline = Instant::now() + interval;
            tokio::select! {
                outcome = self.trigger_update_until(deadline) => {
                    if let Err(e) = outcome {
                        tracing::error!("Update failed: {}", e);
                    }
                }
                _ = &mut shutdown => break,
            }
        }

        tracing::info!("Shutting down");
    }
}
