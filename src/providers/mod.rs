//! DDNS provider implementations.

pub mod noip;


pub use noip::{NoIpProvider, NoIpResponse};

use crate::config::Config;
use crate::error::{DdnsError, Result};
use crate::model::ProviderKind;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

/// Result of a successful DNS update.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateResult {
    /// Provider name.
    pub provider: String,
    /// Hostname that was updated.
    pub hostname: String,
    /// Address sent to the provider.
    pub ip: IpAddr,
    /// `false` when the provider already had this address.
    pub changed: bool,
    /// Raw provider answer.
    pub response: String,
    /// Timestamp of the update.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Trait for DDNS providers.
///
/// Implementations hold no per-account state; credentials travel with each
/// call so one instance serves whatever record is currently stored.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DdnsProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &'static str;

    /// Point `hostname` at `ip`.
    ///
    /// Every failure, transport or provider-side, comes back as `Err`.
    async fn update(
        &self,
        hostname: &str,
        username: &str,
        password: &str,
        ip: IpAddr,
    ) -> Result<UpdateResult>;
}

/// Providers keyed by their record tag.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn DdnsProvider>>,
}

impl ProviderRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in provider configured from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(ProviderKind::NoIp, create_provider(ProviderKind::NoIp, config)?);
        Ok(registry)
    }

    /// Add or replace the provider for `kind`.
    pub fn register(&mut self, kind: ProviderKind, provider: Arc<dyn DdnsProvider>) {
        self.providers.insert(kind, provider);
    }

    /// Look up the provider for `kind`.
    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn DdnsProvider>> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or_else(|| DdnsError::UnsupportedProvider(kind.to_string()))
    }
}

/// Create a provider from settings.
pub fn create_provider(kind: ProviderKind, config: &Config) -> Result<Arc<dyn DdnsProvider>> {
    match kind {
        ProviderKind::NoIp => Ok(Arc::new(NoIpProvider::with_options(
            config.noip.base_url.clone(),
            config.http_timeout(),
            &config.user_agent,
        )?)),
    }
}
