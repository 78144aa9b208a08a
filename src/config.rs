//! Application settings for noip-ddns.
//!
//! These are read-only knobs for the binary (timeouts, endpoints, where the
//! DDNS record lives). The DDNS record itself is handled by [`crate::store`].

use crate::error::{DdnsError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Check interval in seconds for daemon mode (default: 300 = 5 minutes).
    #[serde(default = "default_interval")]
    pub check_interval_secs: u64,

    /// Where the DDNS record is stored. Defaults to the user config dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    /// Connect and request timeout for provider calls.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// User-Agent sent to providers.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// No-IP endpoint settings.
    #[serde(default)]
    pub noip: NoIpConfig,

    /// Operation status display settings.
    #[serde(default)]
    pub status: StatusConfig,
}

fn default_interval() -> u64 {
    300
}

fn default_http_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("noip-ddns/{}", env!("CARGO_PKG_VERSION"))
}

/// No-IP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoIpConfig {
    #[serde(default = "default_noip_base_url")]
    pub base_url: String,
}

fn default_noip_base_url() -> String {
    crate::providers::noip::DEFAULT_BASE_URL.to_string()
}

impl Default for NoIpConfig {
    fn default() -> Self {
        Self {
            base_url: default_noip_base_url(),
        }
    }
}

/// How long a finished operation stays visible before clearing to idle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default = "default_success_secs")]
    pub success_display_secs: u64,

    #[serde(default = "default_error_secs")]
    pub error_display_secs: u64,
}

fn default_success_secs() -> u64 {
    3
}

fn default_error_secs() -> u64 {
    5
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            success_display_secs: default_success_secs(),
            error_display_secs: default_error_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            check_interval_secs: default_interval(),
            store_path: None,
            http_timeout_secs: default_http_timeout(),
            user_agent: default_user_agent(),
            noip: NoIpConfig::default(),
            status: StatusConfig::default(),
        }
    }
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DdnsError::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("noip-ddns").join("config.toml"))
    }

    /// Load configuration from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.check_interval_secs == 0 {
            return Err(DdnsError::Config(
                "check_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.http_timeout_secs == 0 {
            return Err(DdnsError::Config(
                "http_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved location of the DDNS record file.
    pub fn record_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.store_path {
            return Ok(path.clone());
        }
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DdnsError::Config("Could not find config directory".to_string()))?;
        Ok(config_dir.join("noip-ddns").join("ddns.toml"))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.check_interval_secs, 300);
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
        assert_eq!(config.noip.base_url, "https://dynupdate.no-ip.com");
        assert_eq!(config.status.success_display_secs, 3);
        assert_eq!(config.status.error_display_secs, 5);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "check_interval_secs = 60\n[noip]\nbase_url = \"http://localhost:8080\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.check_interval_secs, 60);
        assert_eq!(config.noip.base_url, "http://localhost:8080");
        assert_eq!(config.http_timeout_secs, 30);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.check_interval_secs, 300);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "check_interval_secs = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.store_path = Some(dir.path().join("ddns.toml"));
        config.save_to(&path).unwrap();

        let back = Config::load_from(&path).unwrap();
        assert_eq!(back.store_path, config.store_path);
        assert_eq!(back.record_path().unwrap(), dir.path().join("ddns.toml"));
    }
}
