//! The persisted DDNS record.

use crate::error::DdnsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dynamic DNS provider protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "NoIP")]
    NoIp,
}

impl ProviderKind {
    /// Tag as stored in the record.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::NoIp => "NoIP",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = DdnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "noip" | "no-ip" => Ok(ProviderKind::NoIp),
            other => Err(DdnsError::validation(format!("unknown provider: {}", other))),
        }
    }
}

/// The single DDNS configuration record.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Assigned by the store.
    #[serde(default)]
    pub id: u64,

    #[serde(default)]
    pub provider: ProviderKind,

    /// DNS name to update, e.g. "myhost.ddns.net".
    pub hostname: String,

    /// Account username (or `$VAR` to read it from the environment).
    pub username: String,

    /// Account password (or `$VAR` to read it from the environment).
    pub password: String,

    /// Epoch milliseconds of the last successful update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<i64>,
}

impl fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"***")
            .field("last_update_time", &self.last_update_time)
            .finish()
    }
}

/// Credentials after `$VAR` resolution.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl DdnsConfig {
    /// Create a record for the default provider.
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// Resolve the credential pair against the environment.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: resolve_env(&self.username),
            password: resolve_env(&self.password),
        }
    }

    /// Last update as a UTC timestamp.
    pub fn last_update(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.last_update_time
            .and_then(chrono::DateTime::from_timestamp_millis)
    }

    /// Password replaced by asterisks, for display.
    pub fn masked(&self) -> Self {
        let password = if self.password.is_empty() {
            String::new()
        } else if self.password.starts_with('$') {
            self.password.clone()
        } else {
            "********".to_string()
        };
        Self {
            password,
            ..self.clone()
        }
    }
}

/// Resolve environment variable references (values starting with $).
pub(crate) fn resolve_env(value: &str) -> String {
    if let Some(var_name) = value.strip_prefix('$') {
        std::env::var(var_name).unwrap_or_else(|_| {
            tracing::warn!("Environment variable {} not set", var_name);
            value.to_string()
        })
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_tag_roundtrip() {
        let config = DdnsConfig::new("h.ddns.net", "u", "p");
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("provider = \"NoIP\""));
        let back: DdnsConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("NoIP".parse::<ProviderKind>().unwrap(), ProviderKind::NoIp);
        assert_eq!("no-ip".parse::<ProviderKind>().unwrap(), ProviderKind::NoIp);
        let err = "cloudflare".parse::<ProviderKind>().unwrap_err();
        assert!(err.to_string().contains("cloudflare"));
    }

    #[test]
    fn test_unknown_provider_tag_rejected() {
        let text = r#"
            provider = "Dyn"
            hostname = "h"
            username = "u"
            password = "p"
        "#;
        assert!(toml::from_str::<DdnsConfig>(text).is_err());
    }

    #[test]
    fn test_debug_hides_password() {
        let config = DdnsConfig::new("h.ddns.net", "u", "hunter2");
        assert!(!format!("{:?}", config).contains("hunter2"));
        assert_eq!(config.masked().password, "********");
    }

    #[test]
    fn test_resolve_env() {
        assert_eq!(resolve_env("plain_value"), "plain_value");
        std::env::set_var("TEST_NOIP_DDNS_VAR", "resolved_value");
        assert_eq!(resolve_env("$TEST_NOIP_DDNS_VAR"), "resolved_value");
        std::env::remove_var("TEST_NOIP_DDNS_VAR");
        assert_eq!(resolve_env("$NONEXISTENT_VAR_12345"), "$NONEXISTENT_VAR_12345");
    }

    #[test]
    fn test_last_update() {
        let mut config = DdnsConfig::new("h", "u", "p");
        assert!(config.last_update().is_none());
        config.last_update_time = Some(1_700_000_000_000);
        assert_eq!(config.last_update().unwrap().timestamp(), 1_700_000_000);
    }
}
