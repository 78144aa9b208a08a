//! Error types for noip-ddns.

use thiserror::Error;

/// Result type alias for noip-ddns.
pub type Result<T> = std::result::Result<T, DdnsError>;

/// DDNS error types.
///
/// Every failure of the update workflow ends up as one of these values; the
/// `Display` output is the human-readable reason shown to the user.
#[derive(Error, Debug)]
pub enum DdnsError {
    /// No DDNS record has been saved yet.
    #[error("configuration not found")]
    ConfigurationMissing,

    /// A required field is blank or malformed.
    #[error("{0}")]
    Validation(String),

    /// Interfaces were enumerated but none carries a global IPv6 address.
    #[error("no suitable IPv6 global address found")]
    NoGlobalAddress,

    /// The host refused to enumerate its interfaces.
    #[error("failed to enumerate network interfaces: {0}")]
    InterfaceEnumeration(String),

    /// Network/HTTP error before a provider response was received.
    #[error("Network error: {0}")]
    Transport(String),

    /// The provider answered with a non-2xx status.
    #[error("provider request failed with status {status} {reason}")]
    HttpStatus { status: u16, reason: String },

    /// The provider answered with a recognized failure code.
    #[error("{provider}: {message}")]
    ProviderRejected {
        provider: String,
        code: String,
        message: String,
    },

    /// The provider answered with a body outside its vocabulary.
    #[error("{provider}: unknown response - {body}")]
    UnknownResponse { provider: String, body: String },

    /// Another update is already running.
    #[error("an update is already in progress")]
    UpdateInProgress,

    /// The caller's deadline passed before the update finished.
    #[error("update deadline exceeded")]
    DeadlineExceeded,

    /// No client is registered for the configured provider.
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification of a [`DdnsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConfigurationMissing,
    Validation,
    AddressDiscovery,
    Transport,
    ProviderRejected,
    ProviderUnknownResponse,
    Busy,
    Cancelled,
    Unsupported,
    Storage,
}

impl DdnsError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DdnsError::ConfigurationMissing => ErrorKind::ConfigurationMissing,
            DdnsError::Validation(_) => ErrorKind::Validation,
            DdnsError::NoGlobalAddress | DdnsError::InterfaceEnumeration(_) => {
                ErrorKind::AddressDiscovery
            }
            DdnsError::Transport(_) | DdnsError::HttpStatus { .. } => ErrorKind::Transport,
            DdnsError::ProviderRejected { .. } => ErrorKind::ProviderRejected,
            DdnsError::UnknownResponse { .. } => ErrorKind::ProviderUnknownResponse,
            DdnsError::UpdateInProgress => ErrorKind::Busy,
            DdnsError::DeadlineExceeded => ErrorKind::Cancelled,
            DdnsError::UnsupportedProvider(_) => ErrorKind::Unsupported,
            DdnsError::Config(_) | DdnsError::Io(_) | DdnsError::Serialization(_) => {
                ErrorKind::Storage
            }
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        DdnsError::Validation(msg.into())
    }
}

impl From<reqwest::Error> for DdnsError {
    fn from(e: reqwest::Error) -> Self {
        let what = if e.is_timeout() {
            "request timed out"
        } else if e.is_connect() {
            "connection failed"
        } else if e.is_decode() || e.is_body() {
            "failed to read response body"
        } else {
            "request failed"
        };
        DdnsError::Transport(format!("{}: {}", what, e))
    }
}

impl From<toml::de::Error> for DdnsError {
    fn from(e: toml::de::Error) -> Self {
        DdnsError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for DdnsError {
    fn from(e: toml::ser::Error) -> Self {
        DdnsError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for DdnsError {
    fn from(e: serde_json::Error) -> Self {
        DdnsError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            DdnsError::ConfigurationMissing.to_string(),
            "configuration not found"
        );
        assert_eq!(
            DdnsError::NoGlobalAddress.to_string(),
            "no suitable IPv6 global address found"
        );
        let err = DdnsError::UnknownResponse {
            provider: "No-IP".to_string(),
            body: "xyz123".to_string(),
        };
        assert_eq!(err.to_string(), "No-IP: unknown response - xyz123");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            DdnsError::InterfaceEnumeration("EPERM".into()).kind(),
            ErrorKind::AddressDiscovery
        );
        assert_eq!(
            DdnsError::HttpStatus {
                status: 503,
                reason: "Service Unavailable".into()
            }
            .kind(),
            ErrorKind::Transport
        );
        assert_eq!(DdnsError::UpdateInProgress.kind(), ErrorKind::Busy);
    }
}
