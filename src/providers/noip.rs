//! No-IP dynamic update provider.
//!
//! Speaks the dyndns2-style protocol: an authenticated GET against
//! `/nic/update` answered with a one-line plain-text status.

use super::{DdnsProvider, UpdateResult};
use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::net::IpAddr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://dynupdate.no-ip.com";

const PROVIDER_NAME: &str = "No-IP";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Classified body of a 2xx No-IP answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoIpResponse {
    /// `good <ip>`: record changed.
    Good(String),
    /// `nochg <ip>`: record already pointed there.
    NoChange(String),
    BadAuth,
    BadAgent,
    NotDonator,
    Abuse,
    ServerError,
    Unknown(String),
}

impl NoIpResponse {
    /// Classify a response body. Surrounding whitespace is ignored.
    pub fn parse(body: &str) -> Self {
        let body = body.trim();
        if body.starts_with("good") {
            return NoIpResponse::Good(body.to_string());
        }
        if body.starts_with("nochg") {
            return NoIpResponse::NoChange(body.to_string());
        }
        match body {
            "badauth" => NoIpResponse::BadAuth,
            "badagent" => NoIpResponse::BadAgent,
            "!donator" => NoIpResponse::NotDonator,
            "abuse" => NoIpResponse::Abuse,
            "911" => NoIpResponse::ServerError,
            other => NoIpResponse::Unknown(other.to_string()),
        }
    }

    /// Provider status code for the rejections, as sent on the wire.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            NoIpResponse::BadAuth => Some("badauth"),
            NoIpResponse::BadAgent => Some("badagent"),
            NoIpResponse::NotDonator => Some("!donator"),
            NoIpResponse::Abuse => Some("abuse"),
            NoIpResponse::ServerError => Some("911"),
            _ => None,
        }
    }

    fn rejection_message(&self) -> &'static str {
        match self {
            NoIpResponse::BadAuth => "invalid username or password",
            NoIpResponse::BadAgent => "client disabled by provider, contact No-IP support",
            NoIpResponse::NotDonator => "feature not available for this account",
            NoIpResponse::Abuse => "account blocked for abuse",
            NoIpResponse::ServerError => "provider server error, try again later",
            _ => "",
        }
    }

    /// `Ok(changed)` for success answers, the matching error otherwise.
    pub fn into_result(self) -> Result<bool> {
        match self {
            NoIpResponse::Good(_) => Ok(true),
            NoIpResponse::NoChange(_) => Ok(false),
            NoIpResponse::Unknown(body) => Err(DdnsError::UnknownResponse {
                provider: PROVIDER_NAME.to_string(),
                body: if body.is_empty() {
                    "empty response".to_string()
                } else {
                    body
                },
            }),
            rejected => Err(DdnsError::ProviderRejected {
                provider: PROVIDER_NAME.to_string(),
                code: rejected.code().unwrap_or_default().to_string(),
                message: rejected.rejection_message().to_string(),
            }),
        }
    }
}

/// No-IP provider.
#[derive(Debug, Clone)]
pub struct NoIpProvider {
    client: reqwest::Client,
    base_url: String,
}

impl NoIpProvider {
    /// Create with custom base URL (for testing).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::with_options(
            base_url.into(),
            DEFAULT_TIMEOUT,
            concat!("noip-ddns/", env!("CARGO_PKG_VERSION")),
        )
    }

    /// Create with explicit endpoint, timeout and user agent.
    pub fn with_options(base_url: String, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| DdnsError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn update_url(&self) -> String {
        format!("{}/nic/update", self.base_url)
    }
}

/// `Basic base64(user:pass)` header value.
pub fn basic_auth_header(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", username, password))
    )
}

#[async_trait]
impl DdnsProvider for NoIpProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn update(
        &self,
        hostname: &str,
        username: &str,
        password: &str,
        ip: IpAddr,
    ) -> Result<UpdateResult> {
        tracing::info!("Updating {} to {} via {}", hostname, ip, PROVIDER_NAME);

        let myip = ip.to_string();
        let response = self
            .client
            .get(self.update_url())
            .header(
                reqwest::header::AUTHORIZATION,
                basic_auth_header(username, password),
            )
            .query(&[("hostname", hostname), ("myip", myip.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("{} answered HTTP {}", PROVIDER_NAME, status);
            return Err(DdnsError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let body = response.text().await?;
        tracing::debug!("{} response: {}", PROVIDER_NAME, body.trim());

        let changed = NoIpResponse::parse(&body).into_result()?;
        Ok(UpdateResult {
            provider: PROVIDER_NAME.to_string(),
            hostname: hostname.to_string(),
            ip,
            changed,
            response: body.trim().to_string(),
            timestamp: chrono::Utc::now(),
        })
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_success_prefixes() {
        assert!(NoIpResponse::parse("good 203.0.113.5").into_result().unwrap());
        assert!(NoIpResponse::parse("good").into_result().unwrap());
        assert!(!NoIpResponse::parse("nochg 2001:db8::1\n").into_result().unwrap());
        assert!(NoIpResponse::parse("goodbye").into_result().unwrap());
    }

    #[test]
    fn test_rejections_are_specific() {
        let cases = [
            ("badauth", "invalid username or password"),
            ("badagent", "client disabled"),
            ("!donator", "not available for this account"),
            ("abuse", "blocked for abuse"),
            ("911", "try again later"),
        ];
        for (body, expected) in cases {
            let err = NoIpResponse::parse(body).into_result().unwrap_err();
            let message = err.to_string();
            assert!(message.contains(expected), "{}: {}", body, message);
            assert!(!message.contains("unknown response"));
            match err {
                DdnsError::ProviderRejected { code, .. } => assert_eq!(code, body),
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn test_unknown_keeps_body() {
        let err = NoIpResponse::parse("xyz123").into_result().unwrap_err();
        assert!(err.to_string().contains("xyz123"));

        let err = NoIpResponse::parse("").into_result().unwrap_err();
        assert!(err.to_string().contains("empty response"));
    }

    #[test]
    fn test_rejections_require_exact_body() {
        assert_eq!(
            NoIpResponse::parse("badauth please"),
            NoIpResponse::Unknown("badauth please".to_string())
        );
    }

    #[test]
    fn test_basic_auth_header() {
        assert_eq!(basic_auth_header("u", "p"), "Basic dTpw");
        assert_eq!(
            basic_auth_header("user@example.com", "pässwörd"),
            format!("Basic {}", STANDARD.encode("user@example.com:pässwörd".as_bytes()))
        );
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let provider = NoIpProvider::with_base_url("http://localhost:1/").unwrap();
        assert_eq!(provider.update_url(), "http://localhost:1/nic/update");
    }
}
