//! Operation status for front ends.
//!
//! Front ends never see a raw [`DdnsError`](crate::DdnsError); they observe an
//! [`OperationStatus`] that moves `Idle -> InProgress -> Success | Error` and
//! falls back to `Idle` after a short display delay.

use crate::config::StatusConfig;
use crate::model::{DdnsConfig, ProviderKind};
use crate::updater::DdnsUpdater;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// User-triggered operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operation {
    LoadConfig,
    SaveConfig,
    Update,
    PublicIp,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Operation::LoadConfig => "load configuration",
            Operation::SaveConfig => "save configuration",
            Operation::Update => "DDNS update",
            Operation::PublicIp => "get public IP",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a front end should currently display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OperationStatus {
    Idle,
    InProgress {
        operation: Operation,
    },
    Success {
        operation: Operation,
        message: String,
    },
    Error {
        operation: Operation,
        message: String,
    },
}

impl OperationStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationStatus::Success { .. })
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, OperationStatus::InProgress { .. })
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationStatus::Idle => write!(f, "idle"),
            OperationStatus::InProgress { operation } => write!(f, "{}: in progress", operation),
            OperationStatus::Success { operation, message } => write!(f, "{}: {}", operation, message),
            OperationStatus::Error { operation, message } => {
                write!(f, "{} failed: {}", operation, message)
            }
        }
    }
}

/// Publishes status transitions and clears finished ones after a delay.
pub struct StatusTracker {
    tx: Arc<watch::Sender<OperationStatus>>,
    // Bumped on every transition so a stale auto-clear can tell it lost.
    generation: Arc<AtomicU64>,
    success_hold: Duration,
    error_hold: Duration,
}

impl StatusTracker {
    pub fn new(success_hold: Duration, error_hold: Duration) -> Self {
        let (tx, _rx) = watch::channel(OperationStatus::Idle);
        Self {
            tx: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
            success_hold,
            error_hold,
        }
    }

    pub fn from_config(config: &StatusConfig) -> Self {
        Self::new(
            Duration::from_secs(config.success_display_secs),
            Duration::from_secs(config.error_display_secs),
        )
    }

    pub fn subscribe(&self) -> watch::Receiver<OperationStatus> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> OperationStatus {
        self.tx.borrow().clone()
    }

    pub fn begin(&self, operation: Operation) {
        self.transition(OperationStatus::InProgress { operation });
    }

    pub fn succeed(&self, operation: Operation, message: impl Into<String>) -> OperationStatus {
        let status = OperationStatus::Success {
            operation,
            message: message.into(),
        };
        let generation = self.transition(status.clone());
        self.schedule_clear(generation, self.success_hold);
        status
    }

    pub fn fail(&self, operation: Operation, message: impl Into<String>) -> OperationStatus {
        let status = OperationStatus::Error {
            operation,
            message: message.into(),
        };
        let generation = self.transition(status.clone());
        self.schedule_clear(generation, self.error_hold);
        status
    }

    /// Back to idle immediately.
    pub fn reset(&self) {
        self.transition(OperationStatus::Idle);
    }

    fn transition(&self, status: OperationStatus) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_replace(status);
        generation
    }

    fn schedule_clear(&self, generation: u64, after: Duration) {
        let tx = Arc::clone(&self.tx);
        let current = Arc::clone(&self.generation);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            tx.send_if_modified(|status| {
                if current.load(Ordering::SeqCst) == generation {
                    *status = OperationStatus::Idle;
                    true
                } else {
                    false
                }
            });
        });
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::from_config(&StatusConfig::default())
    }
}

/// Field-level edits to the DDNS record, applied together on save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigEdits {
    pub provider: Option<ProviderKind>,
    pub hostname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ConfigEdits {
    pub fn is_empty(&self) -> bool {
        self.provider.is_none()
            && self.hostname.is_none()
            && self.username.is_none()
            && self.password.is_none()
    }

    /// Overlay the edits on `base`.
    pub fn apply(self, mut base: DdnsConfig) -> DdnsConfig {
        if let Some(provider) = self.provider {
            base.provider = provider;
        }
        if let Some(hostname) = self.hostname {
            base.hostname = hostname;
        }
        if let Some(username) = self.username {
            base.username = username;
        }
        if let Some(password) = self.password {
            base.password = password;
        }
        base
    }
}

/// Front-end facade: runs operations and reports them through a tracker.
pub struct DdnsController {
    updater: Arc<DdnsUpdater>,
    status: StatusTracker,
}

impl DdnsController {
    pub fn new(updater: Arc<DdnsUpdater>, status: StatusTracker) -> Self {
        Self { updater, status }
    }

    pub fn status(&self) -> watch::Receiver<OperationStatus> {
        self.status.subscribe()
    }

    pub fn current_status(&self) -> OperationStatus {
        self.status.current()
    }

    pub fn reset(&self) {
        self.status.reset();
    }

    /// Load the stored record. `None` both when absent and on error; the
    /// status tells the two apart.
    pub async fn load_config(&self) -> Option<DdnsConfig> {
        self.status.begin(Operation::LoadConfig);
        match self.updater.load_config().await {
            Ok(Some(config)) => {
                self.status.succeed(Operation::LoadConfig, "configuration loaded");
                Some(config)
            }
            Ok(None) => {
                self.status
                    .succeed(Operation::LoadConfig, "no configuration saved yet");
                None
            }
            Err(e) => {
                self.status.fail(Operation::LoadConfig, e.to_string());
                None
            }
        }
    }

    pub async fn save_config(&self, config: DdnsConfig) -> OperationStatus {
        self.status.begin(Operation::SaveConfig);
        match self.updater.save_config(config).await {
            Ok(_) => self
                .status
                .succeed(Operation::SaveConfig, "configuration saved"),
            Err(e) => self.status.fail(Operation::SaveConfig, e.to_string()),
        }
    }

    /// Apply edits to the stored record (or a blank one) and save once.
    pub async fn apply_edits(&self, edits: ConfigEdits) -> OperationStatus {
        let base = match self.updater.load_config().await {
            Ok(current) => current.unwrap_or_default(),
            Err(e) => return self.status.fail(Operation::SaveConfig, e.to_string()),
        };
        self.save_config(edits.apply(base)).await
    }

    pub async fn trigger_update(&self) -> OperationStatus {
        self.status.begin(Operation::Update);
        match self.updater.trigger_update().await {
            Ok(result) => {
                let detail = if result.changed {
                    "updated"
                } else {
                    "already up to date"
                };
                self.status.succeed(
                    Operation::Update,
                    format!("{} -> {} ({})", result.hostname, result.ip, detail),
                )
            }
            Err(e) => self.status.fail(Operation::Update, e.to_string()),
        }
    }

    pub async fn current_public_ip(&self) -> OperationStatus {
        self.status.begin(Operation::PublicIp);
        match self.updater.current_public_ip().await {
            Ok(ip) => self.status.succeed(Operation::PublicIp, ip.to_string()),
            Err(e) => self.status.fail(
                Operation::PublicIp,
                format!("could not determine public IPv6 address: {}", e),
            ),
        }
    }
}
