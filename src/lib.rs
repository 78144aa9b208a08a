//! # noip-ddns
//!
//! Keeps a No-IP hostname pointed at this device's global IPv6 address.
//!
//! ## Features
//!
//! - IPv6 detection from local network interfaces (no lookup service)
//! - No-IP dynamic update protocol with typed response handling
//! - Single stored DDNS record, in memory or in a TOML file
//! - Operation status with auto-clearing success/error states
//! - Daemon mode with configurable check interval
//!
//! ## Usage
//!
//! ```bash
//! # Save the record
//! noip-ddns config set --hostname myhost.ddns.net --username me --password '$NOIP_PASSWORD'
//!
//! # Show the address that would be published
//! noip-ddns ip
//!
//! # Push it to No-IP
//! noip-ddns update
//!
//! # Keep it updated
//! noip-ddns daemon
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod model;
pub mod providers;
pub mod status;
pub mod store;
pub mod updater;

pub use config::Config;
pub use detector::IpDetector;
pub use error::{DdnsError, ErrorKind, Result};
pub use model::{DdnsConfig, ProviderKind};
pub use status::{DdnsController, OperationStatus};
pub use updater::DdnsUpdater;
