//! noip-ddns - IPv6 dynamic DNS updater for No-IP.

use clap::{Parser, Subcommand};
use noip_ddns::config::Config;
use noip_ddns::detector::{parse_ipv6, IpDetector};
use noip_ddns::model::{DdnsConfig, ProviderKind};
use noip_ddns::providers::ProviderRegistry;
use noip_ddns::status::{ConfigEdits, DdnsController, OperationStatus, StatusTracker};
use noip_ddns::store::FileConfigStore;
use noip_ddns::updater::DdnsUpdater;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "noip-ddns")]
#[command(about = "Keep a No-IP hostname pointed at this device's IPv6 address")]
#[command(version)]
struct Cli {
    /// Path to settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the DDNS record file (overrides the settings file)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show stored record and current address
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Push the current address to the provider
    Update {
        /// Publish this address instead of the detected one
        #[arg(long)]
        ip: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the detected public IPv6 address
    Ip,

    /// Show or edit the stored record
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },

    /// Run as daemon (update now, then periodically)
    Daemon {
        /// Check interval in seconds
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the stored record (password masked)
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change fields of the stored record
    Set {
        #[arg(long)]
        provider: Option<ProviderKind>,
        #[arg(long)]
        hostname: Option<String>,
        #[arg(long)]
        username: Option<String>,
        /// Literal password, or `$VAR` to read it from the environment at update time
        #[arg(long)]
        password: Option<String>,
    },
}

fn get_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }

    // Default locations
    let candidates = [
        dirs::config_dir().map(|p| p.join("noip-ddns/config.toml")),
        Some(PathBuf::from("/etc/noip-ddns/config.toml")),
        Some(PathBuf::from("config.toml")),
    ];

    for candidate in candidates.into_iter().flatten() {
        if candidate.exists() {
            return candidate;
        }
    }

    // Return default even if it doesn't exist
    Config::default_path().unwrap_or_else(|_| PathBuf::from("config.toml"))
}

fn init_tracing(verbose: bool, daemon: bool) {
    let default = match (verbose, daemon) {
        (true, _) => "noip_ddns=debug,info",
        (false, true) => "info",
        (false, false) => "warn",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

struct App {
    settings: Config,
    updater: Arc<DdnsUpdater>,
    controller: DdnsController,
}

async fn build_app(settings: Config, store_override: Option<PathBuf>) -> anyhow::Result<App> {
    let store_path = match store_override {
        Some(path) => path,
        None => settings.record_path()?,
    };
    let store = Arc::new(FileConfigStore::open(&store_path).await?);
    tracing::debug!("Using record file {}", store.path().display());
    let registry = ProviderRegistry::from_config(&settings)?;
    let updater = Arc::new(DdnsUpdater::new(store, IpDetector::new(), registry));
    let controller = DdnsController::new(
        Arc::clone(&updater),
        StatusTracker::from_config(&settings.status),
    );

    Ok(App {
        settings,
        updater,
        controller,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, matches!(cli.command, Commands::Daemon { .. }));

    let config_path = get_config_path(cli.config);
    let settings = Config::load_from(&config_path)?;
    tracing::debug!("Using settings from {}", config_path.display());
    let app = build_app(settings, cli.store).await?;

    let ok = match cli.command {
        Commands::Status { json } => cmd_status(&app, json).await?,
        Commands::Update { ip, json } => cmd_update(&app, ip, json).await?,
        Commands::Ip => cmd_ip(&app).await,
        Commands::Config { action } => match action {
            ConfigCommand::Show { json } => cmd_config_show(&app, json).await?,
            ConfigCommand::Set {
                provider,
                hostname,
                username,
                password,
            } => {
                let edits = ConfigEdits {
                    provider,
                    hostname,
                    username,
                    password,
                };
                cmd_config_set(&app, edits).await
            }
        },
        Commands::Daemon { interval } => cmd_daemon(&app, interval).await?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn report(status: &OperationStatus) -> bool {
    match status {
        OperationStatus::Error { .. } => {
            eprintln!("{}", status);
            false
        }
        _ => {
            println!("{}", status);
            true
        }
    }
}

fn format_last_update(config: &DdnsConfig) -> String {
    config
        .last_update()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string())
}

async fn cmd_status(app: &App, json: bool) -> anyhow::Result<bool> {
    let config = app.updater.load_config().await?;
    let ip = app.controller.current_public_ip().await;

    if json {
        let value = serde_json::json!({
            "config": config.as_ref().map(DdnsConfig::masked),
            "last_update": config.as_ref().and_then(DdnsConfig::last_update),
            "public_ip": ip,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(true);
    }

    println!("noip-ddns Status");
    println!("================\n");

    match &config {
        Some(config) => {
            println!("Provider:    {}", config.provider);
            println!("Hostname:    {}", config.hostname);
            println!("Username:    {}", config.username);
            println!("Last update: {}", format_last_update(config));
        }
        None => println!("No DDNS record saved (use `noip-ddns config set`)"),
    }

    println!();
    match ip {
        OperationStatus::Success { message, .. } => println!("Current IPv6: {}", message),
        OperationStatus::Error { message, .. } => println!("Current IPv6: unavailable ({})", message),
        _ => {}
    }

    Ok(true)
}

async fn cmd_update(app: &App, ip: Option<String>, json: bool) -> anyhow::Result<bool> {
    let Some(ip) = ip else {
        let status = app.controller.trigger_update().await;
        if json {
            println!("{}", serde_json::to_string_pretty(&status)?);
            return Ok(status.is_success());
        }
        return Ok(report(&status));
    };

    let ip = parse_ipv6(&ip)?;
    match app.updater.trigger_update_with_address(ip).await {
        Ok(result) if json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(true)
        }
        Ok(result) => {
            println!(
                "DDNS update: {} -> {} ({})",
                result.hostname,
                result.ip,
                if result.changed { "updated" } else { "already up to date" }
            );
            Ok(true)
        }
        Err(e) => {
            eprintln!("DDNS update failed: {}", e);
            Ok(false)
        }
    }
}

async fn cmd_ip(app: &App) -> bool {
    match app.controller.current_public_ip().await {
        OperationStatus::Success { message, .. } => {
            println!("{}", message);
            true
        }
        status => report(&status),
    }
}

async fn cmd_config_show(app: &App, json: bool) -> anyhow::Result<bool> {
    let Some(config) = app.controller.load_config().await else {
        return Ok(report(&app.controller.current_status()));
    };
    let config = config.masked();

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("Provider:    {}", config.provider);
        println!("Hostname:    {}", config.hostname);
        println!("Username:    {}", config.username);
        println!("Password:    {}", config.password);
        println!("Last update: {}", format_last_update(&config));
    }
    Ok(true)
}

async fn cmd_config_set(app: &App, edits: ConfigEdits) -> bool {
    if edits.is_empty() {
        eprintln!("Nothing to change (see `noip-ddns config set --help`)");
        return false;
    }
    report(&app.controller.apply_edits(edits).await)
}

async fn cmd_daemon(app: &App, interval: Option<u64>) -> anyhow::Result<bool> {
    let interval = interval
        .map(Duration::from_secs)
        .unwrap_or_else(|| app.settings.check_interval());
    if interval.is_zero() {
        anyhow::bail!("interval must be greater than zero");
    }

    tracing::info!(
        "Starting noip-ddns daemon (interval: {}s)",
        interval.as_secs()
    );

    app.updater
        .run_periodic(interval, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;
    Ok(true)
}
