//! mobdev daemon
//!
//! Privileged device-control daemon. Owns the USB classifier, the network
//! interface controller, the notification state machine and the helper
//! bridge, and serves the dispatch protocol to unprivileged callers over a
//! Unix control socket.

mod config;
mod control;
mod dispatch;
mod helper;
mod netif;
mod notify;
mod service;
mod usb;

use anyhow::{Context, Result};
use clap::Parser;
use common::setup_logging;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use usb::DeviceEnumerator;

#[derive(Parser, Debug)]
#[command(name = "mobdevd")]
#[command(author, version, about = "Device-control daemon for phone-like USB devices")]
#[command(long_about = "
Privileged daemon mediating access to attached phone-like USB devices:
detection, file transfer through the helper bridge, tethering interface
control, notification forwarding, and call/media control.

EXAMPLES:
    # Run in the foreground with default config
    mobdevd

    # Run with a custom config
    mobdevd --config /path/to/daemon.toml

    # Probe for a phone-like device and exit
    mobdevd --detect

    # Run as a systemd service
    mobdevd --service

    # Run with debug logging
    mobdevd --log-level debug

CONFIGURATION:
    The daemon looks for configuration in the following order:
    1. Path specified with --config
    2. ~/.config/mobdev/daemon.toml
    3. /etc/mobdev/daemon.toml
    4. Built-in defaults

For more information, visit: https://github.com/mobdev-rs/mobdev
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Save default configuration to the default location and exit
    #[arg(long)]
    save_config: bool,

    /// Run as systemd service (watchdog and readiness notifications)
    #[arg(long)]
    service: bool,

    /// Probe for a phone-like USB device, report, and exit
    #[arg(long)]
    detect: bool,

    /// Control socket path (overrides config)
    #[arg(short, long, value_name = "PATH")]
    socket: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.save_config {
        let config = config::DaemonConfig::default();
        let path = config::DaemonConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let config = if let Some(ref path) = args.config {
        config::DaemonConfig::load(Some(path.clone())).context("Failed to load configuration")?
    } else {
        config::DaemonConfig::load_or_default()
    };

    let log_level = args.log_level.as_deref().unwrap_or(&config.daemon.log_level);
    setup_logging(log_level).context("Failed to set up logging")?;

    info!("mobdevd v{}", env!("CARGO_PKG_VERSION"));

    if args.detect {
        return detect_mode(&config);
    }

    let socket_path = match &args.socket {
        Some(path) => path.clone(),
        None => config.socket_path(),
    };
    let service_mode = args.service || config.daemon.service_mode;

    run_daemon(config, socket_path, service_mode).await
}

/// Probe once for a phone-like device and exit 0 (found) or 1 (not found).
fn detect_mode(config: &config::DaemonConfig) -> Result<()> {
    let policy = config.detection_policy()?;
    let enumerator = usb::RusbEnumerator::new().context("Failed to open USB context")?;

    let devices = enumerator.snapshot();
    info!(
        "Scanned {} attached devices under the {} policy",
        devices.len(),
        policy.name()
    );

    if policy.any_phone_like(&devices) {
        println!("Phone-like device detected.");
        Ok(())
    } else {
        println!("No phone-like device detected.");
        std::process::exit(1);
    }
}

/// Bring up the dispatcher and serve the control socket until Ctrl+C.
async fn run_daemon(
    config: config::DaemonConfig,
    socket_path: PathBuf,
    service_mode: bool,
) -> Result<()> {
    let policy = config.detection_policy()?;
    info!("Detection strategy: {}", policy.name());
    info!("Helper bridge: {}", config.helper.program);

    let enumerator = Arc::new(usb::RusbEnumerator::new().context("Failed to open USB context")?);
    let registry = Arc::new(netif::SysInterfaceRegistry::new());
    let bridge = Arc::new(helper::AdbBridge::new(
        config.helper.program.clone(),
        config.helper.remote_dir.clone(),
    ));
    let dispatcher = Arc::new(dispatch::Dispatcher::new(
        enumerator,
        policy,
        netif::InterfaceController::new(registry),
        notify::Notifications::new(Arc::new(notify::LogSink)),
        bridge,
    ));

    let server = control::ControlServer::bind(&socket_path, dispatcher)
        .context("Failed to bind control socket")?;

    let watchdog_handle = if service_mode {
        if service::is_systemd() {
            info!("Running under systemd");
        }
        let handle = service::spawn_watchdog_task()
            .await
            .context("Failed to spawn watchdog task")?;
        service::notify_ready().context("Failed to notify systemd ready")?;
        service::notify_status("Running - control socket open")
            .context("Failed to send status to systemd")?;
        Some(handle)
    } else {
        None
    };

    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Control server error: {:#}", e);
        }
    });

    info!("Press Ctrl+C to shut down");
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => error!("Error waiting for Ctrl+C: {}", e),
    }

    if service_mode {
        service::notify_stopping().context("Failed to notify systemd stopping")?;
    }
    if let Some(handle) = watchdog_handle {
        handle.abort();
    }
    server_handle.abort();

    info!("Shutdown complete");
    Ok(())
}
