//! Systemd lifecycle notifications
//!
//! sd-notify integration for Type=notify units: readiness, shutdown and
//! status messages, plus the watchdog keepalive task. Every call is a
//! no-op when NOTIFY_SOCKET is absent, so the daemon behaves identically
//! outside systemd.

use anyhow::{Context, Result};
use std::env;
use std::os::unix::net::UnixDatagram;
use tracing::{debug, error, info};

/// Send one sd-notify state line if running under systemd.
///
/// Returns whether anything was sent, so callers can log only when the
/// notification actually went out.
fn notify(state: &str) -> Result<bool> {
    let Ok(socket_path) = env::var("NOTIFY_SOCKET") else {
        return Ok(false);
    };
    let socket = UnixDatagram::unbound().context("Failed to create notify socket")?;
    socket
        .send_to(state.as_bytes(), &socket_path)
        .with_context(|| format!("Failed to send {} to systemd", state))?;
    Ok(true)
}

/// Report the service ready to accept control connections.
pub fn notify_ready() -> Result<()> {
    if notify("READY=1")? {
        info!("Notified systemd: ready");
    }
    Ok(())
}

/// Report the start of the shutdown sequence.
pub fn notify_stopping() -> Result<()> {
    if notify("STOPPING=1")? {
        info!("Notified systemd: stopping");
    }
    Ok(())
}

/// Publish a status line for `systemctl status` output.
pub fn notify_status(status: &str) -> Result<()> {
    if notify(&format!("STATUS={}", status))? {
        debug!("Notified systemd: status = {}", status);
    }
    Ok(())
}

/// Send a watchdog keepalive.
pub fn notify_watchdog() -> Result<()> {
    notify("WATCHDOG=1")?;
    Ok(())
}

/// Watchdog timeout configured by systemd, in microseconds.
///
/// None when the watchdog is not enabled or not running under systemd.
pub fn get_watchdog_timeout() -> Option<u64> {
    env::var("WATCHDOG_USEC").ok().and_then(|s| s.parse().ok())
}

/// Whether the process was started by systemd with Type=notify.
pub fn is_systemd() -> bool {
    env::var("NOTIFY_SOCKET").is_ok()
}

/// Spawn the periodic watchdog keepalive task.
///
/// Sends WATCHDOG=1 at half the configured interval, skipping missed
/// ticks. Returns an already-finished task when the watchdog is not
/// enabled, so callers can hold and abort the handle unconditionally.
pub async fn spawn_watchdog_task() -> Result<tokio::task::JoinHandle<()>> {
    let Some(timeout_usec) = get_watchdog_timeout() else {
        debug!("Systemd watchdog not enabled");
        return Ok(tokio::spawn(async {}));
    };

    let interval_secs = (timeout_usec / 1_000_000) / 2;
    let interval = std::time::Duration::from_secs(interval_secs.max(1));
    info!(
        "Systemd watchdog enabled, keepalive every {}s",
        interval.as_secs()
    );

    Ok(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(e) = notify_watchdog() {
                error!("Failed to send watchdog keepalive: {:#}", e);
            }
        }
    }))
}
