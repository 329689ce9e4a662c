//! Notification forwarding state
//!
//! A two-state machine guarding whether device notifications are forwarded
//! to the host. Transitions are serialized by an internal lock, and the
//! side effect for a transition runs while the lock is still held, so
//! effects are observed in transition order and a request for the current
//! state does nothing at all.

use std::sync::{Arc, Mutex};
use tracing::info;

/// What a set-notifications call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The state already matched the request; no side effect ran.
    Noop,
    /// Forwarding switched from disabled to enabled.
    Enabled,
    /// Forwarding switched from enabled to disabled.
    Disabled,
}

/// Side effects to run when forwarding flips.
///
/// Called with the state lock held, so effects for successive transitions
/// never interleave.
pub trait NotificationSink: Send + Sync {
    fn activated(&self);
    fn deactivated(&self);
}

/// Sink that only logs transitions.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn activated(&self) {
        info!("Notification forwarding activated");
    }

    fn deactivated(&self) {
        info!("Notification forwarding deactivated");
    }
}

/// Notification forwarding state machine. Starts disabled.
pub struct Notifications {
    enabled: Mutex<bool>,
    sink: Arc<dyn NotificationSink>,
}

impl Notifications {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            enabled: Mutex::new(false),
            sink,
        }
    }

    /// Request forwarding on or off, reporting what changed.
    pub fn set_enabled(&self, enable: bool) -> Transition {
        let mut enabled = self.enabled.lock().unwrap();
        if *enabled == enable {
            return Transition::Noop;
        }
        *enabled = enable;
        if enable {
            self.sink.activated();
            Transition::Enabled
        } else {
            self.sink.deactivated();
            Transition::Disabled
        }
    }

    /// Current forwarding state.
    pub fn is_enabled(&self) -> bool {
        *self.enabled.lock().unwrap()
    }
}
