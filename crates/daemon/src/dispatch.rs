//! Command dispatch
//!
//! Single entry point for control requests. Decodes the command code,
//! marshals the argument record for commands that carry one, validates the
//! relevant fields before any side effect, and routes to exactly one
//! component. Success maps onto the non-negative wire results, failures
//! onto the fixed negative error codes. No operation is retried here.

use crate::helper::{HelperAction, HelperInvoker};
use crate::netif::{FlagChange, InterfaceController};
use crate::notify::{Notifications, Transition};
use crate::usb::{DetectionPolicy, DeviceEnumerator};
use protocol::{ArgumentRecord, CommandCode, DispatchError, RESULT_NO_CHANGE, RESULT_TRANSITION};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Routes decoded commands to the dispatcher's components.
///
/// Shared across connections; every piece of held state serializes its own
/// mutations, so `dispatch` takes `&self` and may be called concurrently.
pub struct Dispatcher {
    enumerator: Arc<dyn DeviceEnumerator>,
    policy: DetectionPolicy,
    interfaces: InterfaceController,
    notifications: Notifications,
    helper: Arc<dyn HelperInvoker>,
}

impl Dispatcher {
    pub fn new(
        enumerator: Arc<dyn DeviceEnumerator>,
        policy: DetectionPolicy,
        interfaces: InterfaceController,
        notifications: Notifications,
        helper: Arc<dyn HelperInvoker>,
    ) -> Self {
        Self {
            enumerator,
            policy,
            interfaces,
            notifications,
            helper,
        }
    }

    /// Dispatch one command with an optional raw argument record.
    ///
    /// An unrecognized command code and a record that fails to marshal both
    /// abort before any side effect. A missing record for a command that
    /// wants one is tolerated by substituting zeroes; per-command
    /// validation still applies to the result.
    pub fn dispatch(
        &self,
        command: u32,
        raw_argument: Option<&[u8]>,
    ) -> Result<i32, DispatchError> {
        let command = CommandCode::try_from(command)?;
        let record = if command.needs_argument() {
            match raw_argument {
                Some(raw) => ArgumentRecord::marshal(raw)?,
                None => ArgumentRecord::zeroed(),
            }
        } else {
            ArgumentRecord::zeroed()
        };

        let result = match command {
            CommandCode::Detect => self.detect(),
            CommandCode::FileTransfer => self.file_transfer(&record),
            CommandCode::Tethering => self.tethering(&record),
            CommandCode::Notifications => self.set_notifications(&record),
            CommandCode::CallControl => self.call_control(&record),
            CommandCode::MediaControl => self.media_control(&record),
        };

        match &result {
            Ok(code) => info!("Dispatched {}: result {}", command, code),
            Err(error) => warn!("Dispatch of {} failed: {}", command, error),
        }
        result
    }

    /// Dispatch and fold the outcome into the signed wire response.
    pub fn dispatch_wire(&self, command: u32, raw_argument: Option<&[u8]>) -> i32 {
        match self.dispatch(command, raw_argument) {
            Ok(code) => code,
            Err(error) => error.code().wire_value(),
        }
    }

    fn detect(&self) -> Result<i32, DispatchError> {
        let devices = self.enumerator.snapshot();
        debug!(
            "Classifying {} attached devices under the {} policy",
            devices.len(),
            self.policy.name()
        );
        if self.policy.any_phone_like(&devices) {
            Ok(RESULT_TRANSITION)
        } else {
            Err(DispatchError::DeviceNotDetected)
        }
    }

    fn file_transfer(&self, record: &ArgumentRecord) -> Result<i32, DispatchError> {
        if record.path.is_empty() {
            return Err(DispatchError::InvalidArgument(
                "file transfer requires a path".to_string(),
            ));
        }
        let action = if record.enabled() {
            HelperAction::Push {
                local: record.path.clone(),
            }
        } else {
            HelperAction::Pull {
                local: record.path.clone(),
            }
        };
        self.helper.invoke(&action)?;
        Ok(RESULT_NO_CHANGE)
    }

    fn tethering(&self, record: &ArgumentRecord) -> Result<i32, DispatchError> {
        if record.ifname.is_empty() {
            return Err(DispatchError::InvalidArgument(
                "tethering requires an interface name".to_string(),
            ));
        }
        let change = self
            .interfaces
            .set_interface_up(&record.ifname, record.enabled())?;
        Ok(match change {
            FlagChange::Flipped => RESULT_TRANSITION,
            FlagChange::AlreadySet => RESULT_NO_CHANGE,
        })
    }

    fn set_notifications(&self, record: &ArgumentRecord) -> Result<i32, DispatchError> {
        Ok(match self.notifications.set_enabled(record.enabled()) {
            Transition::Noop => RESULT_NO_CHANGE,
            Transition::Enabled | Transition::Disabled => RESULT_TRANSITION,
        })
    }

    fn call_control(&self, record: &ArgumentRecord) -> Result<i32, DispatchError> {
        let action = match record.action {
            1 => HelperAction::AnswerCall,
            0 => HelperAction::RejectCall,
            other => {
                return Err(DispatchError::InvalidArgument(format!(
                    "call action must be 0 or 1, got {}",
                    other
                )));
            }
        };
        self.helper.invoke(&action)?;
        Ok(RESULT_NO_CHANGE)
    }

    fn media_control(&self, record: &ArgumentRecord) -> Result<i32, DispatchError> {
        let action = match record.action {
            1 => HelperAction::VolumeUp,
            0 => HelperAction::VolumeDown,
            other => {
                return Err(DispatchError::InvalidArgument(format!(
                    "media action must be 0 or 1, got {}",
                    other
                )));
            }
        };
        self.helper.invoke(&action)?;
        Ok(RESULT_NO_CHANGE)
    }
}
