//! Command codes and result values for the device-control dispatcher

use crate::error::DispatchError;
use std::fmt;

/// Wire result for a call that changed what the caller can observe: detect
/// found a device, or a tethering/notification call performed a state
/// transition.
pub const RESULT_TRANSITION: i32 = 1;

/// Wire result for success without a transition: the state already matched
/// the request, or the command (transfer, call, media) has no state of its
/// own. Negative responses are [`crate::ErrorCode`] values.
pub const RESULT_NO_CHANGE: i32 = 0;

/// Closed set of dispatcher commands.
///
/// The wire values are stable: callers encode the command as a
/// little-endian `u32` in the request frame, and values 0 through 3 predate
/// the call/media commands, so nothing here may be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CommandCode {
    /// Probe for an attached phone-like USB device
    Detect = 0,
    /// Push or pull a file through the helper bridge
    FileTransfer = 1,
    /// Toggle the administrative state of a tethering interface
    Tethering = 2,
    /// Enable or disable notification forwarding
    Notifications = 3,
    /// Answer or reject a call on the handset
    CallControl = 4,
    /// Adjust handset media volume
    MediaControl = 5,
}

impl CommandCode {
    /// Wire representation of this command.
    pub const fn wire_value(self) -> u32 {
        self as u32
    }

    /// Whether the command consumes an argument record.
    ///
    /// `Detect` is the only command that never reads one. Every other
    /// command is marshaled from the caller-supplied record, substituting a
    /// zeroed record when the caller sent none.
    pub const fn needs_argument(self) -> bool {
        !matches!(self, CommandCode::Detect)
    }
}

impl TryFrom<u32> for CommandCode {
    type Error = DispatchError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CommandCode::Detect),
            1 => Ok(CommandCode::FileTransfer),
            2 => Ok(CommandCode::Tethering),
            3 => Ok(CommandCode::Notifications),
            4 => Ok(CommandCode::CallControl),
            5 => Ok(CommandCode::MediaControl),
            other => Err(DispatchError::InvalidCommand(other)),
        }
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandCode::Detect => "detect",
            CommandCode::FileTransfer => "file-transfer",
            CommandCode::Tethering => "tethering",
            CommandCode::Notifications => "notifications",
            CommandCode::CallControl => "call-control",
            CommandCode::MediaControl => "media-control",
        };
        write!(f, "{}", name)
    }
}
