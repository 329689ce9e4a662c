//! Dispatcher and control-plane error types

use thiserror::Error;

/// Errors surfaced by a dispatch to the caller.
///
/// Every kind maps to a fixed negative wire code (see [`ErrorCode`]) so the
/// control tool can name a failure without sharing any state with the
/// daemon. Kinds that abort before any side effect say so explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Command value outside the closed enumeration; nothing was executed
    #[error("unrecognized command code {0}")]
    InvalidCommand(u32),

    /// The argument record could not be read in full across the trust boundary
    #[error("argument record unreadable at the trust boundary: needed {needed} bytes, got {available}")]
    BoundaryFault { needed: usize, available: usize },

    /// A required record field failed validation; nothing was executed
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The classifier found no phone-like device attached
    #[error("no phone-like device detected")]
    DeviceNotDetected,

    /// The named network interface does not resolve
    #[error("network interface {0:?} not found")]
    InterfaceNotFound(String),

    /// The helper bridge failed to start or exited with failure
    #[error("helper invocation failed: {0}")]
    HelperInvocationFailed(String),
}

impl DispatchError {
    /// Wire code for this error kind.
    pub fn code(&self) -> ErrorCode {
        match self {
            DispatchError::InvalidCommand(_) => ErrorCode::InvalidCommand,
            DispatchError::BoundaryFault { .. } => ErrorCode::BoundaryFault,
            DispatchError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            DispatchError::DeviceNotDetected => ErrorCode::DeviceNotDetected,
            DispatchError::InterfaceNotFound(_) => ErrorCode::InterfaceNotFound,
            DispatchError::HelperInvocationFailed(_) => ErrorCode::HelperInvocationFailed,
        }
    }
}

/// Wire identifiers for [`DispatchError`] kinds.
///
/// A response carries a single `i32`: non-negative values are operation
/// results, negative values are one of these codes. The values are stable
/// and must never be reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    InvalidCommand = -1,
    BoundaryFault = -2,
    InvalidArgument = -3,
    DeviceNotDetected = -4,
    InterfaceNotFound = -5,
    HelperInvocationFailed = -6,
}

impl ErrorCode {
    /// All codes, in wire-value order.
    pub const ALL: [ErrorCode; 6] = [
        ErrorCode::InvalidCommand,
        ErrorCode::BoundaryFault,
        ErrorCode::InvalidArgument,
        ErrorCode::DeviceNotDetected,
        ErrorCode::InterfaceNotFound,
        ErrorCode::HelperInvocationFailed,
    ];

    /// Wire representation of this code.
    pub const fn wire_value(self) -> i32 {
        self as i32
    }

    /// Map a wire value back to a code, if it names one.
    pub fn from_wire(code: i32) -> Option<ErrorCode> {
        match code {
            -1 => Some(ErrorCode::InvalidCommand),
            -2 => Some(ErrorCode::BoundaryFault),
            -3 => Some(ErrorCode::InvalidArgument),
            -4 => Some(ErrorCode::DeviceNotDetected),
            -5 => Some(ErrorCode::InterfaceNotFound),
            -6 => Some(ErrorCode::HelperInvocationFailed),
            _ => None,
        }
    }

    /// Human-readable account of the failure, for the control tool.
    pub const fn description(self) -> &'static str {
        match self {
            ErrorCode::InvalidCommand => "unrecognized command",
            ErrorCode::BoundaryFault => "argument record could not be read",
            ErrorCode::InvalidArgument => "invalid argument",
            ErrorCode::DeviceNotDetected => "no phone-like device detected",
            ErrorCode::InterfaceNotFound => "network interface not found",
            ErrorCode::HelperInvocationFailed => "helper invocation failed",
        }
    }
}

/// Control-plane framing errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Request carried an argument-presence flag other than 0 or 1
    #[error("invalid argument-presence flag: {0:#04x}")]
    InvalidArgumentFlag(u8),

    /// I/O error during frame operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for framing results
pub type Result<T> = std::result::Result<T, ProtocolError>;
