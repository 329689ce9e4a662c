//! Control protocol for the mobdev dispatcher
//!
//! This crate defines the boundary between untrusted callers and the
//! privileged daemon: the closed command set, the fixed-layout argument
//! record with its trust-boundary marshaler, the request/response framing
//! used on the control socket, and the public error kinds with their wire
//! codes.
//!
//! # Example
//!
//! ```
//! use protocol::{ArgumentRecord, CommandCode, ControlRequest};
//!
//! // Encode a tethering request the way the control tool does...
//! let record = ArgumentRecord {
//!     enable: 1,
//!     ifname: "usb0".to_string(),
//!     ..Default::default()
//! };
//! let request = ControlRequest::with_argument(
//!     CommandCode::Tethering.wire_value(),
//!     record.encode(),
//! );
//!
//! // ...and marshal it back across the trust boundary as the daemon does.
//! let raw = request.argument.unwrap();
//! let marshaled = ArgumentRecord::marshal(&raw).unwrap();
//! assert_eq!(marshaled.ifname, "usb0");
//! assert!(marshaled.enabled());
//! ```

pub mod codec;
pub mod error;
pub mod record;
pub mod types;

pub use codec::{ControlRequest, read_request, read_response, write_request, write_response};
#[cfg(feature = "async")]
pub use codec::{read_request_async, write_response_async};
pub use error::{DispatchError, ErrorCode, ProtocolError, Result};
pub use record::{ArgumentRecord, IFNAME_CAPACITY, PATH_CAPACITY, RECORD_SIZE};
pub use types::{CommandCode, RESULT_NO_CHANGE, RESULT_TRANSITION};
