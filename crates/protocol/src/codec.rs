//! Control-plane framing
//!
//! Requests and responses cross the daemon's stream socket with a fixed
//! binary layout, little-endian throughout:
//!
//! ```text
//! request:  [command: u32][arg_present: u8][record: RECORD_SIZE bytes, when present]
//! response: [code: i32]
//! ```
//!
//! The record bytes are opaque at this layer; only the marshaler interprets
//! them, so a malformed record still reaches the trust boundary intact and
//! is rejected there. A response carries a non-negative operation result or
//! a negative [`ErrorCode`](crate::error::ErrorCode) value.
//!
//! Synchronous helpers serve the control tool and tests; the daemon uses
//! the async variants behind the `async` feature.

use crate::error::{ProtocolError, Result};
use crate::record::RECORD_SIZE;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{ErrorKind, Read, Write};

#[cfg(feature = "async")]
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// One decoded control-plane request.
///
/// `command` stays a raw `u32` here: mapping it onto the closed command set
/// is the dispatcher's job, so an out-of-range value travels all the way to
/// the rejection point instead of being masked by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRequest {
    pub command: u32,
    pub argument: Option<[u8; RECORD_SIZE]>,
}

impl ControlRequest {
    /// Request without an argument record.
    pub fn bare(command: u32) -> Self {
        Self {
            command,
            argument: None,
        }
    }

    /// Request carrying an encoded argument record.
    pub fn with_argument(command: u32, record: [u8; RECORD_SIZE]) -> Self {
        Self {
            command,
            argument: Some(record),
        }
    }
}

/// Write a request frame.
pub fn write_request<W: Write>(writer: &mut W, request: &ControlRequest) -> Result<()> {
    writer.write_u32::<LittleEndian>(request.command)?;
    match &request.argument {
        Some(record) => {
            writer.write_u8(1)?;
            writer.write_all(record)?;
        }
        None => writer.write_u8(0)?,
    }
    writer.flush()?;
    Ok(())
}

/// Read a request frame.
///
/// Returns `Ok(None)` on a clean end of stream before a new frame starts.
/// A stream that ends inside a frame is an I/O error, and an
/// argument-presence flag other than 0 or 1 is rejected.
pub fn read_request<R: Read>(reader: &mut R) -> Result<Option<ControlRequest>> {
    let mut header = [0u8; 4];
    match reader.read_exact(&mut header) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let command = u32::from_le_bytes(header);

    let argument = match reader.read_u8()? {
        0 => None,
        1 => {
            let mut record = [0u8; RECORD_SIZE];
            reader.read_exact(&mut record)?;
            Some(record)
        }
        other => return Err(ProtocolError::InvalidArgumentFlag(other)),
    };

    Ok(Some(ControlRequest { command, argument }))
}

/// Write a response frame.
pub fn write_response<W: Write>(writer: &mut W, code: i32) -> Result<()> {
    writer.write_i32::<LittleEndian>(code)?;
    writer.flush()?;
    Ok(())
}

/// Read a response frame.
pub fn read_response<R: Read>(reader: &mut R) -> Result<i32> {
    Ok(reader.read_i32::<LittleEndian>()?)
}

/// Async: read a request frame from a stream socket.
///
/// Same contract as [`read_request`]: `Ok(None)` on a clean end of stream,
/// an I/O error when the stream ends inside a frame.
#[cfg(feature = "async")]
pub async fn read_request_async<R>(reader: &mut R) -> Result<Option<ControlRequest>>
where
    R: AsyncReadExt + Unpin,
{
    let mut header = [0u8; 4];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let command = u32::from_le_bytes(header);

    let argument = match reader.read_u8().await? {
        0 => None,
        1 => {
            let mut record = [0u8; RECORD_SIZE];
            reader.read_exact(&mut record).await?;
            Some(record)
        }
        other => return Err(ProtocolError::InvalidArgumentFlag(other)),
    };

    Ok(Some(ControlRequest { command, argument }))
}

/// Async: write a response frame to a stream socket.
#[cfg(feature = "async")]
pub async fn write_response_async<W>(writer: &mut W, code: i32) -> Result<()>
where
    W: AsyncWriteExt + Unpin,
{
    writer.write_i32_le(code).await?;
    writer.flush().await?;
    Ok(())
}
