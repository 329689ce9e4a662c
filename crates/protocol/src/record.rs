//! Argument record layout and trust-boundary marshaling
//!
//! Every argument-bearing command hands the dispatcher one fixed-layout
//! record, little-endian throughout:
//!
//! ```text
//! offset  size  field
//! 0       4     enable  (i32)
//! 4       4     action  (i32)
//! 8       128   path    (bytes, NUL-terminated within capacity)
//! 136     16    ifname  (bytes, NUL-terminated within capacity)
//! ```
//!
//! Marshaling never trusts caller-supplied terminators or lengths: each
//! text field is cut at its first NUL and force-truncated to its declared
//! capacity otherwise, so nothing downstream can read past a field's end.

use crate::error::DispatchError;
use byteorder::{ByteOrder, LittleEndian};

/// Total size of the wire record in bytes.
pub const RECORD_SIZE: usize = 152;

/// Declared capacity of the `path` field, terminator included.
pub const PATH_CAPACITY: usize = 128;

/// Declared capacity of the `ifname` field, terminator included.
/// Matches the platform limit on interface-name length.
pub const IFNAME_CAPACITY: usize = 16;

const ENABLE_OFFSET: usize = 0;
const ACTION_OFFSET: usize = 4;
const PATH_OFFSET: usize = 8;
const IFNAME_OFFSET: usize = PATH_OFFSET + PATH_CAPACITY;

/// One dispatch call's argument set, validated and owned by the dispatcher.
///
/// Field meaning depends on the command: `enable` selects push/pull for
/// transfers, up/down for tethering, and on/off for notifications, while
/// `action` selects answer/reject and volume direction for the call and
/// media commands. Fields a command does not use are ignored by it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentRecord {
    pub enable: i32,
    pub action: i32,
    pub path: String,
    pub ifname: String,
}

impl ArgumentRecord {
    /// Record substituted when an argument-bearing command arrives without
    /// a payload.
    pub fn zeroed() -> Self {
        Self::default()
    }

    /// Boolean view of the `enable` flag; any non-zero value is true.
    pub fn enabled(&self) -> bool {
        self.enable != 0
    }

    /// Copy and validate a record from caller-supplied bytes.
    ///
    /// Fails with [`DispatchError::BoundaryFault`] unless at least
    /// [`RECORD_SIZE`] bytes are readable; trailing bytes beyond the record
    /// are ignored. Text fields are bounded as described in the module
    /// docs, and non-UTF-8 content is replaced lossily after bounding. The
    /// record is returned whole or not at all.
    pub fn marshal(raw: &[u8]) -> Result<ArgumentRecord, DispatchError> {
        if raw.len() < RECORD_SIZE {
            return Err(DispatchError::BoundaryFault {
                needed: RECORD_SIZE,
                available: raw.len(),
            });
        }

        Ok(ArgumentRecord {
            enable: LittleEndian::read_i32(&raw[ENABLE_OFFSET..ENABLE_OFFSET + 4]),
            action: LittleEndian::read_i32(&raw[ACTION_OFFSET..ACTION_OFFSET + 4]),
            path: bounded_text(&raw[PATH_OFFSET..PATH_OFFSET + PATH_CAPACITY]),
            ifname: bounded_text(&raw[IFNAME_OFFSET..IFNAME_OFFSET + IFNAME_CAPACITY]),
        })
    }

    /// Encode this record into its wire layout.
    ///
    /// Text fields longer than capacity minus the terminator are truncated
    /// here; the daemon applies the same bound again on its side of the
    /// boundary.
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        LittleEndian::write_i32(&mut buf[ENABLE_OFFSET..ENABLE_OFFSET + 4], self.enable);
        LittleEndian::write_i32(&mut buf[ACTION_OFFSET..ACTION_OFFSET + 4], self.action);
        write_text(&mut buf[PATH_OFFSET..PATH_OFFSET + PATH_CAPACITY], &self.path);
        write_text(
            &mut buf[IFNAME_OFFSET..IFNAME_OFFSET + IFNAME_CAPACITY],
            &self.ifname,
        );
        buf
    }
}

/// Cut a fixed-capacity field at its first NUL, or at capacity minus one
/// when the caller supplied no terminator at all.
fn bounded_text(field: &[u8]) -> String {
    let end = field
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(field.len() - 1);
    String::from_utf8_lossy(&field[..end]).into_owned()
}

fn write_text(field: &mut [u8], text: &str) {
    let bytes = text.as_bytes();
    let len = bytes.len().min(field.len() - 1);
    field[..len].copy_from_slice(&bytes[..len]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with_path(path_bytes: &[u8]) -> [u8; RECORD_SIZE] {
        let mut raw = [0u8; RECORD_SIZE];
        raw[PATH_OFFSET..PATH_OFFSET + path_bytes.len()].copy_from_slice(path_bytes);
        raw
    }

    #[test]
    fn test_marshal_short_buffer_is_boundary_fault() {
        let result = ArgumentRecord::marshal(&[0u8; RECORD_SIZE - 1]);
        assert_eq!(
            result,
            Err(DispatchError::BoundaryFault {
                needed: RECORD_SIZE,
                available: RECORD_SIZE - 1,
            })
        );

        let result = ArgumentRecord::marshal(&[]);
        assert_eq!(
            result,
            Err(DispatchError::BoundaryFault {
                needed: RECORD_SIZE,
                available: 0,
            })
        );
    }

    #[test]
    fn test_marshal_zeroed_bytes() {
        let record = ArgumentRecord::marshal(&[0u8; RECORD_SIZE]).unwrap();
        assert_eq!(record, ArgumentRecord::zeroed());
        assert!(!record.enabled());
    }

    #[test]
    fn test_marshal_reads_fixed_offsets() {
        let mut raw = [0u8; RECORD_SIZE];
        raw[0..4].copy_from_slice(&1i32.to_le_bytes());
        raw[4..8].copy_from_slice(&(-2i32).to_le_bytes());
        raw[8..19].copy_from_slice(b"photos.tar\0");
        raw[136..141].copy_from_slice(b"usb0\0");

        let record = ArgumentRecord::marshal(&raw).unwrap();
        assert_eq!(record.enable, 1);
        assert!(record.enabled());
        assert_eq!(record.action, -2);
        assert_eq!(record.path, "photos.tar");
        assert_eq!(record.ifname, "usb0");
    }

    #[test]
    fn test_marshal_ignores_trailing_bytes() {
        let mut raw = vec![0u8; RECORD_SIZE + 32];
        raw[0..4].copy_from_slice(&1i32.to_le_bytes());
        // Garbage past the record must not influence the result.
        raw[RECORD_SIZE..].fill(0xAB);
        let record = ArgumentRecord::marshal(&raw).unwrap();
        assert_eq!(record.enable, 1);
        assert_eq!(record.path, "");
    }

    #[test]
    fn test_unterminated_path_is_force_truncated() {
        let raw = raw_with_path(&[b'a'; PATH_CAPACITY]);
        let record = ArgumentRecord::marshal(&raw).unwrap();
        assert_eq!(record.path.len(), PATH_CAPACITY - 1);
        assert!(record.path.bytes().all(|b| b == b'a'));
    }

    #[test]
    fn test_unterminated_ifname_is_force_truncated() {
        let mut raw = [0u8; RECORD_SIZE];
        raw[IFNAME_OFFSET..].copy_from_slice(&[b'x'; IFNAME_CAPACITY]);
        let record = ArgumentRecord::marshal(&raw).unwrap();
        assert_eq!(record.ifname.len(), IFNAME_CAPACITY - 1);
    }

    #[test]
    fn test_bytes_after_terminator_ignored() {
        let raw = raw_with_path(b"ok\0trailing-junk");
        let record = ArgumentRecord::marshal(&raw).unwrap();
        assert_eq!(record.path, "ok");
    }

    #[test]
    fn test_non_utf8_path_is_replaced_not_rejected() {
        let raw = raw_with_path(&[0xFF, 0xFE, b'a', 0]);
        let record = ArgumentRecord::marshal(&raw).unwrap();
        assert!(record.path.ends_with('a'));
        assert_eq!(record.path.chars().count(), 3);
    }

    #[test]
    fn test_encode_bounds_overlong_fields() {
        let record = ArgumentRecord {
            enable: 1,
            action: 0,
            path: "p".repeat(PATH_CAPACITY * 2),
            ifname: "i".repeat(IFNAME_CAPACITY * 2),
        };
        let raw = record.encode();
        // The last byte of each field stays a terminator.
        assert_eq!(raw[PATH_OFFSET + PATH_CAPACITY - 1], 0);
        assert_eq!(raw[IFNAME_OFFSET + IFNAME_CAPACITY - 1], 0);

        let back = ArgumentRecord::marshal(&raw).unwrap();
        assert_eq!(back.path.len(), PATH_CAPACITY - 1);
        assert_eq!(back.ifname.len(), IFNAME_CAPACITY - 1);
    }
}
