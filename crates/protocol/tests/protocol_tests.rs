//! End-to-end tests for the control protocol
//!
//! Exercises the full caller-side path (record encode, request framing)
//! against the daemon-side path (request read, trust-boundary marshal),
//! plus the stability of the public wire codes.

use protocol::{
    ArgumentRecord, CommandCode, ControlRequest, DispatchError, ErrorCode, PATH_CAPACITY,
    ProtocolError, RECORD_SIZE, read_request, write_request,
};
use std::io::Cursor;

fn frame(request: &ControlRequest) -> Vec<u8> {
    let mut buffer = Vec::new();
    write_request(&mut buffer, request).unwrap();
    buffer
}

mod request_flow {
    use super::*;

    #[test]
    fn test_detect_request_carries_no_record() {
        let bytes = frame(&ControlRequest::bare(CommandCode::Detect.wire_value()));
        assert_eq!(bytes.len(), 5);

        let decoded = read_request(&mut Cursor::new(bytes)).unwrap().unwrap();
        assert_eq!(decoded.command, 0);
        assert!(decoded.argument.is_none());
    }

    #[test]
    fn test_tethering_request_survives_the_boundary() {
        let record = ArgumentRecord {
            enable: 1,
            ifname: "rndis0".to_string(),
            ..Default::default()
        };
        let request =
            ControlRequest::with_argument(CommandCode::Tethering.wire_value(), record.encode());

        let decoded = read_request(&mut Cursor::new(frame(&request)))
            .unwrap()
            .unwrap();
        let marshaled = ArgumentRecord::marshal(&decoded.argument.unwrap()).unwrap();

        assert_eq!(CommandCode::try_from(decoded.command), Ok(CommandCode::Tethering));
        assert!(marshaled.enabled());
        assert_eq!(marshaled.ifname, "rndis0");
        assert_eq!(marshaled.path, "");
    }

    #[test]
    fn test_overlong_transfer_path_is_bounded_end_to_end() {
        let record = ArgumentRecord {
            enable: 1,
            path: "x".repeat(PATH_CAPACITY * 3),
            ..Default::default()
        };
        let request =
            ControlRequest::with_argument(CommandCode::FileTransfer.wire_value(), record.encode());

        let decoded = read_request(&mut Cursor::new(frame(&request)))
            .unwrap()
            .unwrap();
        let marshaled = ArgumentRecord::marshal(&decoded.argument.unwrap()).unwrap();
        assert_eq!(marshaled.path.len(), PATH_CAPACITY - 1);
    }

    #[test]
    fn test_pipelined_requests_on_one_stream() {
        let mut bytes = frame(&ControlRequest::bare(CommandCode::Detect.wire_value()));
        bytes.extend(frame(&ControlRequest::with_argument(
            CommandCode::Notifications.wire_value(),
            ArgumentRecord {
                enable: 1,
                ..Default::default()
            }
            .encode(),
        )));

        let mut cursor = Cursor::new(bytes);
        let first = read_request(&mut cursor).unwrap().unwrap();
        let second = read_request(&mut cursor).unwrap().unwrap();
        assert_eq!(first.command, 0);
        assert_eq!(second.command, 3);
        assert!(read_request(&mut cursor).unwrap().is_none());
    }
}

mod boundary {
    use super::*;

    #[test]
    fn test_record_cut_off_mid_stream_is_a_framing_error() {
        let record = ArgumentRecord::zeroed();
        let request =
            ControlRequest::with_argument(CommandCode::Notifications.wire_value(), record.encode());

        let mut bytes = frame(&request);
        bytes.truncate(5 + RECORD_SIZE / 2);

        let result = read_request(&mut Cursor::new(bytes));
        assert!(matches!(result, Err(ProtocolError::Io(_))));
    }

    #[test]
    fn test_short_record_bytes_never_marshal() {
        let result = ArgumentRecord::marshal(&[0u8; 16]);
        assert_eq!(
            result,
            Err(DispatchError::BoundaryFault {
                needed: RECORD_SIZE,
                available: 16,
            })
        );
    }
}

mod wire_codes {
    use super::*;

    #[test]
    fn test_every_error_code_survives_the_wire() {
        for code in ErrorCode::ALL {
            assert!(code.wire_value() < 0);
            assert_eq!(ErrorCode::from_wire(code.wire_value()), Some(code));
            assert!(!code.description().is_empty());
        }
    }

    #[test]
    fn test_success_codes_are_not_error_codes() {
        assert_eq!(ErrorCode::from_wire(0), None);
        assert_eq!(ErrorCode::from_wire(1), None);
    }

    #[test]
    fn test_dispatch_errors_reach_the_tool_as_their_kind() {
        let cases: Vec<(DispatchError, ErrorCode)> = vec![
            (DispatchError::InvalidCommand(77), ErrorCode::InvalidCommand),
            (
                DispatchError::BoundaryFault {
                    needed: RECORD_SIZE,
                    available: 3,
                },
                ErrorCode::BoundaryFault,
            ),
            (
                DispatchError::InvalidArgument("transfer path is empty".to_string()),
                ErrorCode::InvalidArgument,
            ),
            (DispatchError::DeviceNotDetected, ErrorCode::DeviceNotDetected),
            (
                DispatchError::InterfaceNotFound("usb9".to_string()),
                ErrorCode::InterfaceNotFound,
            ),
            (
                DispatchError::HelperInvocationFailed("exit status 127".to_string()),
                ErrorCode::HelperInvocationFailed,
            ),
        ];

        for (error, expected) in cases {
            let wire = error.code().wire_value();
            assert_eq!(ErrorCode::from_wire(wire), Some(expected));
        }
    }
}
