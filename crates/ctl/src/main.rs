//! mobdev control tool
//!
//! Thin front end over the daemon's control socket: encodes one request,
//! prints the outcome, and exits nonzero when the daemon reports an error.
//! Validation authority lives in the daemon; this tool only shapes the
//! argument record.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use common::{DEFAULT_SOCKET_PATH, setup_logging};
use protocol::{
    ArgumentRecord, CommandCode, ControlRequest, ErrorCode, RESULT_TRANSITION, read_response,
    write_request,
};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "mobdevctl")]
#[command(author, version, about = "Control tool for the mobdev daemon")]
#[command(long_about = "
Sends one control request to the mobdev daemon and reports the outcome.

EXAMPLES:
    # Probe for an attached phone-like device
    mobdevctl detect

    # Push a file to the device's remote directory
    mobdevctl transfer /home/user/photo.jpg

    # Pull it back from the device
    mobdevctl transfer /home/user/photo.jpg --pull

    # Bring the tethering interface up
    mobdevctl tether usb0 on

    # Enable notification forwarding
    mobdevctl notify on

    # Answer the ringing call
    mobdevctl call answer

    # Turn the volume down
    mobdevctl media down
")]
struct Args {
    /// Control socket path
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_SOCKET_PATH)]
    socket: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe for an attached phone-like USB device
    Detect,
    /// Push a file to the device, or pull it back with --pull
    Transfer {
        /// Local path (push source, or pull destination)
        path: String,
        /// Pull from the device instead of pushing
        #[arg(long)]
        pull: bool,
    },
    /// Toggle the administrative state of a tethering interface
    Tether {
        /// Interface name, e.g. usb0
        ifname: String,
        /// Requested state
        state: Switch,
    },
    /// Enable or disable notification forwarding
    Notify {
        /// Requested state
        state: Switch,
    },
    /// Answer or reject a call on the handset
    Call {
        /// What to do with the call
        action: CallAction,
    },
    /// Adjust handset media volume
    Media {
        /// Volume direction
        direction: VolumeDirection,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CallAction {
    Answer,
    Reject,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VolumeDirection {
    Up,
    Down,
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level).context("Failed to set up logging")?;

    let request = build_request(&args.command);
    debug!(
        "Sending command {} to {}",
        request.command,
        args.socket.display()
    );

    let mut stream = UnixStream::connect(&args.socket).with_context(|| {
        format!(
            "Failed to connect to daemon socket {} (is mobdevd running?)",
            args.socket.display()
        )
    })?;
    write_request(&mut stream, &request).context("Failed to send request")?;
    let code = read_response(&mut stream).context("Failed to read response")?;

    report(&args.command, code)
}

/// Map a subcommand onto the wire request.
fn build_request(command: &Command) -> ControlRequest {
    match command {
        Command::Detect => ControlRequest::bare(CommandCode::Detect.wire_value()),
        Command::Transfer { path, pull } => {
            let record = ArgumentRecord {
                enable: (!pull) as i32,
                path: path.clone(),
                ..Default::default()
            };
            ControlRequest::with_argument(CommandCode::FileTransfer.wire_value(), record.encode())
        }
        Command::Tether { ifname, state } => {
            let record = ArgumentRecord {
                enable: matches!(state, Switch::On) as i32,
                ifname: ifname.clone(),
                ..Default::default()
            };
            ControlRequest::with_argument(CommandCode::Tethering.wire_value(), record.encode())
        }
        Command::Notify { state } => {
            let record = ArgumentRecord {
                enable: matches!(state, Switch::On) as i32,
                ..Default::default()
            };
            ControlRequest::with_argument(CommandCode::Notifications.wire_value(), record.encode())
        }
        Command::Call { action } => {
            let record = ArgumentRecord {
                action: matches!(action, CallAction::Answer) as i32,
                ..Default::default()
            };
            ControlRequest::with_argument(CommandCode::CallControl.wire_value(), record.encode())
        }
        Command::Media { direction } => {
            let record = ArgumentRecord {
                action: matches!(direction, VolumeDirection::Up) as i32,
                ..Default::default()
            };
            ControlRequest::with_argument(CommandCode::MediaControl.wire_value(), record.encode())
        }
    }
}

/// Print the daemon's answer and translate it into an exit status.
fn report(command: &Command, code: i32) -> Result<()> {
    if code < 0 {
        let message = match ErrorCode::from_wire(code) {
            Some(error) => error.description().to_string(),
            None => format!("unknown error code {}", code),
        };
        eprintln!("mobdevctl: {}", message);
        std::process::exit(1);
    }

    match command {
        Command::Detect => println!("Phone-like device detected."),
        Command::Transfer { path, pull } => {
            if *pull {
                println!("Pulled to {}.", path);
            } else {
                println!("Pushed {}.", path);
            }
        }
        Command::Tether { ifname, state } => {
            let state_name = match state {
                Switch::On => "up",
                Switch::Off => "down",
            };
            if code == RESULT_TRANSITION {
                println!("Interface {} brought {}.", ifname, state_name);
            } else {
                println!("Interface {} already {}.", ifname, state_name);
            }
        }
        Command::Notify { state } => {
            let state_name = match state {
                Switch::On => "enabled",
                Switch::Off => "disabled",
            };
            if code == RESULT_TRANSITION {
                println!("Notification forwarding {}.", state_name);
            } else {
                println!("Notification forwarding already {}.", state_name);
            }
        }
        Command::Call { action } => match action {
            CallAction::Answer => println!("Call answered."),
            CallAction::Reject => println!("Call rejected."),
        },
        Command::Media { direction } => match direction {
            VolumeDirection::Up => println!("Volume raised."),
            VolumeDirection::Down => println!("Volume lowered."),
        },
    }
    Ok(())
}
