//! External helper bridge
//!
//! Every device action the daemon cannot perform through a kernel interface
//! (file push and pull, call answer and reject, volume adjustment) funnels
//! through a single chokepoint: one invocation of the configured bridge
//! executable with a fixed argument vector and a scrubbed environment. The
//! actions differ only in the argv they hand over, so the builder lives in
//! one place and the rest of the daemon deals in [`HelperAction`] values.

use protocol::DispatchError;
use std::fmt;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Input keyevent codes understood by the bridge tool's shell.
const KEY_ANSWER_CALL: u32 = 5;
const KEY_END_CALL: u32 = 6;
const KEY_VOLUME_UP: u32 = 24;
const KEY_VOLUME_DOWN: u32 = 25;

/// One of the fixed actions the bridge can perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelperAction {
    /// Copy a host file into the device's remote directory.
    Push { local: String },
    /// Copy from the device's remote directory to a host path.
    Pull { local: String },
    AnswerCall,
    RejectCall,
    VolumeUp,
    VolumeDown,
}

impl HelperAction {
    /// Argument vector for this action, after the program name.
    ///
    /// Built entirely from fixed literals plus the already-validated local
    /// path and the configured remote directory. Nothing else the caller
    /// supplied ever reaches the command line.
    pub fn argv(&self, remote_dir: &str) -> Vec<String> {
        match self {
            HelperAction::Push { local } => {
                vec!["push".into(), local.clone(), remote_dir.into()]
            }
            HelperAction::Pull { local } => {
                vec!["pull".into(), remote_dir.into(), local.clone()]
            }
            HelperAction::AnswerCall => keyevent(KEY_ANSWER_CALL),
            HelperAction::RejectCall => keyevent(KEY_END_CALL),
            HelperAction::VolumeUp => keyevent(KEY_VOLUME_UP),
            HelperAction::VolumeDown => keyevent(KEY_VOLUME_DOWN),
        }
    }
}

impl fmt::Display for HelperAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HelperAction::Push { .. } => write!(f, "file push"),
            HelperAction::Pull { .. } => write!(f, "file pull"),
            HelperAction::AnswerCall => write!(f, "call answer"),
            HelperAction::RejectCall => write!(f, "call reject"),
            HelperAction::VolumeUp => write!(f, "volume up"),
            HelperAction::VolumeDown => write!(f, "volume down"),
        }
    }
}

fn keyevent(code: u32) -> Vec<String> {
    vec![
        "shell".into(),
        "input".into(),
        "keyevent".into(),
        code.to_string(),
    ]
}

/// Executes helper invocations.
///
/// The daemon wires in [`AdbBridge`]; tests substitute recording fakes so
/// dispatch behavior can be checked without a device attached.
pub trait HelperInvoker: Send + Sync {
    /// Run one action to completion.
    ///
    /// Blocks until the helper process exits. Failure to start the process
    /// and a non-success exit status both surface as
    /// [`DispatchError::HelperInvocationFailed`].
    fn invoke(&self, action: &HelperAction) -> Result<(), DispatchError>;
}

/// Bridge that shells out to an adb-style executable.
pub struct AdbBridge {
    program: String,
    remote_dir: String,
}

impl AdbBridge {
    pub fn new(program: impl Into<String>, remote_dir: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            remote_dir: remote_dir.into(),
        }
    }

    /// Assemble the command without running it.
    ///
    /// The environment is cleared and rebuilt from two entries: PATH so a
    /// bare program name resolves to the system install, HOME because the
    /// bridge tool keeps its key store under it. The helper's stdio is
    /// discarded; its exit status is the only thing we read back.
    fn command_for(&self, action: &HelperAction) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(action.argv(&self.remote_dir))
            .env_clear()
            .env("PATH", "/usr/bin:/bin")
            .env("HOME", "/root")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

impl HelperInvoker for AdbBridge {
    fn invoke(&self, action: &HelperAction) -> Result<(), DispatchError> {
        let mut command = self.command_for(action);
        debug!(
            "Invoking helper for {}: {} {}",
            action,
            self.program,
            action.argv(&self.remote_dir).join(" ")
        );

        // TODO: support a configured wait timeout that kills the child on
        // expiry. Until then a hung helper blocks its calling operation
        // until the process exits.
        let status = command.status().map_err(|e| {
            DispatchError::HelperInvocationFailed(format!(
                "failed to start {}: {}",
                self.program, e
            ))
        })?;

        if status.success() {
            info!("Helper completed {}", action);
            Ok(())
        } else {
            Err(DispatchError::HelperInvocationFailed(format!(
                "{} failed during {}: {}",
                self.program, action, status
            )))
        }
    }
}
