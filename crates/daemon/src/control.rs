//! Control socket server
//!
//! Listens on a Unix domain socket, reads framed control requests, and
//! feeds them to the dispatcher. Every connection gets its own task, and
//! every dispatch runs on the blocking pool, so a stalled helper process
//! pins only the connection that asked for it, never the accept loop.
//!
//! A frame that dies inside the argument record is answered with the
//! boundary-fault code and the connection is dropped; the peer is either
//! broken or probing, and neither deserves a resynchronization attempt.

use crate::dispatch::Dispatcher;
use anyhow::{Context, Result};
use protocol::{ErrorCode, read_request_async, write_response_async};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info, warn};

/// Accept loop over the daemon's control socket.
pub struct ControlServer {
    listener: UnixListener,
    dispatcher: Arc<Dispatcher>,
    socket_path: PathBuf,
}

impl ControlServer {
    /// Bind the control socket, replacing a stale file from a previous run.
    pub fn bind(socket_path: &Path, dispatcher: Arc<Dispatcher>) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create socket directory {}", parent.display())
            })?;
        }
        if socket_path.exists() {
            std::fs::remove_file(socket_path).with_context(|| {
                format!("Failed to remove stale socket {}", socket_path.display())
            })?;
        }
        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind control socket {}", socket_path.display()))?;
        info!("Control socket listening on {}", socket_path.display());

        Ok(Self {
            listener,
            dispatcher,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accept connections until the surrounding task is cancelled.
    pub async fn run(self) -> Result<()> {
        loop {
            let stream = match self.listener.accept().await {
                Ok((stream, _addr)) => stream,
                Err(e) => {
                    // Transient accept failures (descriptor pressure and
                    // the like) should not take the daemon down.
                    warn!("Control socket accept failed: {}", e);
                    continue;
                }
            };

            let dispatcher = self.dispatcher.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, dispatcher).await {
                    error!("Control connection error: {:#}", e);
                }
            });
        }
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Serve one connection until the peer closes it.
async fn handle_connection(mut stream: UnixStream, dispatcher: Arc<Dispatcher>) -> Result<()> {
    debug!("Control connection opened");

    loop {
        let request = match read_request_async(&mut stream).await {
            Ok(Some(request)) => request,
            Ok(None) => break,
            Err(e) => {
                warn!("Dropping control connection on malformed frame: {}", e);
                let code = ErrorCode::BoundaryFault.wire_value();
                // The stream may already be unwritable; the drop is the
                // real answer.
                let _ = write_response_async(&mut stream, code).await;
                break;
            }
        };

        let dispatcher = dispatcher.clone();
        let result = tokio::task::spawn_blocking(move || {
            let raw = request.argument.as_ref().map(|record| record.as_slice());
            dispatcher.dispatch_wire(request.command, raw)
        })
        .await
        .context("Dispatch task panicked")?;

        write_response_async(&mut stream, result)
            .await
            .context("Failed to write control response")?;
    }

    debug!("Control connection closed");
    Ok(())
}
