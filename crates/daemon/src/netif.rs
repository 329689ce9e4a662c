//! Network interface administrative state
//!
//! Tethering toggles the administrative up flag of one named interface.
//! [`InterfaceController`] serializes every lookup-then-mutate under a
//! process-wide lock so concurrent toggles cannot lose updates, and only
//! writes the flag when the requested state differs from the current one.
//! The lock is released on every exit path, including failures.
//!
//! The actual flag access sits behind [`InterfaceRegistry`]. On Linux the
//! registry drives the socket ioctl flags interface; other hosts get a
//! stub that fails every operation.

use protocol::DispatchError;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

#[cfg(not(target_os = "linux"))]
pub use stub::SysInterfaceRegistry;
#[cfg(target_os = "linux")]
pub use sys::SysInterfaceRegistry;

/// Outcome of a tethering call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagChange {
    /// The interface was already in the requested state; nothing was written.
    AlreadySet,
    /// The administrative flag was flipped.
    Flipped,
}

/// Read and write access to one interface's administrative flag.
///
/// Both operations resolve the name on every call and fail with
/// [`DispatchError::InterfaceNotFound`] when it does not resolve.
/// Implementations do not need to serialize callers; the controller
/// holds its own lock across the read-modify-write.
pub trait InterfaceRegistry: Send + Sync {
    /// Whether the named interface is administratively up.
    fn admin_up(&self, name: &str) -> Result<bool, DispatchError>;

    /// Set the named interface's administrative flag.
    fn set_admin_up(&self, name: &str, up: bool) -> Result<(), DispatchError>;
}

/// Serialized, idempotent control over interface administrative state.
pub struct InterfaceController {
    registry: Arc<dyn InterfaceRegistry>,
    /// Serializes lookup-then-mutate across concurrent callers.
    lock: Mutex<()>,
}

impl InterfaceController {
    pub fn new(registry: Arc<dyn InterfaceRegistry>) -> Self {
        Self {
            registry,
            lock: Mutex::new(()),
        }
    }

    /// Bring `name` administratively up or down.
    ///
    /// Returns [`FlagChange::AlreadySet`] without touching the interface
    /// when it is already in the requested state.
    pub fn set_interface_up(&self, name: &str, up: bool) -> Result<FlagChange, DispatchError> {
        let _guard = self.lock.lock().unwrap();

        let current = self.registry.admin_up(name)?;
        if current == up {
            debug!("Interface {} already {}", name, state_name(up));
            return Ok(FlagChange::AlreadySet);
        }

        self.registry.set_admin_up(name, up)?;
        info!("Interface {} brought {}", name, state_name(up));
        Ok(FlagChange::Flipped)
    }
}

fn state_name(up: bool) -> &'static str {
    if up { "up" } else { "down" }
}

#[cfg(target_os = "linux")]
mod sys {
    //! Socket ioctl backend for interface flags

    use super::InterfaceRegistry;
    use nix::errno::Errno;
    use nix::libc;
    use nix::sys::socket::{AddressFamily, SockFlag, SockType, socket};
    use nix::{ioctl_read_bad, ioctl_write_ptr_bad};
    use protocol::DispatchError;
    use std::os::fd::{AsRawFd, OwnedFd};
    use tracing::warn;

    ioctl_read_bad!(ioctl_get_flags, libc::SIOCGIFFLAGS, libc::ifreq);
    ioctl_write_ptr_bad!(ioctl_set_flags, libc::SIOCSIFFLAGS, libc::ifreq);

    /// Interface flags access through a scratch datagram socket.
    ///
    /// The socket is only a handle for the flags ioctls. It is opened per
    /// call and closed before the call returns, so no descriptor outlives
    /// the operation.
    pub struct SysInterfaceRegistry;

    impl SysInterfaceRegistry {
        pub fn new() -> Self {
            Self
        }
    }

    impl InterfaceRegistry for SysInterfaceRegistry {
        fn admin_up(&self, name: &str) -> Result<bool, DispatchError> {
            let socket = scratch_socket(name)?;
            let mut req = ifreq_for(name)?;
            unsafe { ioctl_get_flags(socket.as_raw_fd(), &mut req) }
                .map_err(|errno| flags_error(errno, name))?;
            // The get ioctl filled in the flags arm of the request union.
            let flags = unsafe { req.ifr_ifru.ifru_flags };
            Ok(flags & libc::IFF_UP as libc::c_short != 0)
        }

        fn set_admin_up(&self, name: &str, up: bool) -> Result<(), DispatchError> {
            let socket = scratch_socket(name)?;
            let mut req = ifreq_for(name)?;
            unsafe { ioctl_get_flags(socket.as_raw_fd(), &mut req) }
                .map_err(|errno| flags_error(errno, name))?;
            let flags = unsafe { req.ifr_ifru.ifru_flags };
            let updated = if up {
                flags | libc::IFF_UP as libc::c_short
            } else {
                flags & !(libc::IFF_UP as libc::c_short)
            };
            req.ifr_ifru.ifru_flags = updated;
            unsafe { ioctl_set_flags(socket.as_raw_fd(), &req) }
                .map_err(|errno| flags_error(errno, name))?;
            Ok(())
        }
    }

    fn scratch_socket(name: &str) -> Result<OwnedFd, DispatchError> {
        socket(
            AddressFamily::Inet,
            SockType::Datagram,
            SockFlag::empty(),
            None,
        )
        .map_err(|errno| {
            warn!("Failed to open interface control socket: {}", errno);
            DispatchError::InterfaceNotFound(name.to_string())
        })
    }

    fn ifreq_for(name: &str) -> Result<libc::ifreq, DispatchError> {
        let bytes = name.as_bytes();
        // IFNAMSIZ counts the NUL terminator. The name also cannot contain
        // one, since it goes into a fixed C string.
        if bytes.is_empty() || bytes.len() >= libc::IFNAMSIZ || bytes.contains(&0) {
            return Err(DispatchError::InterfaceNotFound(name.to_string()));
        }
        let mut req: libc::ifreq = unsafe { std::mem::zeroed() };
        for (dst, src) in req.ifr_name.iter_mut().zip(bytes) {
            *dst = *src as libc::c_char;
        }
        Ok(req)
    }

    /// Map an ioctl failure onto the dispatch error surface.
    ///
    /// ENODEV is the expected miss for an unknown name. Anything else is
    /// unusual (EPERM when not running as root, for instance) and gets
    /// logged before being reported the same way, since the caller-facing
    /// contract only distinguishes whether the interface was reachable.
    fn flags_error(errno: Errno, name: &str) -> DispatchError {
        if errno != Errno::ENODEV {
            warn!("Interface flags ioctl failed for {}: {}", name, errno);
        }
        DispatchError::InterfaceNotFound(name.to_string())
    }
}

#[cfg(not(target_os = "linux"))]
mod stub {
    //! Stub registry for hosts without the flags ioctl interface

    use super::InterfaceRegistry;
    use protocol::DispatchError;

    /// Always-failing registry. Linux is the only supported backend.
    pub struct SysInterfaceRegistry;

    impl SysInterfaceRegistry {
        pub fn new() -> Self {
            Self
        }
    }

    impl InterfaceRegistry for SysInterfaceRegistry {
        fn admin_up(&self, name: &str) -> Result<bool, DispatchError> {
            Err(DispatchError::InterfaceNotFound(name.to_string()))
        }

        fn set_admin_up(&self, name: &str, _up: bool) -> Result<(), DispatchError> {
            Err(DispatchError::InterfaceNotFound(name.to_string()))
        }
    }
}
