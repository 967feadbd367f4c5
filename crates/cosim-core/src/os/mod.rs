//! Thin wrappers over OS-level IPC primitives consumed by the channel
//! backends: named events, named locks, shared memory regions, and stream
//! sockets.

pub mod named_event;
pub mod named_lock;
pub mod shared_memory;
pub mod socket;

/// Build the platform-appropriate object name for a given kind/suffix,
/// matching the naming convention documented for local-mode transport:
/// `Local\dSPACE.VEOS.CoSim.<Kind>.<name>` on Windows,
/// `/tmp/dSPACE.VEOS.CoSim.<Kind>.<name>` on POSIX.
#[must_use]
pub fn object_name(kind: &str, name: &str) -> String {
    #[cfg(windows)]
    {
        format!(r"Local\dSPACE.VEOS.CoSim.{kind}.{name}")
    }
    #[cfg(not(windows))]
    {
        format!("/tmp/dSPACE.VEOS.CoSim.{kind}.{name}")
    }
}
