//! Network namespace identity and entry

use std::fs::File;
use std::os::unix::fs::MetadataExt;

use netns_rs::NetNs;
use tracing::{debug, warn};

use crate::error::NetworkError;

/// Process id whose namespace stands in for "the host namespace".
pub const HOST_PID: i32 = 1;

/// Path of a process's network namespace under procfs.
pub fn netns_path(pid: i32) -> String {
    format!("/proc/{pid}/ns/net")
}

/// An open handle on a process's network namespace.
///
/// Two processes share a network namespace exactly when their namespace
/// files have the same device and inode. The handle keeps the file open so
/// the identity stays valid for the comparison; releasing is dropping.
#[derive(Debug)]
pub struct NsHandle {
    _file: File,
    dev: u64,
    ino: u64,
}

impl NsHandle {
    pub fn from_pid(pid: i32) -> std::io::Result<Self> {
        let file = File::open(netns_path(pid))?;
        let meta = file.metadata()?;
        Ok(NsHandle {
            dev: meta.dev(),
            ino: meta.ino(),
            _file: file,
        })
    }

    pub fn same_namespace(&self, other: &NsHandle) -> bool {
        self.dev == other.dev && self.ino == other.ino
    }
}

/// Rejects operations on containers that share the host's network namespace.
pub trait NamespaceValidator {
    fn ensure_separate_netns(&self, pid: i32, container_id: &str) -> Result<(), NetworkError>;
}

/// Validator comparing against a configurable host process, normally init.
///
/// The host pid is a field rather than a constant so tests can pass their
/// own process and exercise the equal-namespace rejection without root.
#[derive(Debug, Clone, Copy)]
pub struct ProcNamespaceValidator {
    pub host_pid: i32,
}

impl Default for ProcNamespaceValidator {
    fn default() -> Self {
        ProcNamespaceValidator { host_pid: HOST_PID }
    }
}

impl NamespaceValidator for ProcNamespaceValidator {
    fn ensure_separate_netns(&self, pid: i32, container_id: &str) -> Result<(), NetworkError> {
        let container_ns =
            NsHandle::from_pid(pid).map_err(|e| NetworkError::ContainerNamespace {
                container_id: container_id.to_string(),
                reason: e.to_string(),
            })?;
        let host_ns =
            NsHandle::from_pid(self.host_pid).map_err(|e| NetworkError::HostNamespace {
                reason: e.to_string(),
            })?;
        if container_ns.same_namespace(&host_ns) {
            return Err(NetworkError::HostNetworking);
        }
        debug!(pid, container_id, "container runs in its own network namespace");
        Ok(())
    }
}

/// Switches the current thread into another network namespace and restores
/// the original one on drop.
///
/// Callers must not await while the guard is live: the switch is per OS
/// thread, and yielding would let other tasks run inside the wrong
/// namespace. Netlink sockets opened under the guard stay bound to the
/// entered namespace after restore.
pub struct NetnsGuard {
    origin: NetNs,
}

impl NetnsGuard {
    pub fn enter(path: &str) -> Result<Self, NetworkError> {
        let origin = netns_rs::get_from_current_thread().map_err(|e| {
            NetworkError::OperationFailed(format!("failed to capture current namespace: {e}"))
        })?;
        let target = NetNs::get(path).map_err(|e| {
            NetworkError::OperationFailed(format!("failed to open namespace {path}: {e}"))
        })?;
        target.enter().map_err(|e| {
            NetworkError::OperationFailed(format!("failed to enter namespace {path}: {e}"))
        })?;
        debug!(path, "entered network namespace");
        Ok(NetnsGuard { origin })
    }
}

impl Drop for NetnsGuard {
    fn drop(&mut self) {
        if let Err(e) = self.origin.enter() {
            warn!("failed to restore original network namespace: {e}");
        }
    }
}
