//! Network operations module
//!
//! Namespace identity checks and veth provisioning inside container
//! network namespaces.

use crate::error::NetworkError;

pub mod cidr;
pub mod ethtool;
pub mod namespace;
pub mod veth;

pub use cidr::AddressRange;

/// Everything one attach operation needs, validated up front.
///
/// Constructed once per invocation and handed to the backend whole; never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRequest {
    /// Init process of the target container.
    pub pid: i32,
    /// Bridge the host end of the veth pair is enslaved to.
    pub bridge: String,
    /// Interface name the guest end takes inside the container.
    pub interface: String,
    /// Explicit MTU; when absent the bridge's MTU is used.
    pub mtu: Option<u32>,
    /// Addresses to assign, applied in order.
    pub ranges: Vec<AddressRange>,
    pub multicast_route: bool,
    pub keep_tx_on: bool,
    pub hairpin_mode: bool,
}

impl AttachmentRequest {
    pub fn netns_path(&self) -> String {
        namespace::netns_path(self.pid)
    }

    /// Label the veth pair names are derived from.
    pub fn pid_label(&self) -> String {
        self.pid.to_string()
    }
}

/// Parameters for removing an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachmentRequest {
    pub pid: i32,
    /// Kept for error context only.
    pub container_id: String,
    pub interface: String,
    /// Addresses to remove, in order.
    pub ranges: Vec<AddressRange>,
}

impl DetachmentRequest {
    pub fn netns_path(&self) -> String {
        namespace::netns_path(self.pid)
    }
}

/// Low-level namespace/interface manipulation capability.
///
/// Attach is re-runnable: when the container interface already exists the
/// implementation only reconciles addresses and routes. Detach is
/// best-effort removal and reports what it could not find.
pub trait NetnsBackend {
    async fn attach(&self, request: AttachmentRequest) -> Result<(), NetworkError>;
    async fn detach(&self, request: DetachmentRequest) -> Result<(), NetworkError>;
}
