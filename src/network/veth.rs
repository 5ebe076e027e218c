//! Veth provisioning over rtnetlink
//!
//! Implements [`NetnsBackend`] against the kernel: creates the veth pair on
//! the host side, wires one end into the overlay bridge and moves the other
//! into the container's network namespace, then reconciles addresses and
//! the multicast route. Everything after pair creation is treated as one
//! transaction; a failure deletes the pair so no half-configured wiring
//! survives.

use std::net::{IpAddr, Ipv4Addr};

use futures_util::TryStreamExt;
use rtnetlink::packet_route::address::{AddressAttribute, AddressMessage};
use rtnetlink::packet_route::link::{LinkAttribute, LinkMessage};
use rtnetlink::packet_route::route::RouteScope;
use rtnetlink::{Handle, LinkUnspec, LinkVeth, RouteMessageBuilder};
use tracing::{debug, warn};

use crate::error::NetworkError;
use crate::network::namespace::NetnsGuard;
use crate::network::{ethtool, AttachmentRequest, DetachmentRequest, NetnsBackend};

/// Prefix shared by both ends of a managed veth pair; `pl` marks the
/// bridge-facing end, `pg` the container-facing one.
const VETH_PREFIX: &str = "vethov";

/// Interface names are capped at IFNAMSIZ minus the trailing NUL.
const IFNAME_MAX: usize = 15;

/// Derives the host and guest interface names for a pair from the process
/// id label, truncating the label so both names stay within the kernel
/// limit.
pub fn veth_pair_names(label: &str) -> (String, String) {
    let max_label = IFNAME_MAX - VETH_PREFIX.len() - 2;
    let label = &label[..label.len().min(max_label)];
    (
        format!("{VETH_PREFIX}pl{label}"),
        format!("{VETH_PREFIX}pg{label}"),
    )
}

/// [`NetnsBackend`] talking to the kernel through rtnetlink.
pub struct NetlinkBackend {
    host: Handle,
}

impl NetlinkBackend {
    /// Opens the netlink connection for the host namespace.
    pub fn new() -> Result<Self, NetworkError> {
        let (connection, handle, _) = rtnetlink::new_connection()
            .map_err(|e| NetworkError::OperationFailed(format!("netlink connection: {e}")))?;
        tokio::spawn(connection);
        Ok(NetlinkBackend { host: handle })
    }

    async fn provision(
        &self,
        guest: &Handle,
        request: &AttachmentRequest,
    ) -> Result<(), NetworkError> {
        let bridge = link_by_name(&self.host, &request.bridge)
            .await?
            .ok_or_else(|| NetworkError::BridgeMissing {
                bridge: request.bridge.clone(),
            })?;
        let mtu = request.mtu.or_else(|| link_mtu(&bridge));

        let (host_name, guest_name) = veth_pair_names(&request.pid_label());
        let mut pair = LinkVeth::new(&host_name, &guest_name);
        if let Some(mtu) = mtu {
            pair = pair.mtu(mtu);
        }
        self.host
            .link()
            .add(pair.build())
            .execute()
            .await
            .map_err(|e| {
                NetworkError::OperationFailed(format!(
                    "create veth pair {host_name}/{guest_name}: {e}"
                ))
            })?;
        debug!(host_name, guest_name, "created veth pair");

        let wired = self
            .enslave_and_move(guest, request, bridge.header.index, mtu, &host_name, &guest_name)
            .await;
        if let Err(e) = wired {
            if let Err(del_err) = self.remove_by_name(&host_name).await {
                warn!("failed to clean up veth {host_name}: {del_err}");
            }
            return Err(e);
        }
        Ok(())
    }

    async fn enslave_and_move(
        &self,
        guest: &Handle,
        request: &AttachmentRequest,
        bridge_index: u32,
        mtu: Option<u32>,
        host_name: &str,
        guest_name: &str,
    ) -> Result<(), NetworkError> {
        let host_end = require_link(&self.host, host_name).await?;
        self.host
            .link()
            .set(
                LinkUnspec::new_with_index(host_end.header.index)
                    .controller(bridge_index)
                    .build(),
            )
            .execute()
            .await
            .map_err(|e| {
                NetworkError::OperationFailed(format!(
                    "enslave {host_name} to {}: {e}",
                    request.bridge
                ))
            })?;

        set_hairpin(&request.bridge, host_name, request.hairpin_mode).map_err(|e| {
            NetworkError::OperationFailed(format!("set hairpin mode on {host_name}: {e}"))
        })?;

        if !request.keep_tx_on {
            ethtool::tx_checksum_off(guest_name)?;
        }

        self.host
            .link()
            .set(LinkUnspec::new_with_index(host_end.header.index).up().build())
            .execute()
            .await
            .map_err(|e| {
                NetworkError::OperationFailed(format!("bring {host_name} up: {e}"))
            })?;

        let guest_end = require_link(&self.host, guest_name).await?;
        self.host
            .link()
            .set(
                LinkUnspec::new_with_index(guest_end.header.index)
                    .setns_by_pid(request.pid as u32)
                    .build(),
            )
            .execute()
            .await
            .map_err(|e| {
                NetworkError::OperationFailed(format!(
                    "move {guest_name} into namespace of pid {}: {e}",
                    request.pid
                ))
            })?;

        // The moved end may be renumbered inside the container, so resolve
        // it again through the guest connection before renaming.
        let moved = require_link(guest, guest_name).await?;
        let mut rename = LinkUnspec::new_with_index(moved.header.index)
            .name(request.interface.clone());
        if let Some(mtu) = mtu {
            rename = rename.mtu(mtu);
        }
        guest
            .link()
            .set(rename.build())
            .execute()
            .await
            .map_err(|e| {
                NetworkError::OperationFailed(format!(
                    "rename {guest_name} to {}: {e}",
                    request.interface
                ))
            })?;
        Ok(())
    }

    async fn remove_by_name(&self, name: &str) -> Result<(), NetworkError> {
        if let Some(link) = link_by_name(&self.host, name).await? {
            self.host
                .link()
                .del(link.header.index)
                .execute()
                .await
                .map_err(|e| NetworkError::OperationFailed(format!("delete {name}: {e}")))?;
        }
        Ok(())
    }
}

impl NetnsBackend for NetlinkBackend {
    async fn attach(&self, request: AttachmentRequest) -> Result<(), NetworkError> {
        let guest = guest_handle(&request.netns_path())?;

        if link_by_name(&guest, &request.interface).await?.is_none() {
            self.provision(&guest, &request).await?;
        } else {
            debug!(
                interface = %request.interface,
                "interface already present, reconciling addresses only"
            );
        }

        let link = require_link(&guest, &request.interface).await?;
        configure(&guest, link.header.index, &request).await
    }

    async fn detach(&self, request: DetachmentRequest) -> Result<(), NetworkError> {
        let guest = guest_handle(&request.netns_path())?;

        let link = link_by_name(&guest, &request.interface)
            .await?
            .ok_or_else(|| NetworkError::InterfaceMissing {
                interface: request.interface.clone(),
            })?;
        let index = link.header.index;

        let existing = address_messages(&guest, index).await?;
        for range in &request.ranges {
            let target = (range.addr(), range.prefix());
            for message in existing.iter().filter(|m| message_range(m) == Some(target)) {
                guest
                    .address()
                    .del(message.clone())
                    .execute()
                    .await
                    .map_err(|e| {
                        NetworkError::OperationFailed(format!(
                            "remove {range} from {}: {e}",
                            request.interface
                        ))
                    })?;
                debug!(%range, interface = %request.interface, "removed address");
            }
        }

        let ipv4_left = address_messages(&guest, index)
            .await?
            .iter()
            .filter_map(message_range)
            .any(|(addr, _)| addr.is_ipv4());
        if !ipv4_left {
            debug!(
                interface = %request.interface,
                "no IPv4 addresses left, removing interface"
            );
            guest
                .link()
                .del(index)
                .execute()
                .await
                .map_err(|e| {
                    NetworkError::OperationFailed(format!(
                        "delete {}: {e}",
                        request.interface
                    ))
                })?;
        }
        Ok(())
    }
}

/// Adds missing addresses, brings the interface up, and installs the
/// multicast route when requested. Safe to run repeatedly.
async fn configure(
    handle: &Handle,
    index: u32,
    request: &AttachmentRequest,
) -> Result<(), NetworkError> {
    let existing: Vec<(IpAddr, u8)> = address_messages(handle, index)
        .await?
        .iter()
        .filter_map(message_range)
        .collect();
    for range in &request.ranges {
        if existing.contains(&(range.addr(), range.prefix())) {
            debug!(%range, "address already assigned");
            continue;
        }
        handle
            .address()
            .add(index, range.addr(), range.prefix())
            .execute()
            .await
            .map_err(|e| NetworkError::OperationFailed(format!("assign {range}: {e}")))?;
    }

    handle
        .link()
        .set(LinkUnspec::new_with_index(index).up().build())
        .execute()
        .await
        .map_err(|e| {
            NetworkError::OperationFailed(format!("bring {} up: {e}", request.interface))
        })?;

    if request.multicast_route {
        ensure_multicast_route(handle, index).await?;
    }
    Ok(())
}

/// Routes 224.0.0.0/4 out the overlay interface so multicast crosses the
/// overlay network. Already-present counts as success.
async fn ensure_multicast_route(handle: &Handle, index: u32) -> Result<(), NetworkError> {
    let mut route = RouteMessageBuilder::<Ipv4Addr>::new()
        .destination_prefix(Ipv4Addr::new(224, 0, 0, 0), 4)
        .output_interface(index)
        .build();
    route.header.scope = RouteScope::Link;
    match handle.route().add(route).execute().await {
        Ok(()) => Ok(()),
        Err(ref e) if is_exists(e) => Ok(()),
        Err(e) => Err(NetworkError::OperationFailed(format!(
            "add multicast route: {e}"
        ))),
    }
}

/// Opens a netlink connection bound inside the container namespace.
///
/// The namespace switch and the socket creation happen synchronously under
/// the guard; the handle is used from the original namespace afterwards.
fn guest_handle(ns_path: &str) -> Result<Handle, NetworkError> {
    let guard = NetnsGuard::enter(ns_path)?;
    let connection = rtnetlink::new_connection();
    drop(guard);
    let (connection, handle, _) = connection.map_err(|e| {
        NetworkError::OperationFailed(format!("netlink connection in {ns_path}: {e}"))
    })?;
    tokio::spawn(connection);
    Ok(handle)
}

async fn link_by_name(handle: &Handle, name: &str) -> Result<Option<LinkMessage>, NetworkError> {
    let mut links = handle.link().get().match_name(name.to_string()).execute();
    match links.try_next().await {
        Ok(link) => Ok(link),
        Err(ref e) if is_not_found(e) => Ok(None),
        Err(e) => Err(NetworkError::OperationFailed(format!(
            "look up interface {name}: {e}"
        ))),
    }
}

async fn require_link(handle: &Handle, name: &str) -> Result<LinkMessage, NetworkError> {
    link_by_name(handle, name)
        .await?
        .ok_or_else(|| NetworkError::InterfaceMissing {
            interface: name.to_string(),
        })
}

async fn address_messages(
    handle: &Handle,
    index: u32,
) -> Result<Vec<AddressMessage>, NetworkError> {
    handle
        .address()
        .get()
        .set_link_index_filter(index)
        .execute()
        .try_collect()
        .await
        .map_err(|e| NetworkError::OperationFailed(format!("list addresses: {e}")))
}

fn message_range(message: &AddressMessage) -> Option<(IpAddr, u8)> {
    let prefix = message.header.prefix_len;
    message.attributes.iter().find_map(|attr| match attr {
        AddressAttribute::Address(addr) => Some((*addr, prefix)),
        _ => None,
    })
}

fn link_mtu(link: &LinkMessage) -> Option<u32> {
    link.attributes.iter().find_map(|attr| match attr {
        LinkAttribute::Mtu(mtu) => Some(*mtu),
        _ => None,
    })
}

/// Hairpin is a per-port bridge setting with no rtnetlink builder, so it
/// goes through sysfs like the rest of the bridge port flags.
fn set_hairpin(bridge: &str, port: &str, enable: bool) -> std::io::Result<()> {
    let path = format!("/sys/class/net/{bridge}/brif/{port}/hairpin_mode");
    std::fs::write(path, if enable { "1" } else { "0" })
}

fn errno(e: &rtnetlink::Error) -> Option<i32> {
    match e {
        rtnetlink::Error::NetlinkError(message) => message.code.map(|code| code.get().abs()),
        _ => None,
    }
}

fn is_exists(e: &rtnetlink::Error) -> bool {
    errno(e) == Some(libc::EEXIST)
}

fn is_not_found(e: &rtnetlink::Error) -> bool {
    matches!(errno(e), Some(code) if code == libc::ENODEV || code == libc::ENOENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtnetlink::packet_core::ErrorMessage;
    use std::num::NonZeroI32;

    fn netlink_err(raw: i32) -> rtnetlink::Error {
        let mut message = ErrorMessage::default();
        message.code = NonZeroI32::new(raw);
        rtnetlink::Error::NetlinkError(message)
    }

    #[test]
    fn pair_names_carry_the_label() {
        let (host, guest) = veth_pair_names("4242");
        assert_eq!(host, "vethovpl4242");
        assert_eq!(guest, "vethovpg4242");
    }

    #[test]
    fn pair_names_fit_the_kernel_limit() {
        let (host, guest) = veth_pair_names("123456789012345");
        assert!(host.len() <= IFNAME_MAX);
        assert!(guest.len() <= IFNAME_MAX);
        assert_eq!(host, "vethovpl1234567");
        assert_eq!(guest, "vethovpg1234567");
    }

    #[test]
    fn exists_matches_negative_eexist() {
        assert!(is_exists(&netlink_err(-libc::EEXIST)));
        assert!(!is_exists(&netlink_err(-libc::ENODEV)));
        assert!(!is_exists(&rtnetlink::Error::RequestFailed));
    }

    #[test]
    fn not_found_matches_missing_device() {
        assert!(is_not_found(&netlink_err(-libc::ENODEV)));
        assert!(is_not_found(&netlink_err(-libc::ENOENT)));
        assert!(!is_not_found(&netlink_err(-libc::EEXIST)));
    }
}
