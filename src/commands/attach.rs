//! Container attach workflow
//!
//! Resolves the container's init pid through the Docker daemon, refuses
//! host-networking containers, then hands a validated request to the
//! netlink backend. A backend failure is reported as the container dying
//! only when the process is actually gone by the time we look.

use tracing::debug;

use crate::commands::{
    partition_flags, FLAG_HAIRPIN_OFF, FLAG_KEEP_TX_ON, FLAG_NO_MULTICAST_ROUTE,
};
use crate::config::AppConfig;
use crate::docker::{BollardInspector, ContainerInspector};
use crate::error::{AppError, NetworkError, UsageError};
use crate::network::cidr::parse_ranges;
use crate::network::namespace::{NamespaceValidator, ProcNamespaceValidator};
use crate::network::veth::NetlinkBackend;
use crate::network::{AttachmentRequest, NetnsBackend};
use crate::process;

const USAGE: &str = "[--no-multicast-route] [--keep-tx-on] [--hairpin-mode=false] \
                     <container-id> <bridge-name> <mtu> <cidr>...";

/// Parsed shape of an attach invocation.
#[derive(Debug, PartialEq, Eq)]
struct AttachArgs {
    container_id: String,
    bridge: String,
    mtu_text: String,
    cidr_texts: Vec<String>,
    multicast_route: bool,
    keep_tx_on: bool,
    hairpin_mode: bool,
}

fn parse_args(args: &[String]) -> Result<AttachArgs, UsageError> {
    let (seen, positional) = partition_flags(
        args,
        &[FLAG_NO_MULTICAST_ROUTE, FLAG_KEEP_TX_ON, FLAG_HAIRPIN_OFF],
    );
    if positional.len() < 4 {
        return Err(UsageError::MissingArguments {
            command: "attach",
            usage: USAGE,
        });
    }
    Ok(AttachArgs {
        container_id: positional[0].clone(),
        bridge: positional[1].clone(),
        mtu_text: positional[2].clone(),
        cidr_texts: positional[3..].to_vec(),
        multicast_route: !seen.contains(&FLAG_NO_MULTICAST_ROUTE),
        keep_tx_on: seen.contains(&FLAG_KEEP_TX_ON),
        hairpin_mode: !seen.contains(&FLAG_HAIRPIN_OFF),
    })
}

/// Parses the MTU argument; zero means "use the bridge MTU".
///
/// A malformed MTU is tolerated only when the first CIDR slot is the empty
/// string. Callers that pass a placeholder in both slots historically got
/// the bridge default, and that exact coupling is kept; any other
/// malformed MTU is an error.
fn parse_mtu(mtu_text: &str, first_cidr: &str) -> Result<Option<u32>, NetworkError> {
    match mtu_text.parse::<u32>() {
        Ok(0) => Ok(None),
        Ok(mtu) => Ok(Some(mtu)),
        Err(_) if first_cidr.is_empty() => Ok(None),
        Err(e) => Err(NetworkError::InvalidMtu {
            text: mtu_text.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Runs the attach workflow against the given collaborators.
async fn attach_with<I, V, B>(
    inspector: &I,
    validator: &V,
    backend: &B,
    interface: &str,
    args: &[String],
) -> Result<(), AppError>
where
    I: ContainerInspector,
    V: NamespaceValidator,
    B: NetnsBackend,
{
    let parsed = parse_args(args)?;
    let pid = inspector.container_pid(&parsed.container_id).await?;
    validator.ensure_separate_netns(pid, &parsed.container_id)?;

    let mtu = parse_mtu(&parsed.mtu_text, &parsed.cidr_texts[0])?;
    let ranges = parse_ranges(&parsed.cidr_texts)?;

    debug!(
        container_id = %parsed.container_id,
        pid,
        bridge = %parsed.bridge,
        ?mtu,
        "attaching container"
    );
    let request = AttachmentRequest {
        pid,
        bridge: parsed.bridge,
        interface: interface.to_string(),
        mtu,
        ranges,
        multicast_route: parsed.multicast_route,
        keep_tx_on: parsed.keep_tx_on,
        hairpin_mode: parsed.hairpin_mode,
    };

    if let Err(backend_err) = backend.attach(request).await {
        // A container exiting mid-attach surfaces as an opaque netlink
        // failure; name the real cause when the process is gone.
        if !process::exists(pid) {
            return Err(NetworkError::ContainerDied {
                container_id: parsed.container_id,
            }
            .into());
        }
        return Err(backend_err.into());
    }
    Ok(())
}

/// Production entry point wired from configuration.
pub async fn run(config: &AppConfig, args: &[String]) -> Result<(), AppError> {
    let inspector = BollardInspector::new(&config.docker_host)?;
    let validator = ProcNamespaceValidator::default();
    let backend = NetlinkBackend::new()?;
    attach_with(&inspector, &validator, &backend, &config.container_ifname, args).await
}
