//! Hosts file rewriting for name resolution inside containers

use crate::error::HostsError;
use crate::network::AddressRange;

pub mod rewriter;

pub use rewriter::DockerHostsRewriter;

/// Rewrites a container's hosts file with its overlay addresses.
///
/// Implementations are bound to a Docker endpoint and an image reference at
/// construction; `rewrite` receives everything else per call.
pub trait HostsRewriter {
    async fn rewrite(
        &self,
        hosts_path: &str,
        fqdn: &str,
        ranges: &[AddressRange],
        extra_hosts: &[String],
    ) -> Result<(), HostsError>;
}
