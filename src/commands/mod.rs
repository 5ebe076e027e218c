//! Operation workflows
//!
//! One module per invocation surface. The orchestrators are generic over
//! the capability traits (inspector, namespace validator, netns backend,
//! hosts rewriter) so the workflows can be exercised without a daemon or
//! root privileges; each module's `run` wires the production
//! implementations from configuration.

pub mod attach;
pub mod detach;
pub mod rewrite_hosts;

/// Disables the multicast route an attach installs by default.
pub const FLAG_NO_MULTICAST_ROUTE: &str = "--no-multicast-route";
/// Leaves TX checksum offload enabled on the container end.
pub const FLAG_KEEP_TX_ON: &str = "--keep-tx-on";
/// Disables hairpin mode on the bridge port.
pub const FLAG_HAIRPIN_OFF: &str = "--hairpin-mode=false";

/// Splits an argument list into recognized flags and retained positional
/// arguments. A flag is recognized wherever it appears; positional order
/// is preserved.
pub fn partition_flags(
    args: &[String],
    flags: &[&'static str],
) -> (Vec<&'static str>, Vec<String>) {
    let mut seen = Vec::new();
    let mut positional = Vec::new();
    for arg in args {
        match flags.iter().find(|flag| **flag == arg.as_str()) {
            Some(flag) => seen.push(*flag),
            None => positional.push(arg.clone()),
        }
    }
    (seen, positional)
}
