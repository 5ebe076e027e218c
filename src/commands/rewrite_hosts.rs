//! Hosts file rewrite workflow
//!
//! Unlike attach and detach, the address list arrives as one
//! whitespace-joined argument slot, because the caller forwards it from a
//! single environment value.

use tracing::debug;

use crate::config::AppConfig;
use crate::error::{AppError, UsageError};
use crate::hosts::rewriter::DockerHostsRewriter;
use crate::hosts::HostsRewriter;
use crate::network::cidr::parse_range_field;
use crate::network::AddressRange;

const USAGE: &str = "<hosts-path> <fqdn> <image> <cidrs> [name:address...]";

/// Parsed shape of a rewrite-hosts invocation.
#[derive(Debug)]
struct RewriteArgs {
    hosts_path: String,
    fqdn: String,
    image: String,
    ranges: Vec<AddressRange>,
    extra_hosts: Vec<String>,
}

fn parse_args(args: &[String]) -> Result<RewriteArgs, AppError> {
    if args.len() < 4 {
        return Err(UsageError::MissingArguments {
            command: "rewrite-hosts",
            usage: USAGE,
        }
        .into());
    }
    let ranges = parse_range_field(&args[3])?;
    Ok(RewriteArgs {
        hosts_path: args[0].clone(),
        fqdn: args[1].clone(),
        image: args[2].clone(),
        ranges,
        extra_hosts: args[4..].to_vec(),
    })
}

/// Runs the rewrite against the given rewriter.
async fn rewrite_with<R: HostsRewriter>(rewriter: &R, parsed: &RewriteArgs) -> Result<(), AppError> {
    debug!(
        hosts_path = %parsed.hosts_path,
        fqdn = %parsed.fqdn,
        ranges = parsed.ranges.len(),
        "rewriting hosts file"
    );
    rewriter
        .rewrite(
            &parsed.hosts_path,
            &parsed.fqdn,
            &parsed.ranges,
            &parsed.extra_hosts,
        )
        .await?;
    Ok(())
}

/// Production entry point wired from configuration.
pub async fn run(config: &AppConfig, args: &[String]) -> Result<(), AppError> {
    let parsed = parse_args(args)?;
    let rewriter = DockerHostsRewriter::new(&config.docker_host, &parsed.image)?;
    rewrite_with(&rewriter, &parsed).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::{HostsError, NetworkError};

    /// Rewriter recording the arguments of every call.
    #[derive(Default)]
    struct RecordingRewriter {
        calls: Mutex<Vec<(String, String, Vec<String>, Vec<String>)>>,
    }

    impl HostsRewriter for RecordingRewriter {
        async fn rewrite(
            &self,
            hosts_path: &str,
            fqdn: &str,
            ranges: &[AddressRange],
            extra_hosts: &[String],
        ) -> Result<(), HostsError> {
            self.calls.lock().unwrap().push((
                hosts_path.to_string(),
                fqdn.to_string(),
                ranges.iter().map(|r| r.to_string()).collect(),
                extra_hosts.to_vec(),
            ));
            Ok(())
        }
    }

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn requires_all_four_positionals() {
        let err = parse_args(&strings(&["/etc/hosts", "c1.overlay.local", "example/overlay:latest"]))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("usage: rewrite-hosts"), "{message}");
    }

    #[test]
    fn splits_the_joined_cidr_slot() {
        let parsed = parse_args(&strings(&[
            "/etc/hosts",
            "c1.overlay.local",
            "example/overlay:latest",
            "10.0.0.1/24 10.0.0.2/24",
        ]))
        .unwrap();
        assert_eq!(parsed.ranges.len(), 2);
        assert_eq!(parsed.ranges[0].to_string(), "10.0.0.1/24");
        assert_eq!(parsed.ranges[1].to_string(), "10.0.0.2/24");
        assert!(parsed.extra_hosts.is_empty());
    }

    #[test]
    fn empty_cidr_slot_means_no_ranges() {
        let parsed = parse_args(&strings(&[
            "/etc/hosts",
            "c1.overlay.local",
            "example/overlay:latest",
            "",
        ]))
        .unwrap();
        assert!(parsed.ranges.is_empty());
    }

    #[test]
    fn malformed_token_in_the_slot_is_an_error() {
        let err = parse_args(&strings(&[
            "/etc/hosts",
            "c1.overlay.local",
            "example/overlay:latest",
            "10.0.0.1/24 bogus",
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::Network(NetworkError::InvalidCidr { .. })
        ));
    }

    #[tokio::test]
    async fn forwards_everything_to_the_rewriter() {
        let parsed = parse_args(&strings(&[
            "/etc/hosts",
            "c1.overlay.local",
            "example/overlay:latest",
            "10.0.0.1/24 10.0.0.2/24",
            "db:192.168.1.10",
            "cache:192.168.1.11",
        ]))
        .unwrap();
        let rewriter = RecordingRewriter::default();

        rewrite_with(&rewriter, &parsed).await.unwrap();

        let calls = rewriter.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (hosts_path, fqdn, ranges, extra_hosts) = &calls[0];
        assert_eq!(hosts_path, "/etc/hosts");
        assert_eq!(fqdn, "c1.overlay.local");
        assert_eq!(ranges, &vec!["10.0.0.1/24".to_string(), "10.0.0.2/24".to_string()]);
        assert_eq!(
            extra_hosts,
            &vec!["db:192.168.1.10".to_string(), "cache:192.168.1.11".to_string()]
        );
    }
}
