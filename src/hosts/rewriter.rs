//! Managed hosts file rendering and atomic replacement

use bollard::Docker;
use tracing::debug;

use crate::docker;
use crate::error::{DockerError, HostsError};
use crate::hosts::HostsRewriter;
use crate::network::AddressRange;

/// [`HostsRewriter`] bound to a Docker endpoint and image reference.
///
/// Construction only builds the client; the endpoint is checked by a ping
/// at the start of each rewrite.
pub struct DockerHostsRewriter {
    docker: Docker,
    endpoint: String,
    image: String,
}

impl DockerHostsRewriter {
    pub fn new(endpoint: &str, image: &str) -> Result<Self, DockerError> {
        Ok(DockerHostsRewriter {
            docker: docker::connect(endpoint)?,
            endpoint: endpoint.to_string(),
            image: image.to_string(),
        })
    }
}

impl HostsRewriter for DockerHostsRewriter {
    async fn rewrite(
        &self,
        hosts_path: &str,
        fqdn: &str,
        ranges: &[AddressRange],
        extra_hosts: &[String],
    ) -> Result<(), HostsError> {
        self.docker
            .ping()
            .await
            .map_err(|e| HostsError::EndpointUnreachable {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        let content = render(&self.image, fqdn, ranges, extra_hosts)?;
        replace_file(hosts_path, &content).await?;
        debug!(hosts_path, fqdn, ranges = ranges.len(), "rewrote hosts file");
        Ok(())
    }
}

/// Renders the full hosts file: localhost preamble, extra hosts, then the
/// managed block with one line per overlay address.
fn render(
    image: &str,
    fqdn: &str,
    ranges: &[AddressRange],
    extra_hosts: &[String],
) -> Result<String, HostsError> {
    let hostname = fqdn.split('.').next().unwrap_or(fqdn);

    let mut content = String::new();
    content.push_str("127.0.0.1 localhost\n");
    content.push_str("::1 localhost ip6-localhost ip6-loopback\n");

    for entry in extra_hosts {
        // Input shape is name:address; an IPv6 address keeps its colons
        // because only the first one separates.
        let (name, addr) = entry
            .split_once(':')
            .filter(|(name, addr)| !name.is_empty() && !addr.is_empty())
            .ok_or_else(|| HostsError::MalformedExtraHost {
                entry: entry.clone(),
            })?;
        content.push_str(&format!("{addr} {name}\n"));
    }

    content.push_str(&format!("\n# managed by {image} - BEGIN\n"));
    for range in ranges {
        content.push_str(&format!("{} {fqdn} {hostname}\n", range.addr()));
    }
    content.push_str(&format!("# managed by {image} - END\n"));
    Ok(content)
}

/// Writes to a sibling temp file and renames over the target, so readers
/// never observe a half-written hosts file.
async fn replace_file(path: &str, content: &str) -> Result<(), HostsError> {
    let tmp = format!("{path}.tmp");
    let write_failed = |e: std::io::Error| HostsError::WriteFailed {
        path: path.to_string(),
        reason: e.to_string(),
    };
    tokio::fs::write(&tmp, content).await.map_err(write_failed)?;
    tokio::fs::rename(&tmp, path).await.map_err(write_failed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::cidr::parse_range_field;

    #[test]
    fn renders_managed_block_with_fqdn_and_hostname() {
        let ranges = parse_range_field("10.32.0.5/12").unwrap();
        let content = render("example/overlay:latest", "app.overlay.local", &ranges, &[]).unwrap();
        assert!(content.starts_with("127.0.0.1 localhost\n"));
        assert!(content.contains("# managed by example/overlay:latest - BEGIN\n"));
        assert!(content.contains("10.32.0.5 app.overlay.local app\n"));
        assert!(content.ends_with("# managed by example/overlay:latest - END\n"));
    }

    #[test]
    fn renders_extra_hosts_as_address_then_name() {
        let content = render(
            "img",
            "app",
            &[],
            &["db:192.168.1.10".to_string(), "v6host:fd00::1".to_string()],
        )
        .unwrap();
        assert!(content.contains("192.168.1.10 db\n"));
        assert!(content.contains("fd00::1 v6host\n"));
    }

    #[test]
    fn rejects_malformed_extra_hosts() {
        let err = render("img", "app", &[], &["nocolon".to_string()]).unwrap_err();
        match err {
            HostsError::MalformedExtraHost { entry } => assert_eq!(entry, "nocolon"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(render("img", "app", &[], &[":1.2.3.4".to_string()]).is_err());
        assert!(render("img", "app", &[], &["name:".to_string()]).is_err());
    }

    #[test]
    fn ranges_render_in_order() {
        let ranges = parse_range_field("10.0.0.1/24 10.0.0.2/24").unwrap();
        let content = render("img", "app.local", &ranges, &[]).unwrap();
        let first = content.find("10.0.0.1 app.local app").unwrap();
        let second = content.find("10.0.0.2 app.local app").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn replace_file_swaps_content_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts");
        let path = path.to_str().unwrap();

        tokio::fs::write(path, "old contents").await.unwrap();
        replace_file(path, "new contents\n").await.unwrap();

        let read_back = tokio::fs::read_to_string(path).await.unwrap();
        assert_eq!(read_back, "new contents\n");
        assert!(!std::path::Path::new(&format!("{path}.tmp")).exists());
    }

    #[tokio::test]
    async fn replace_file_reports_the_target_path_on_failure() {
        let err = replace_file("/nonexistent-dir/hosts", "x").await.unwrap_err();
        match err {
            HostsError::WriteFailed { path, .. } => {
                assert_eq!(path, "/nonexistent-dir/hosts")
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
