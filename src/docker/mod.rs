//! Docker API integration module
//!
//! Connection handling and container-to-process resolution.

use bollard::Docker;

use crate::error::DockerError;

pub mod inspector;

pub use inspector::BollardInspector;

/// Connection timeout for Docker API calls, in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 120;

/// Resolves a container reference to its init process id.
///
/// Fails when the daemon is unreachable, the container is unknown, or the
/// container has no running process.
pub trait ContainerInspector {
    async fn container_pid(&self, container_id: &str) -> Result<i32, DockerError>;
}

/// Connects to a Docker endpoint.
///
/// Accepts `unix://` socket URLs, `tcp://` URLs (spoken as HTTP), plain
/// `http(s)://` URLs, and bare socket paths. Construction is lazy; the
/// daemon is first contacted by the first API call.
pub fn connect(endpoint: &str) -> Result<Docker, DockerError> {
    let connected = if let Some(path) = endpoint.strip_prefix("unix://") {
        Docker::connect_with_socket(path, CONNECT_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
    } else if endpoint.starts_with("tcp://") {
        let url = endpoint.replacen("tcp://", "http://", 1);
        Docker::connect_with_http(&url, CONNECT_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
    } else if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Docker::connect_with_http(endpoint, CONNECT_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
    } else {
        Docker::connect_with_socket(endpoint, CONNECT_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
    };
    connected.map_err(|e| DockerError::ConnectionFailed {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_unix_socket_urls() {
        assert!(connect("unix:///var/run/docker.sock").is_ok());
    }

    #[test]
    fn accepts_bare_socket_paths() {
        assert!(connect("/var/run/docker.sock").is_ok());
    }

    #[test]
    fn accepts_tcp_urls() {
        assert!(connect("tcp://localhost:2375").is_ok());
    }
}
