//! Container inspection via the Docker API

use bollard::query_parameters::InspectContainerOptions;
use bollard::Docker;
use tracing::debug;

use crate::docker::{connect, ContainerInspector};
use crate::error::DockerError;

/// [`ContainerInspector`] backed by the Docker daemon.
pub struct BollardInspector {
    docker: Docker,
}

impl BollardInspector {
    pub fn new(endpoint: &str) -> Result<Self, DockerError> {
        Ok(BollardInspector {
            docker: connect(endpoint)?,
        })
    }
}

impl ContainerInspector for BollardInspector {
    async fn container_pid(&self, container_id: &str) -> Result<i32, DockerError> {
        let details = self
            .docker
            .inspect_container(container_id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| DockerError::InspectFailed {
                container_id: container_id.to_string(),
                reason: e.to_string(),
            })?;

        // A stopped container inspects fine but reports pid 0.
        let pid = details.state.and_then(|state| state.pid).unwrap_or(0);
        if pid <= 0 {
            return Err(DockerError::NotRunning {
                container_id: container_id.to_string(),
            });
        }
        debug!(container_id, pid, "resolved container init process");
        Ok(pid as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_daemon_fails_inspection() {
        let inspector = BollardInspector::new("unix:///nonexistent/docker.sock").unwrap();
        // Whether the failure is connection refused or an unknown container
        // depends on the environment; either way resolution must error.
        assert!(inspector.container_pid("no-such-container").await.is_err());
    }
}
