//! Container detach workflow
//!
//! The mirror of attach, minus its policy flags and liveness probing:
//! backend failures come back verbatim and are never reclassified.

use tracing::debug;

use crate::config::AppConfig;
use crate::docker::{BollardInspector, ContainerInspector};
use crate::error::{AppError, UsageError};
use crate::network::cidr::parse_ranges;
use crate::network::veth::NetlinkBackend;
use crate::network::{DetachmentRequest, NetnsBackend};

const USAGE: &str = "<container-id> <cidr>...";

/// Runs the detach workflow against the given collaborators.
async fn detach_with<I, B>(
    inspector: &I,
    backend: &B,
    interface: &str,
    args: &[String],
) -> Result<(), AppError>
where
    I: ContainerInspector,
    B: NetnsBackend,
{
    if args.len() < 2 {
        return Err(UsageError::MissingArguments {
            command: "detach",
            usage: USAGE,
        }
        .into());
    }
    let container_id = &args[0];
    let pid = inspector.container_pid(container_id).await?;
    let ranges = parse_ranges(&args[1..])?;

    debug!(container_id = %container_id, pid, "detaching container");
    backend
        .detach(DetachmentRequest {
            pid,
            container_id: container_id.clone(),
            interface: interface.to_string(),
            ranges,
        })
        .await?;
    Ok(())
}

/// Production entry point wired from configuration.
pub async fn run(config: &AppConfig, args: &[String]) -> Result<(), AppError> {
    let inspector = BollardInspector::new(&config.docker_host)?;
    let backend = NetlinkBackend::new()?;
    detach_with(&inspector, &backend, &config.container_ifname, args).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::mocks::{MockInspector, RecordingBackend};
    use crate::error::NetworkError;

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn requires_a_container_and_at_least_one_cidr() {
        let inspector = MockInspector { pid: Some(4242) };
        let backend = RecordingBackend::new();

        let err = detach_with(&inspector, &backend, "ethov", &strings(&["c1"]))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("usage: detach"), "{message}");
        assert!(backend.detach_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn builds_the_full_request_for_the_backend() {
        let inspector = MockInspector { pid: Some(4242) };
        let backend = RecordingBackend::new();

        detach_with(
            &inspector,
            &backend,
            "ethov",
            &strings(&["c1", "10.32.0.5/12", "10.40.0.1/16"]),
        )
        .await
        .unwrap();

        let calls = backend.detach_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let request = &calls[0];
        assert_eq!(request.pid, 4242);
        assert_eq!(request.container_id, "c1");
        assert_eq!(request.interface, "ethov");
        assert_eq!(request.ranges.len(), 2);
        assert_eq!(request.ranges[0].to_string(), "10.32.0.5/12");
    }

    #[tokio::test]
    async fn malformed_cidr_aborts_before_the_backend() {
        let inspector = MockInspector { pid: Some(4242) };
        let backend = RecordingBackend::new();

        let err = detach_with(&inspector, &backend, "ethov", &strings(&["c1", "bogus"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Network(NetworkError::InvalidCidr { .. })
        ));
        assert!(backend.detach_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn backend_errors_are_never_reinterpreted() {
        // Pid far above any configurable pid_max: the process is long gone,
        // yet the failure must still come back as the backend spoke it.
        let inspector = MockInspector { pid: Some(0x7f00_0000) };
        let backend = RecordingBackend::failing("interface vanished");

        let err = detach_with(&inspector, &backend, "ethov", &strings(&["c1", "10.0.0.1/24"]))
            .await
            .unwrap_err();

        match err {
            AppError::Network(NetworkError::OperationFailed(message)) => {
                assert_eq!(message, "interface vanished");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
