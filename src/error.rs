//! Centralized error types and handling

use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Usage(#[from] UsageError),

    #[error("Docker API error: {0}")]
    Docker(#[from] DockerError),

    #[error("Network operation error: {0}")]
    Network(#[from] NetworkError),

    #[error("Hosts file error: {0}")]
    Hosts(#[from] HostsError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed invocations: the caller's fault, reported before any kernel
/// or daemon state is touched.
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("usage: {command} {usage}")]
    MissingArguments {
        command: &'static str,
        usage: &'static str,
    },
}

/// Docker-related errors
#[derive(Debug, Error)]
pub enum DockerError {
    #[error("Failed to connect to Docker daemon at {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("Failed to inspect container {container_id}: {reason}")]
    InspectFailed { container_id: String, reason: String },

    #[error("Container {container_id} is not running")]
    NotRunning { container_id: String },
}

/// Network operation errors
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Invalid MTU {text:?}: {reason}")]
    InvalidMtu { text: String, reason: String },

    #[error("Invalid CIDR {text:?}: {reason}")]
    InvalidCidr { text: String, reason: String },

    #[error("Failed to open network namespace of container {container_id}: {reason}")]
    ContainerNamespace {
        container_id: String,
        reason: String,
    },

    #[error("Failed to open host network namespace: {reason}")]
    HostNamespace { reason: String },

    #[error(
        "Container appears to share the host's network namespace; \
         host-networked containers cannot be attached"
    )]
    HostNetworking,

    #[error("Container {container_id} died before the attach completed")]
    ContainerDied { container_id: String },

    #[error("Bridge {bridge} not found")]
    BridgeMissing { bridge: String },

    #[error("Interface {interface} not found")]
    InterfaceMissing { interface: String },

    #[error("Network operation failed: {0}")]
    OperationFailed(String),
}

/// Hosts file rewriting errors
#[derive(Debug, Error)]
pub enum HostsError {
    #[error("Malformed extra host entry {entry:?}, expected name:address")]
    MalformedExtraHost { entry: String },

    #[error("Docker endpoint {endpoint} is unreachable: {reason}")]
    EndpointUnreachable { endpoint: String, reason: String },

    #[error("Failed to write hosts file {path}: {reason}")]
    WriteFailed { path: String, reason: String },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid configuration format: {0}")]
    InvalidFormat(String),

    #[error("Invalid interface name {name:?}")]
    InvalidInterfaceName { name: String },
}
