//! Docker overlay attach - wires running containers into an overlay network
//!
//! This library provides the pieces behind the `attach`, `detach`, and
//! `rewrite-hosts` operations: resolving container init pids through the
//! Docker daemon, validating network namespace separation, provisioning
//! veth pairs across namespaces over netlink, and rewriting container
//! hosts files with overlay addresses.

pub mod commands;
pub mod config;
pub mod docker;
pub mod error;
pub mod hosts;
pub mod network;
pub mod process;

pub use error::AppError;
