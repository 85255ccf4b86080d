//! Error types for the isolation primitives.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the cgroup, namespace, filesystem, and network layers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cgroup scope could not be created, configured, or deleted.
    #[error("resource controller failure for scope {name}: {message}")]
    ResourceController {
        /// Name of the cgroup scope.
        name: String,
        /// Description of the failing operation.
        message: String,
    },

    /// A cgroup scope still has member processes and cannot be deleted.
    #[error("cgroup scope {name} is busy: still has member processes")]
    ResourceBusy {
        /// Name of the busy scope.
        name: String,
    },

    /// Bridge, veth, address, or route configuration failed.
    #[error("network setup failed: {message}")]
    NetworkSetup {
        /// Description of the failing step.
        message: String,
    },

    /// A NAT rule could not be installed or removed.
    #[error("port mapping for host port {host_port} failed: {message}")]
    PortMapping {
        /// Host port of the failing mapping.
        host_port: u16,
        /// Description of the failure.
        message: String,
    },

    /// A fatal failure inside container-init.
    #[error("container bootstrap failed at {step}: {message}")]
    Bootstrap {
        /// Bootstrap step that failed.
        step: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// A namespace syscall failed.
    #[error("namespace operation {op} failed: {source}")]
    Namespace {
        /// Operation that failed (`clone`, `setns`, ...).
        op: &'static str,
        /// Underlying errno.
        #[source]
        source: nix::Error,
    },

    /// An argument could not be converted for a syscall.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the offending value.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Convenience alias for this crate.
pub type Result<T> = std::result::Result<T, CoreError>;
