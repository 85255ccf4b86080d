//! Error types for the lifecycle orchestrator.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use thiserror::Error;
use vessel_core::CoreError;
use vessel_image::ImageError;

/// Errors raised by the orchestrator and its sub-operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The image could not be materialized as a root filesystem.
    #[error(transparent)]
    ImagePreparation {
        /// Underlying image store failure.
        #[from]
        source: ImageError,
    },

    /// The container process could not be created.
    #[error("failed to spawn container process: {source}")]
    Spawn {
        /// Underlying clone/exec failure.
        source: CoreError,
    },

    /// A cgroup, namespace, filesystem, or network primitive failed.
    #[error(transparent)]
    Core {
        /// Underlying primitive failure.
        #[from]
        source: CoreError,
    },

    /// No record exists for the given container id, or its process is
    /// already gone where a live one is required.
    #[error("container not found: {id}")]
    NotFound {
        /// The unknown container id.
        id: String,
    },

    /// Waiting for a container or helper process failed.
    #[error("failed waiting for process: {source}")]
    Wait {
        /// Underlying errno.
        source: nix::Error,
    },

    /// Sending a signal to a container process failed.
    #[error("failed to signal process {pid}: {source}")]
    Signal {
        /// Target pid.
        pid: u32,
        /// Underlying errno.
        source: nix::Error,
    },

    /// The container subnet has no free addresses left.
    #[error("no free addresses in subnet {subnet}/{prefix_len}")]
    AddressPoolExhausted {
        /// Network address of the exhausted subnet.
        subnet: Ipv4Addr,
        /// Prefix length of the exhausted subnet.
        prefix_len: u8,
    },

    /// A derived short name is already taken by a live interface.
    #[error("interface name {name} already in use, refusing to reuse it")]
    NameCollision {
        /// The colliding interface name.
        name: String,
    },

    /// The caller lacks the privileges for container operations.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Description of the denied operation.
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

    /// A container record could not be encoded or decoded.
    #[error("container record serialization error: {source}")]
    State {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias for this crate.
pub type Result<T> = std::result::Result<T, RuntimeError>;
