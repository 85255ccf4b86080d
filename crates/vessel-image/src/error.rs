//! Error types for image acquisition and unpacking.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the image store.
#[derive(Debug, Error)]
pub enum ImageError {
    /// An image could not be pulled or materialized as a rootfs.
    #[error("failed to prepare image {image}: {message}")]
    Preparation {
        /// Image reference being prepared.
        image: String,
        /// Description of the failure.
        message: String,
    },

    /// A stored image directory does not form a valid OCI layout.
    #[error("invalid OCI layout at {path}: {missing} not found")]
    InvalidLayout {
        /// Image directory that failed validation.
        path: PathBuf,
        /// Layout element that was missing.
        missing: &'static str,
    },

    /// An external tool the store delegates to is not installed.
    #[error("required tool not found in PATH: {tool}")]
    MissingTool {
        /// Name of the missing binary.
        tool: &'static str,
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
pub type Result<T> = std::result::Result<T, ImageError>;
