//! Global configuration model for the Vessel runtime.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::types::{ContainerId, ResourceLimits};

/// Root configuration for the Vessel runtime.
///
/// All paths and network parameters the engine needs are carried here so
/// that tests can point a runtime at a scratch directory and an unused
/// bridge without touching global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Base directory for Vessel state and data.
    pub data_dir: PathBuf,
    /// Name of the shared bridge device.
    pub bridge: String,
    /// Gateway address assigned to the bridge.
    pub gateway: Ipv4Addr,
    /// Network address of the container subnet.
    pub subnet: Ipv4Addr,
    /// Prefix length of the container subnet.
    pub subnet_prefix_len: u8,
    /// Default resource limits applied when `run` gives none.
    pub default_limits: ResourceLimits,
}

impl RuntimeConfig {
    /// Builds a config rooted at the given data directory, with default
    /// network parameters and limits.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Directory holding one subdirectory per container.
    #[must_use]
    pub fn containers_dir(&self) -> PathBuf {
        self.data_dir.join("containers")
    }

    /// Directory holding the OCI image store.
    #[must_use]
    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }

    /// Per-container state directory.
    #[must_use]
    pub fn container_dir(&self, id: &ContainerId) -> PathBuf {
        self.containers_dir().join(id.as_str())
    }

    /// Per-container bundle directory that `umoci` unpacks into.
    #[must_use]
    pub fn bundle_dir(&self, id: &ContainerId) -> PathBuf {
        self.container_dir(id).join("bundle")
    }

    /// Per-container root filesystem path.
    #[must_use]
    pub fn rootfs_dir(&self, id: &ContainerId) -> PathBuf {
        self.bundle_dir(id).join("rootfs")
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: constants::data_dir().clone(),
            bridge: constants::BRIDGE_NAME.to_owned(),
            gateway: parse_addr(constants::GATEWAY_ADDRESS),
            subnet: parse_addr(constants::SUBNET_ADDRESS),
            subnet_prefix_len: constants::SUBNET_PREFIX_LEN,
            default_limits: ResourceLimits::default(),
        }
    }
}

/// Parses a compile-time address constant.
fn parse_addr(s: &str) -> Ipv4Addr {
    s.parse().unwrap_or(Ipv4Addr::UNSPECIFIED)
}
