//! Domain primitive types used across the Vessel workspace.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VesselError;

/// Unique identifier for a container instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random container ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resource ceilings applied to a container's cgroup.
///
/// The CPU limit is a quota/period pair: the container may consume at most
/// `cpu_quota_us` microseconds of CPU time per `cpu_period_us` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// CPU quota in microseconds per period.
    pub cpu_quota_us: u64,
    /// CPU period in microseconds.
    pub cpu_period_us: u64,
    /// Memory ceiling in bytes.
    pub memory_bytes: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpu_quota_us: crate::constants::DEFAULT_CPU_QUOTA_US,
            cpu_period_us: crate::constants::DEFAULT_CPU_PERIOD_US,
            memory_bytes: crate::constants::DEFAULT_MEMORY_BYTES,
        }
    }
}

/// Lifecycle state of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerState {
    /// Container has been created but not yet started.
    Created,
    /// Container is actively running.
    Running,
    /// Container's main process has exited or been killed.
    Stopped,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// A bind-mount request: a host path made visible inside the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSpec {
    /// Source path on the host.
    pub host_path: PathBuf,
    /// Destination path inside the container's root filesystem.
    pub container_path: PathBuf,
}

impl FromStr for VolumeSpec {
    type Err = VesselError;

    /// Parses the `host:container` form used by `vsl run -v`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((host, container)) if !host.is_empty() && !container.is_empty() => Ok(Self {
                host_path: PathBuf::from(host),
                container_path: PathBuf::from(container),
            }),
            _ => Err(VesselError::Config {
                message: format!("invalid volume spec {s:?}, expected host:container"),
            }),
        }
    }
}

impl fmt::Display for VolumeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.host_path.display(),
            self.container_path.display()
        )
    }
}

/// A published port: host traffic on `host_port` is redirected to the
/// container's address on `container_port`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortMapping {
    /// TCP port on the host.
    pub host_port: u16,
    /// TCP port inside the container.
    pub container_port: u16,
}

impl FromStr for PortMapping {
    type Err = VesselError;

    /// Parses the `host:container` form used by `vsl run -p`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VesselError::Config {
            message: format!("invalid port mapping {s:?}, expected host:container"),
        };
        let (host, container) = s.split_once(':').ok_or_else(invalid)?;
        Ok(Self {
            host_port: host.parse().map_err(|_| invalid())?,
            container_port: container.parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host_port, self.container_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = ContainerId::generate();
        let b = ContainerId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn volume_spec_parses_host_and_container() {
        let v: VolumeSpec = "/data:/mnt/data".parse().expect("valid spec");
        assert_eq!(v.host_path, PathBuf::from("/data"));
        assert_eq!(v.container_path, PathBuf::from("/mnt/data"));
    }

    #[test]
    fn volume_spec_rejects_missing_separator() {
        assert!("/data".parse::<VolumeSpec>().is_err());
    }

    #[test]
    fn volume_spec_rejects_empty_sides() {
        assert!(":/mnt".parse::<VolumeSpec>().is_err());
        assert!("/data:".parse::<VolumeSpec>().is_err());
    }

    #[test]
    fn volume_spec_display_round_trips() {
        let v: VolumeSpec = "/a:/b".parse().expect("valid spec");
        assert_eq!(v.to_string(), "/a:/b");
    }

    #[test]
    fn port_mapping_parses_both_ports() {
        let p: PortMapping = "8080:80".parse().expect("valid mapping");
        assert_eq!(p.host_port, 8080);
        assert_eq!(p.container_port, 80);
    }

    #[test]
    fn port_mapping_rejects_non_numeric() {
        assert!("http:80".parse::<PortMapping>().is_err());
        assert!("8080:web".parse::<PortMapping>().is_err());
    }

    #[test]
    fn port_mapping_rejects_out_of_range() {
        assert!("99999:80".parse::<PortMapping>().is_err());
    }

    #[test]
    fn default_limits_match_documented_ceilings() {
        let limits = ResourceLimits::default();
        assert_eq!(limits.cpu_quota_us, 100_000);
        assert_eq!(limits.cpu_period_us, 1_000_000);
        assert_eq!(limits.memory_bytes, 100 * 1024 * 1024);
    }
}
