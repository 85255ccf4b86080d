//! System-wide constants and default paths.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Default base directory for Vessel data.
pub const SYSTEM_DATA_DIR: &str = "/var/lib/vessel";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "VESSEL_DATA_DIR";

/// Environment variable carrying volume specs to container-init.
pub const VOLUMES_ENV: &str = "VESSEL_VOLUMES";

/// Returns the data directory, honoring the `VESSEL_DATA_DIR` override.
fn resolve_data_dir() -> PathBuf {
    std::env::var(DATA_DIR_ENV)
        .map_or_else(|_| PathBuf::from(SYSTEM_DATA_DIR), PathBuf::from)
}

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the resolved data directory for this session.
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(resolve_data_dir)
}

/// Cgroups v2 unified hierarchy mount point.
pub const CGROUP_V2_PATH: &str = "/sys/fs/cgroup";

/// Parent directory for per-container cgroup scopes.
pub const CGROUP_PARENT: &str = "vessel";

/// Name of the shared bridge device all containers attach to.
pub const BRIDGE_NAME: &str = "vessel0";

/// Gateway address assigned to the bridge.
pub const GATEWAY_ADDRESS: &str = "10.67.0.1";

/// Network address of the container subnet.
pub const SUBNET_ADDRESS: &str = "10.67.0.0";

/// Prefix length of the container subnet.
pub const SUBNET_PREFIX_LEN: u8 = 24;

/// Canonical name of the container-side network interface.
pub const CONTAINER_IFACE: &str = "eth0";

/// Prefix prepended to the host side of each veth pair.
pub const VETH_PREFIX: &str = "veth";

/// Hex characters of the id hash used in veth names.
///
/// `veth` plus 8 hex characters stays well under the kernel's 15-byte
/// interface name limit.
pub const VETH_TOKEN_LEN: usize = 8;

/// Hex characters of the id hash used as the container hostname.
pub const HOSTNAME_TOKEN_LEN: usize = 12;

/// Default CPU quota in microseconds per period.
pub const DEFAULT_CPU_QUOTA_US: u64 = 100_000;

/// Default CPU period in microseconds.
pub const DEFAULT_CPU_PERIOD_US: u64 = 1_000_000;

/// Default memory ceiling in bytes (100 MiB).
pub const DEFAULT_MEMORY_BYTES: u64 = 100 * 1024 * 1024;

/// Application name used in logging and state files.
pub const APP_NAME: &str = "vessel";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "vsl";
