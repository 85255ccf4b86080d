//! CPU bandwidth control via cgroups v2.

use std::path::Path;

use crate::error::{CoreError, Result};

/// Sets the CPU bandwidth limit for a scope.
///
/// Writes `quota_us period_us` to `cpu.max`, where `quota_us` is the
/// maximum CPU time allowed per `period_us` window.
///
/// # Errors
///
/// Returns an error if writing to `cpu.max` fails.
pub fn set_cpu_max(cgroup_path: &Path, quota_us: u64, period_us: u64) -> Result<()> {
    let file = cgroup_path.join("cpu.max");
    let value = format!("{quota_us} {period_us}");
    std::fs::write(&file, value).map_err(|e| CoreError::Io {
        path: file,
        source: e,
    })?;
    tracing::debug!(quota_us, period_us, "CPU max quota set");
    Ok(())
}
