//! Memory ceiling control via cgroups v2.

use std::path::Path;

use crate::error::{CoreError, Result};

/// Sets the hard memory limit for a scope by writing `memory.max`.
///
/// # Errors
///
/// Returns an error if writing to `memory.max` fails.
pub fn set_memory_max(cgroup_path: &Path, bytes: u64) -> Result<()> {
    let file = cgroup_path.join("memory.max");
    std::fs::write(&file, bytes.to_string()).map_err(|e| CoreError::Io {
        path: file,
        source: e,
    })?;
    tracing::debug!(bytes, "memory ceiling set");
    Ok(())
}
