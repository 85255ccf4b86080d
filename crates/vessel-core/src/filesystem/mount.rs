//! Mount utilities for container filesystem setup.

use std::path::Path;

use nix::mount::{mount, MsFlags};

use crate::error::{CoreError, Result};

/// Creates a bind mount from `source` to `target`.
///
/// The target directory must already exist.
///
/// # Errors
///
/// Returns an error if the `mount(2)` syscall fails.
pub fn bind_mount(source: &Path, target: &Path) -> Result<()> {
    mount(
        Some(source),
        target,
        None::<&str>,
        MsFlags::MS_BIND,
        None::<&str>,
    )
    .map_err(|e| CoreError::Bootstrap {
        step: "bind mount",
        message: format!("{} -> {}: {e}", source.display(), target.display()),
    })?;
    tracing::debug!(
        source = %source.display(),
        target = %target.display(),
        "bind mount created"
    );
    Ok(())
}

/// Mounts a fresh `proc` filesystem at `/proc`.
///
/// Must run after the chroot so the mount lands inside the container's
/// tree, giving the container a view of its own (namespaced) process
/// table.
///
/// # Errors
///
/// Returns an error if the `mount(2)` syscall fails.
pub fn mount_proc() -> Result<()> {
    mount(
        Some("proc"),
        "/proc",
        Some("proc"),
        MsFlags::empty(),
        None::<&str>,
    )
    .map_err(|e| CoreError::Bootstrap {
        step: "proc mount",
        message: e.to_string(),
    })?;
    tracing::debug!("mounted /proc");
    Ok(())
}
