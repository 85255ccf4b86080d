//! Root switching into the container's unpacked image tree.

use std::path::Path;

use nix::unistd::{chdir, chroot};

use crate::error::{CoreError, Result};

/// Changes the process root to `rootfs` and the working directory to `/`.
///
/// Without a valid root the container cannot proceed, so both steps are
/// fatal.
///
/// # Errors
///
/// Returns an error if `chroot(2)` or the subsequent `chdir(2)` fails.
pub fn enter_rootfs(rootfs: &Path) -> Result<()> {
    chroot(rootfs).map_err(|e| CoreError::Bootstrap {
        step: "chroot",
        message: format!("{}: {e}", rootfs.display()),
    })?;
    chdir("/").map_err(|e| CoreError::Bootstrap {
        step: "chdir",
        message: e.to_string(),
    })?;
    tracing::debug!(rootfs = %rootfs.display(), "root switched");
    Ok(())
}
