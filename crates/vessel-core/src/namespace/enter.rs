//! Joining the namespaces of a live process via `setns(2)`.

use std::fs::File;

use nix::sched::{setns, CloneFlags};

use super::{ns_path, NamespaceKind};
use crate::error::{CoreError, Result};

/// Moves the calling thread into one namespace of the target process.
///
/// For pid namespaces the kernel applies the change to *children* of the
/// caller, not the caller itself; callers that need to land inside the
/// target pid namespace must fork once more after entering.
///
/// # Errors
///
/// Returns an error if the namespace file cannot be opened (typically the
/// target process has exited) or the `setns(2)` call fails.
pub fn enter(target_pid: i32, kind: NamespaceKind) -> Result<()> {
    let path = ns_path(target_pid, kind);
    let file = File::open(&path).map_err(|e| CoreError::Io {
        path: path.clone(),
        source: e,
    })?;
    setns(&file, kind.flag()).map_err(|source| CoreError::Namespace {
        op: "setns",
        source,
    })?;
    tracing::trace!(target_pid, ns = kind.proc_name(), "entered namespace");
    Ok(())
}

/// Moves the calling thread into all of the given namespaces of the target.
///
/// # Errors
///
/// Propagates the first [`enter`] failure.
pub fn enter_all(target_pid: i32, kinds: &[NamespaceKind]) -> Result<()> {
    for kind in kinds {
        enter(target_pid, *kind)?;
    }
    Ok(())
}

/// Scoped entry into another process's network namespace.
///
/// Holds an open handle to the caller's original network namespace and
/// restores it on drop, so the caller's view of the network is intact on
/// every exit path.
#[derive(Debug)]
pub struct NetnsGuard {
    original: File,
}

impl NetnsGuard {
    /// Enters the network namespace of `target_pid`.
    ///
    /// # Errors
    ///
    /// Returns an error if either namespace file cannot be opened or the
    /// switch fails; the caller's namespace is untouched on error.
    pub fn enter(target_pid: i32) -> Result<Self> {
        let original = File::open("/proc/self/ns/net").map_err(|e| CoreError::Io {
            path: "/proc/self/ns/net".into(),
            source: e,
        })?;
        enter(target_pid, NamespaceKind::Network)?;
        tracing::debug!(target_pid, "switched into container network namespace");
        Ok(Self { original })
    }
}

impl Drop for NetnsGuard {
    fn drop(&mut self) {
        if let Err(e) = setns(&self.original, CloneFlags::CLONE_NEWNET) {
            // Leaves the process stranded in the container namespace; every
            // caller treats this as fatal for the surrounding operation.
            tracing::error!(error = %e, "failed to restore host network namespace");
        }
    }
}
