//! Cgroups v2 resource management.
//!
//! Each container gets exactly one scope under
//! `/sys/fs/cgroup/vessel/<name>` holding its CPU and memory ceilings.
//! The scope is created after the container process exists, attaches that
//! process's pid, and is deleted once the process has exited.

pub mod cpu;
pub mod memory;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use vessel_common::constants::{CGROUP_PARENT, CGROUP_V2_PATH};
use vessel_common::types::ResourceLimits;

use crate::error::{CoreError, Result};

/// Handle to one container's cgroup scope.
#[derive(Debug)]
pub struct CgroupScope {
    name: String,
    path: PathBuf,
}

impl CgroupScope {
    /// Creates (or opens) the scope named `name` and applies `limits`.
    ///
    /// The parent directory is created on first use and its `cpu` and
    /// `memory` controllers are enabled for children. Enabling is
    /// best-effort: on hosts where the controllers are already delegated
    /// the write fails with `EBUSY`/`EACCES` and the limit writes below
    /// still succeed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ResourceController`] if the controller
    /// filesystem is unavailable or a limit cannot be written.
    pub fn create(name: &str, limits: &ResourceLimits) -> Result<Self> {
        Self::create_under(Path::new(CGROUP_V2_PATH), name, limits)
    }

    /// Creates the scope under an explicit controller root.
    ///
    /// # Errors
    ///
    /// Same contract as [`CgroupScope::create`].
    pub fn create_under(root: &Path, name: &str, limits: &ResourceLimits) -> Result<Self> {
        let parent = root.join(CGROUP_PARENT);
        std::fs::create_dir_all(&parent).map_err(|e| controller_err(name, "create parent", &e))?;
        enable_controllers(&root.join("cgroup.subtree_control"));
        enable_controllers(&parent.join("cgroup.subtree_control"));

        let path = parent.join(name);
        std::fs::create_dir_all(&path).map_err(|e| controller_err(name, "create scope", &e))?;

        let scope = Self {
            name: name.to_owned(),
            path,
        };
        scope.apply_limits(limits)?;
        tracing::info!(scope = %scope.path.display(), "cgroup scope created");
        Ok(scope)
    }

    /// Opens an existing scope without touching its limits.
    #[must_use]
    pub fn open(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            path: PathBuf::from(CGROUP_V2_PATH).join(CGROUP_PARENT).join(name),
        }
    }

    /// Writes the CPU and memory ceilings into the scope's control files.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ResourceController`] if a control file cannot
    /// be written.
    pub fn apply_limits(&self, limits: &ResourceLimits) -> Result<()> {
        cpu::set_cpu_max(&self.path, limits.cpu_quota_us, limits.cpu_period_us)
            .map_err(|e| controller_io(&self.name, &e))?;
        memory::set_memory_max(&self.path, limits.memory_bytes)
            .map_err(|e| controller_io(&self.name, &e))?;
        Ok(())
    }

    /// Attaches a process to this scope by writing its pid to `cgroup.procs`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ResourceController`] if the write fails, which
    /// includes the case of a pid that has already exited.
    pub fn add_process(&self, pid: u32) -> Result<()> {
        let procs_path = self.path.join("cgroup.procs");
        std::fs::write(&procs_path, pid.to_string())
            .map_err(|e| controller_err(&self.name, "attach process", &e))?;
        tracing::debug!(pid, scope = %self.name, "process attached to cgroup");
        Ok(())
    }

    /// Deletes the scope.
    ///
    /// An already-absent scope is not an error, so repeated teardown
    /// converges. A scope that still has member processes fails with
    /// [`CoreError::ResourceBusy`]; callers must ensure the member process
    /// has exited first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ResourceBusy`] if the scope has live members,
    /// or [`CoreError::ResourceController`] for other failures.
    pub fn destroy(&self) -> Result<()> {
        match std::fs::remove_dir(&self.path) {
            Ok(()) => {
                tracing::info!(scope = %self.name, "cgroup scope destroyed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) if e.raw_os_error() == Some(libc::EBUSY) => Err(CoreError::ResourceBusy {
                name: self.name.clone(),
            }),
            Err(e) => Err(controller_err(&self.name, "delete scope", &e)),
        }
    }

    /// Path of the scope directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the scope.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Best-effort enabling of the cpu and memory controllers for children.
fn enable_controllers(subtree_control: &Path) {
    if let Err(e) = std::fs::write(subtree_control, "+cpu +memory") {
        tracing::debug!(
            path = %subtree_control.display(),
            error = %e,
            "could not enable controllers, assuming already delegated"
        );
    }
}

fn controller_err(name: &str, op: &str, e: &std::io::Error) -> CoreError {
    CoreError::ResourceController {
        name: name.to_owned(),
        message: format!("{op}: {e}"),
    }
}

fn controller_io(name: &str, e: &CoreError) -> CoreError {
    CoreError::ResourceController {
        name: name.to_owned(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Exercised against a plain tempdir: the control-file writers only do
    // path arithmetic and file writes, so they behave identically outside
    // a real cgroupfs.

    #[test]
    fn create_under_writes_limit_files() {
        let root = tempfile::tempdir().expect("tempdir");
        let limits = ResourceLimits::default();
        let scope =
            CgroupScope::create_under(root.path(), "c1", &limits).expect("scope creation");

        let cpu_max = std::fs::read_to_string(scope.path().join("cpu.max")).expect("cpu.max");
        assert_eq!(cpu_max, "100000 1000000");
        let mem_max =
            std::fs::read_to_string(scope.path().join("memory.max")).expect("memory.max");
        assert_eq!(mem_max, (100 * 1024 * 1024).to_string());
    }

    #[test]
    fn scope_path_nests_under_parent() {
        let root = tempfile::tempdir().expect("tempdir");
        let scope = CgroupScope::create_under(root.path(), "abc", &ResourceLimits::default())
            .expect("scope creation");
        assert!(scope.path().ends_with("vessel/abc"));
    }

    #[test]
    fn destroy_absent_scope_is_ok() {
        let scope = CgroupScope::open("vessel-test-ghost-scope");
        scope.destroy().expect("absent scope is a no-op");
    }

    #[test]
    fn destroy_converges_once_the_scope_is_empty() {
        let root = tempfile::tempdir().expect("tempdir");
        let scope = CgroupScope::create_under(root.path(), "gone", &ResourceLimits::default())
            .expect("scope creation");
        // On cgroupfs the control files vanish with the rmdir; a plain
        // tempdir needs them cleared by hand first.
        for file in ["cpu.max", "memory.max"] {
            std::fs::remove_file(scope.path().join(file)).expect("clear control file");
        }
        scope.destroy().expect("first destroy");
        scope.destroy().expect("second destroy is a no-op");
    }

    #[test]
    fn add_process_writes_procs_file() {
        let root = tempfile::tempdir().expect("tempdir");
        let scope = CgroupScope::create_under(root.path(), "p", &ResourceLimits::default())
            .expect("scope creation");
        scope.add_process(4242).expect("attach");
        let procs =
            std::fs::read_to_string(scope.path().join("cgroup.procs")).expect("cgroup.procs");
        assert_eq!(procs, "4242");
    }
}
