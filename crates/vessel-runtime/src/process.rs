//! Spawning and reaping the container's init process.
//!
//! The container is started by re-executing this same binary in its
//! container-init mode inside four fresh namespaces, so the new process is
//! born directly inside them (and is pid 1 of the new pid namespace).

use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;

use vessel_common::constants::VOLUMES_ENV;
use vessel_common::types::{ContainerId, VolumeSpec};
use vessel_core::namespace::{spawn, NamespaceKind};

use crate::error::{Result, RuntimeError};

/// Mode argument that routes the re-executed binary into container-init.
pub const INIT_MODE: &str = "init";

/// Starts the container-init process for `id` inside new pid, mount,
/// network, and UTS namespaces.
///
/// The re-execution argv is `<self> init <id> <command…>`; volume specs
/// travel out of band in the [`VOLUMES_ENV`] environment variable. The
/// child inherits the caller's standard streams.
///
/// # Errors
///
/// Returns [`RuntimeError::Spawn`] if the executable path cannot be
/// resolved or process creation fails.
pub fn spawn_container_init(
    id: &ContainerId,
    command: &[String],
    volumes: &[VolumeSpec],
) -> Result<Pid> {
    let exe = std::fs::read_link("/proc/self/exe").map_err(|e| RuntimeError::Io {
        path: "/proc/self/exe".into(),
        source: e,
    })?;

    let mut args = Vec::with_capacity(command.len() + 2);
    args.push(INIT_MODE.to_owned());
    args.push(id.to_string());
    args.extend(command.iter().cloned());

    let volumes_env = volumes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let env = [(VOLUMES_ENV.to_owned(), volumes_env)];

    let pid = spawn::spawn_in_namespaces(&exe, &args, &env, &NamespaceKind::ALL)
        .map_err(|source| RuntimeError::Spawn { source })?;
    tracing::info!(id = %id, pid = pid.as_raw(), "container init spawned");
    Ok(pid)
}

/// Blocks until `pid` exits and returns its exit code.
///
/// A death by signal is reported as `128 + signal`, following shell
/// convention.
///
/// # Errors
///
/// Returns [`RuntimeError::Wait`] if the process cannot be waited on
/// (for example, it is not a child of the caller).
pub fn wait_for_exit(pid: Pid) -> Result<i32> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(code),
            Ok(WaitStatus::Signaled(_, signal, _)) => return Ok(128 + signal as i32),
            Ok(_) => {}
            Err(Errno::EINTR) => {}
            Err(source) => return Err(RuntimeError::Wait { source }),
        }
    }
}

/// Reaps `pid` without blocking indefinitely; used during rollback where
/// the child has just been killed.
pub fn reap(pid: Pid) {
    if let Err(e) = waitpid(pid, None) {
        tracing::debug!(pid = pid.as_raw(), error = %e, "child already reaped");
    }
}
