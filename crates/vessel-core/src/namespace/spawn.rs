//! Spawning a process inside freshly created namespaces.
//!
//! Uses `clone(2)` rather than `unshare(2)`-after-fork: a process that
//! unshares its pid namespace is not itself moved into it, only its future
//! children are. Cloning with `CLONE_NEWPID` makes the child pid 1 of the
//! new namespace, which container-init relies on when it mounts `/proc`
//! and finally execs the user command.

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use nix::sys::signal::Signal;
use nix::unistd::{execve, Pid};

use super::{clone_flags, NamespaceKind};
use crate::error::{CoreError, Result};

/// Stack size handed to `clone(2)` for the child.
const CHILD_STACK_SIZE: usize = 1024 * 1024;

/// Exit code surfaced when the child fails to exec its target.
pub const EXEC_FAILURE_CODE: i32 = 127;

/// Spawns `program` with `args` inside new instances of the given
/// namespaces, returning the child's pid as seen from the host.
///
/// The child inherits the caller's environment plus `extra_env`, and the
/// caller's standard streams. It is reapable with `waitpid` (the clone is
/// armed with `SIGCHLD`).
///
/// # Errors
///
/// Returns [`CoreError::InvalidArgument`] if an argument contains an
/// interior NUL byte, or [`CoreError::Namespace`] if the `clone(2)` call
/// itself fails. An exec failure inside the child is not observable here;
/// it surfaces as child exit code [`EXEC_FAILURE_CODE`].
pub fn spawn_in_namespaces(
    program: &Path,
    args: &[String],
    extra_env: &[(String, String)],
    kinds: &[NamespaceKind],
) -> Result<Pid> {
    let flags = clone_flags(kinds);
    let program_c = cstring(program.as_os_str().as_bytes())?;

    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push(program_c.clone());
    for arg in args {
        argv.push(cstring(arg.as_bytes())?);
    }

    let mut envp = Vec::new();
    for (key, value) in std::env::vars() {
        envp.push(cstring(format!("{key}={value}").as_bytes())?);
    }
    for (key, value) in extra_env {
        envp.push(cstring(format!("{key}={value}").as_bytes())?);
    }

    let mut stack = vec![0u8; CHILD_STACK_SIZE];
    let cb = Box::new(|| {
        // Runs in the child. On success execve never returns; the return
        // value below becomes the child's exit code.
        drop(execve(&program_c, &argv, &envp));
        EXEC_FAILURE_CODE as isize
    });

    let pid = unsafe {
        nix::sched::clone(cb, &mut stack, flags, Some(Signal::SIGCHLD as libc::c_int))
    }
    .map_err(|source| CoreError::Namespace {
        op: "clone",
        source,
    })?;

    tracing::info!(pid = pid.as_raw(), program = %program.display(), ?flags, "spawned namespaced child");
    Ok(pid)
}

fn cstring(bytes: &[u8]) -> Result<CString> {
    CString::new(bytes).map_err(|_| CoreError::InvalidArgument {
        message: format!(
            "value contains interior NUL: {:?}",
            String::from_utf8_lossy(bytes)
        ),
    })
}
