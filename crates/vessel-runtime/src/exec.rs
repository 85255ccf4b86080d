//! Attaching an extra command to a running container.
//!
//! Entering another process's namespaces is unsafe from a multithreaded
//! caller, so each exec runs in a freshly forked, single-purpose helper
//! process that performs exactly one enter-and-exec sequence and is never
//! reused. Entering a pid namespace only applies to *children* of the
//! entering process, so the helper forks once more after `setns` and the
//! grandchild runs the command; the helper relays its exit status.

use std::ffi::CString;
use std::path::Path;

use nix::unistd::{execvp, fork, ForkResult};

use vessel_core::filesystem::rootfs::enter_rootfs;
use vessel_core::namespace::enter::enter_all;
use vessel_core::namespace::NamespaceKind;
use vessel_core::CoreError;

use crate::error::{Result, RuntimeError};
use crate::process::wait_for_exit;

/// Exit code of the helper when namespace entry or the chroot fails.
const SETUP_FAILURE_CODE: i32 = 126;

/// Exit code of the helper when the command cannot be executed.
const EXEC_FAILURE_CODE: i32 = 127;

/// Runs `command` inside the namespaces and root filesystem of the
/// container whose main process is `target_pid`, propagating the
/// command's exit status.
///
/// Standard streams are inherited all the way down to the command.
///
/// # Errors
///
/// Returns an error if the command is empty, the helper cannot be
/// forked, or waiting for it fails. Failures inside the helper surface
/// as exit codes 126 (setup) and 127 (exec), matching shell convention.
pub fn exec_in_container(target_pid: i32, rootfs: &Path, command: &[String]) -> Result<i32> {
    if command.is_empty() {
        return Err(RuntimeError::Core {
            source: CoreError::InvalidArgument {
                message: "exec command is empty".into(),
            },
        });
    }

    tracing::info!(target_pid, cmd = ?command, "exec into container");
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => wait_for_exit(child),
        Ok(ForkResult::Child) => {
            let code = attach_and_exec(target_pid, rootfs, command);
            std::process::exit(code);
        }
        Err(source) => Err(RuntimeError::Spawn {
            source: CoreError::Namespace {
                op: "fork",
                source,
            },
        }),
    }
}

/// Body of the helper process. Never returns an error across the fork
/// boundary; failures become exit codes.
fn attach_and_exec(target_pid: i32, rootfs: &Path, command: &[String]) -> i32 {
    if let Err(e) = enter_all(target_pid, &NamespaceKind::ALL) {
        tracing::error!(target_pid, error = %e, "failed to enter container namespaces");
        return SETUP_FAILURE_CODE;
    }
    if let Err(e) = enter_rootfs(rootfs) {
        tracing::error!(error = %e, "failed to enter container rootfs");
        return SETUP_FAILURE_CODE;
    }

    // The fork that actually lands inside the target pid namespace.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => wait_for_exit(child).unwrap_or(SETUP_FAILURE_CODE),
        Ok(ForkResult::Child) => {
            let code = exec_or_fail(command);
            std::process::exit(code);
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to fork into pid namespace");
            SETUP_FAILURE_CODE
        }
    }
}

fn exec_or_fail(command: &[String]) -> i32 {
    let Ok(program_c) = CString::new(command[0].as_str()) else {
        return EXEC_FAILURE_CODE;
    };
    let argv: Vec<CString> = command
        .iter()
        .filter_map(|arg| CString::new(arg.as_str()).ok())
        .collect();
    if argv.len() != command.len() {
        return EXEC_FAILURE_CODE;
    }
    match execvp(&program_c, &argv) {
        Err(e) => {
            tracing::error!(program = %command[0], error = %e, "exec failed");
            EXEC_FAILURE_CODE
        }
        Ok(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_rejected_before_forking() {
        let err = exec_in_container(1, Path::new("/"), &[]).expect_err("empty command");
        assert!(matches!(
            err,
            RuntimeError::Core {
                source: CoreError::InvalidArgument { .. }
            }
        ));
    }
}
