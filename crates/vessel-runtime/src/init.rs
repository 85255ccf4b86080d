//! Container-init: the first code path inside the new namespaces.
//!
//! Runs once, strictly ordered, and never returns control to the
//! orchestrator: volumes are bind-mounted under the eventual root, the
//! hostname is set, the process chroots into the unpacked image, `/proc`
//! is mounted so the command sees its own process table, and finally the
//! process image is replaced by the user's command.

use std::convert::Infallible;
use std::ffi::CString;
use std::path::Path;

use nix::unistd::{execvp, sethostname};

use vessel_common::config::RuntimeConfig;
use vessel_common::constants::VOLUMES_ENV;
use vessel_common::types::{ContainerId, VolumeSpec};
use vessel_core::filesystem::{mount, rootfs};
use vessel_core::CoreError;

use crate::error::Result;
use crate::names;

/// Executes the bootstrap sequence and replaces this process with the
/// user command.
///
/// Volume specs are read from the [`VOLUMES_ENV`] variable; a mount that
/// fails is logged and skipped, it does not abort the container. All
/// later steps are fatal.
///
/// # Errors
///
/// Returns [`CoreError::Bootstrap`] (wrapped) if the hostname, chroot,
/// or proc mount fails, or if the command cannot be executed. On success
/// this function does not return.
pub fn run(config: &RuntimeConfig, id: &ContainerId, command: &[String]) -> Result<Infallible> {
    let root = config.rootfs_dir(id);
    tracing::debug!(id = %id, rootfs = %root.display(), "container init starting");

    mount_volumes(&root);

    let hostname = names::hostname(id);
    sethostname(&hostname).map_err(|e| bootstrap("sethostname", &e.to_string()))?;

    rootfs::enter_rootfs(&root)?;

    // Some minimal images ship without a /proc mount point.
    if let Err(e) = std::fs::create_dir_all("/proc") {
        tracing::debug!(error = %e, "could not create /proc mount point");
    }
    mount::mount_proc()?;

    exec_command(command)
}

/// Bind-mounts each requested volume under the container root.
fn mount_volumes(root: &Path) {
    let Ok(raw) = std::env::var(VOLUMES_ENV) else {
        return;
    };
    for spec in raw.split(',').filter(|s| !s.is_empty()) {
        let parsed: VolumeSpec = match spec.parse() {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(spec, error = %e, "skipping invalid volume spec");
                continue;
            }
        };
        let relative = parsed
            .container_path
            .strip_prefix("/")
            .unwrap_or(&parsed.container_path);
        let target = root.join(relative);
        if let Err(e) = std::fs::create_dir_all(&target) {
            tracing::warn!(target = %target.display(), error = %e, "skipping volume, cannot create mount point");
            continue;
        }
        if let Err(e) = mount::bind_mount(&parsed.host_path, &target) {
            tracing::warn!(spec, error = %e, "skipping volume, bind mount failed");
        }
    }
}

/// Replaces the process image with the user command.
fn exec_command(command: &[String]) -> Result<Infallible> {
    let [program, ..] = command else {
        return Err(bootstrap("exec", "empty command").into());
    };
    let program_c =
        CString::new(program.as_str()).map_err(|_| bootstrap("exec", "NUL byte in command"))?;
    let mut argv = Vec::with_capacity(command.len());
    for arg in command {
        argv.push(
            CString::new(arg.as_str()).map_err(|_| bootstrap("exec", "NUL byte in argument"))?,
        );
    }

    // On success execvp never returns.
    match execvp(&program_c, &argv) {
        Err(e) => Err(bootstrap("exec", &format!("{program}: {e}")).into()),
        Ok(never) => match never {},
    }
}

fn bootstrap(step: &'static str, message: &str) -> CoreError {
    CoreError::Bootstrap {
        step,
        message: message.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;

    #[test]
    fn exec_command_rejects_empty_command() {
        let err = exec_command(&[]).expect_err("empty command");
        assert!(matches!(
            err,
            RuntimeError::Core {
                source: CoreError::Bootstrap { step: "exec", .. }
            }
        ));
    }

    #[test]
    fn exec_command_reports_missing_binary() {
        let err = exec_command(&["/definitely/not/a/binary".into()]).expect_err("missing binary");
        assert!(matches!(
            err,
            RuntimeError::Core {
                source: CoreError::Bootstrap { step: "exec", .. }
            }
        ));
    }
}
