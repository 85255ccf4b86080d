//! `vsl init` — Container-init entry point (hidden).
//!
//! The orchestrator re-executes this binary with this subcommand inside
//! the freshly created namespaces; the bootstrap sequence ends by
//! replacing the process image with the user's command, so on success
//! this handler never returns.

use clap::Args;
use vessel_common::config::RuntimeConfig;
use vessel_common::types::ContainerId;
use vessel_core::CoreError;
use vessel_runtime::RuntimeError;

/// Arguments for the hidden `init` command.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Container id assigned by the orchestrator.
    pub id: String,

    /// The user command to become.
    #[arg(trailing_var_arg = true, required = true)]
    pub command: Vec<String>,
}

/// Exit code when the user command cannot be located or executed.
const EXEC_FAILURE_CODE: i32 = 127;

/// Exit code for any earlier bootstrap failure.
const BOOTSTRAP_FAILURE_CODE: i32 = 1;

/// Executes the `init` command.
///
/// # Errors
///
/// Never returns an error: bootstrap failures are reported on stderr and
/// exit with a distinct code, and a successful bootstrap does not return.
pub fn execute(args: InitArgs) -> anyhow::Result<()> {
    let config = RuntimeConfig::default();
    let id = ContainerId::new(&args.id);

    match vessel_runtime::init::run(&config, &id, &args.command) {
        Ok(never) => match never {},
        Err(e) => {
            tracing::error!(id = %id, error = %e, "container bootstrap failed");
            let code = match &e {
                RuntimeError::Core {
                    source: CoreError::Bootstrap { step: "exec", .. },
                } => EXEC_FAILURE_CODE,
                _ => BOOTSTRAP_FAILURE_CODE,
            };
            std::process::exit(code);
        }
    }
}
