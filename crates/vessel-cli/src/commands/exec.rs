//! `vsl exec` — Execute a command inside a running container.

use clap::Args;
use vessel_runtime::engine::Engine;

/// Arguments for the `exec` command.
#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Container id (or unique prefix).
    pub container: String,

    /// Command to execute.
    #[arg(trailing_var_arg = true, required = true)]
    pub command: Vec<String>,
}

/// Executes the `exec` command.
///
/// Joins the target container's namespaces, chroots into its root
/// filesystem, runs the command with inherited standard streams, and
/// exits with the command's status.
///
/// # Errors
///
/// Returns an error if the caller is not root, the container is not
/// running, or the helper cannot be spawned.
pub fn execute(args: ExecArgs) -> anyhow::Result<()> {
    super::ensure_root()?;
    let engine = Engine::new().map_err(|e| anyhow::anyhow!("{e}"))?;
    let id = super::resolve_container_id(&engine, &args.container)?;

    let code = engine
        .exec(&id, &args.command)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    std::process::exit(code);
}
