//! CLI command definitions and dispatch.

pub mod exec;
pub mod images;
pub mod init;
pub mod ps;
pub mod pull;
pub mod run;
pub mod stop;

use clap::{Parser, Subcommand};

/// Vessel — daemon-less minimal container runtime.
#[derive(Parser, Debug)]
#[command(name = "vsl", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create and run a container from a pulled image.
    Run(run::RunArgs),
    /// Pull an image from a registry into the local store.
    Pull(pull::PullArgs),
    /// List containers.
    Ps(ps::PsArgs),
    /// Execute a command inside a running container.
    Exec(exec::ExecArgs),
    /// Stop containers and clean up their resources.
    Stop(stop::StopArgs),
    /// List images in the local store.
    Images(images::ImagesArgs),
    /// Print the version.
    Version,
    /// Container-init entry point used by the re-executed runtime.
    #[command(hide = true)]
    Init(init::InitArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run(args) => run::execute(args),
        Command::Pull(args) => pull::execute(args),
        Command::Ps(args) => ps::execute(args),
        Command::Exec(args) => exec::execute(args),
        Command::Stop(args) => stop::execute(args),
        Command::Images(args) => images::execute(args),
        Command::Version => {
            println!("vessel {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Init(args) => init::execute(args),
    }
}

/// Resolves a full id or unique id prefix (as printed by `ps`) to a
/// known container id.
pub(crate) fn resolve_container_id(
    engine: &vessel_runtime::engine::Engine,
    needle: &str,
) -> anyhow::Result<vessel_common::types::ContainerId> {
    let records = engine.list().map_err(|e| anyhow::anyhow!("{e}"))?;
    let mut matches = records
        .iter()
        .filter(|r| r.id.as_str().starts_with(needle));
    match (matches.next(), matches.next()) {
        (Some(record), None) => Ok(record.id.clone()),
        (Some(_), Some(_)) => Err(anyhow::anyhow!("ambiguous container id prefix: {needle}")),
        (None, _) => Err(anyhow::anyhow!("container not found: {needle}")),
    }
}

/// Refuses to proceed without root privileges.
///
/// Namespace, cgroup, and iptables manipulation all require them; failing
/// early gives one clear message instead of a cascade of EPERM errors.
pub(crate) fn ensure_root() -> anyhow::Result<()> {
    if nix::unistd::Uid::effective().is_root() {
        return Ok(());
    }
    Err(anyhow::anyhow!(
        "root privileges required for container operations"
    ))
}
