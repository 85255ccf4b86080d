//! `vsl ps` — List containers.

use clap::Args;
use vessel_common::types::ContainerState;
use vessel_runtime::engine::Engine;

/// Arguments for the `ps` command.
#[derive(Args, Debug)]
pub struct PsArgs {
    /// Show all containers, including stopped ones.
    #[arg(short, long)]
    pub all: bool,
}

/// Executes the `ps` command.
///
/// Shows the effective state: a container whose main process died
/// without supervision is listed as stopped even if its record was never
/// updated.
///
/// # Errors
///
/// Returns an error if the state store cannot be read.
pub fn execute(args: PsArgs) -> anyhow::Result<()> {
    let engine = Engine::new().map_err(|e| anyhow::anyhow!("{e}"))?;
    let containers = engine.list().map_err(|e| anyhow::anyhow!("{e}"))?;

    let filtered: Vec<_> = if args.all {
        containers
    } else {
        containers
            .into_iter()
            .filter(|c| c.effective_state() == ContainerState::Running)
            .collect()
    };

    if filtered.is_empty() {
        println!("No containers found.");
        return Ok(());
    }

    println!(
        "{:<14} {:<20} {:<10} {:<8} {:<15} {}",
        "CONTAINER ID", "IMAGE", "STATE", "PID", "ADDRESS", "COMMAND"
    );
    for c in &filtered {
        let short_id: String = c.id.as_str().chars().take(12).collect();
        println!(
            "{:<14} {:<20} {:<10} {:<8} {:<15} {}",
            short_id,
            c.image,
            c.effective_state(),
            c.pid,
            c.address,
            c.command.join(" ")
        );
    }

    Ok(())
}
