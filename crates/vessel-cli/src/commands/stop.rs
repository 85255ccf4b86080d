//! `vsl stop` — Stop containers and clean up their resources.

use clap::Args;
use vessel_runtime::engine::Engine;

/// Arguments for the `stop` command.
#[derive(Args, Debug)]
pub struct StopArgs {
    /// Container ids (or unique prefixes) to stop.
    #[arg(required = true)]
    pub containers: Vec<String>,
}

/// Executes the `stop` command.
///
/// Each container's teardown is attempted in full even when individual
/// steps fail; the first failure per container is reported. Stopping an
/// already partially-stopped container is safe to retry.
///
/// # Errors
///
/// Returns an error if the caller is not root or any container failed to
/// stop cleanly.
pub fn execute(args: StopArgs) -> anyhow::Result<()> {
    super::ensure_root()?;
    let engine = Engine::new().map_err(|e| anyhow::anyhow!("{e}"))?;

    let mut first_failure = None;
    for needle in &args.containers {
        let result = super::resolve_container_id(&engine, needle)
            .and_then(|id| engine.stop(&id).map_err(|e| anyhow::anyhow!("{e}")));
        match result {
            Ok(()) => println!("{needle}"),
            Err(e) => {
                tracing::error!(container = %needle, error = %e, "stop failed");
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        }
    }

    first_failure.map_or(Ok(()), Err)
}
