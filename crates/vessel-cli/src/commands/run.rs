//! `vsl run` — Create and run a container.

use clap::Args;
use vessel_common::types::{PortMapping, VolumeSpec};
use vessel_runtime::container::ContainerSpec;
use vessel_runtime::engine::Engine;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Volume mounts (host:container). Repeatable.
    #[arg(short = 'v', long = "volume", value_name = "HOST:CONTAINER")]
    pub volumes: Vec<VolumeSpec>,

    /// Published ports (host:container). Repeatable.
    #[arg(short = 'p', long = "publish", value_name = "HOST:CONTAINER")]
    pub ports: Vec<PortMapping>,

    /// Memory ceiling, e.g. 100MiB or 256MB.
    #[arg(long, value_name = "SIZE")]
    pub memory: Option<String>,

    /// CPU quota in microseconds per period.
    #[arg(long, value_name = "US")]
    pub cpu_quota: Option<u64>,

    /// CPU period in microseconds.
    #[arg(long, value_name = "US")]
    pub cpu_period: Option<u64>,

    /// Return immediately instead of waiting for the container to exit.
    #[arg(short, long)]
    pub detach: bool,

    /// Image reference (must be pulled first).
    pub image: String,

    /// Command to run as the container's main process.
    #[arg(trailing_var_arg = true, required = true)]
    pub command: Vec<String>,
}

/// Executes the `run` command.
///
/// Prints the new container's id once it is admitted, then waits for the
/// main process and propagates its exit status unless `--detach` was
/// given.
///
/// # Errors
///
/// Returns an error if the caller is not root or any creation step fails.
pub fn execute(args: RunArgs) -> anyhow::Result<()> {
    super::ensure_root()?;
    let engine = Engine::new().map_err(|e| anyhow::anyhow!("{e}"))?;

    let mut limits = engine.config().default_limits;
    if let Some(memory) = args.memory.as_deref() {
        limits.memory_bytes = parse_memory(memory)
            .ok_or_else(|| anyhow::anyhow!("invalid memory size: {memory}"))?;
    }
    if let Some(quota) = args.cpu_quota {
        limits.cpu_quota_us = quota;
    }
    if let Some(period) = args.cpu_period {
        limits.cpu_period_us = period;
    }

    let spec = ContainerSpec {
        image: args.image,
        command: args.command,
        volumes: args.volumes,
        ports: args.ports,
        limits,
    };
    let created = engine.create(&spec).map_err(|e| anyhow::anyhow!("{e}"))?;
    println!("{}", created.id);

    if args.detach {
        return Ok(());
    }

    let code = engine
        .supervise(&created.id)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    std::process::exit(code);
}

/// Parses memory strings like "128MiB", "256MB", "1GiB" into bytes.
#[allow(clippy::option_if_let_else)]
fn parse_memory(s: &str) -> Option<u64> {
    let s = s.trim();
    let (num_str, multiplier) = if let Some(n) = s.strip_suffix("GiB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("GB") {
        (n, 1_000_000_000)
    } else if let Some(n) = s.strip_suffix("MiB") {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1_000_000)
    } else if let Some(n) = s.strip_suffix("KiB") {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1000)
    } else {
        (s, 1)
    };
    num_str.trim().parse::<u64>().ok().map(|n| n * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_memory_mib() {
        assert_eq!(parse_memory("128MiB"), Some(128 * 1024 * 1024));
    }

    #[test]
    fn parse_memory_gib() {
        assert_eq!(parse_memory("1GiB"), Some(1024 * 1024 * 1024));
    }

    #[test]
    fn parse_memory_plain_bytes() {
        assert_eq!(parse_memory("1048576"), Some(1_048_576));
    }

    #[test]
    fn parse_memory_invalid() {
        assert_eq!(parse_memory("abc"), None);
    }
}
