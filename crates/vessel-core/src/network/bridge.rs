//! The shared bridge device all containers attach to.

use std::net::Ipv4Addr;

use super::{run_tool, run_tool_tolerating};
use crate::error::{CoreError, Result};

/// Ensures the shared bridge exists, carries the gateway address, and is up.
///
/// Creation is create-and-tolerate-exists: the kernel rejects a duplicate
/// name atomically, so concurrent creators race safely without a
/// check-then-create window. The address write uses `ip addr replace`,
/// which is idempotent.
///
/// # Errors
///
/// Returns [`CoreError::NetworkSetup`] if any step fails for a reason
/// other than the bridge already existing.
pub fn ensure_bridge(name: &str, gateway: Ipv4Addr, prefix_len: u8) -> Result<()> {
    let created = run_tool_tolerating(
        "ip",
        &["link", "add", name, "type", "bridge"],
        "File exists",
    )
    .map_err(setup_err)?;
    if created {
        tracing::info!(bridge = name, "bridge created");
    }

    let cidr = format!("{gateway}/{prefix_len}");
    run_tool("ip", &["addr", "replace", &cidr, "dev", name]).map_err(setup_err)?;
    run_tool("ip", &["link", "set", name, "up"]).map_err(setup_err)?;
    Ok(())
}

fn setup_err(message: String) -> CoreError {
    CoreError::NetworkSetup { message }
}
