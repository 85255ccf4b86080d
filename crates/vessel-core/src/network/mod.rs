//! Container networking: bridge, veth pairs, and NAT port forwarding.
//!
//! Builds the private L2/L3 path for one container: a shared bridge on the
//! host, a per-container veth pair with the peer end moved into the
//! container's network namespace, an address and default route inside that
//! namespace, and DNAT rules for published ports.
//!
//! Link and rule manipulation shells out to `ip(8)` and `iptables(8)`; the
//! host's own network namespace is never left modified (in-namespace steps
//! run behind [`crate::namespace::enter::NetnsGuard`]).

pub mod bridge;
pub mod nat;
pub mod veth;

use std::path::Path;
use std::process::Command;

/// Runs a tool, treating a non-zero exit as an error described by the
/// tool's stderr.
pub(crate) fn run_tool(tool: &str, args: &[&str]) -> std::result::Result<(), String> {
    let output = Command::new(tool)
        .args(args)
        .output()
        .map_err(|e| format!("{tool}: {e}"))?;
    if output.status.success() {
        tracing::trace!(tool, ?args, "tool succeeded");
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(format!(
        "{tool} {}: {} ({})",
        args.join(" "),
        stderr.trim(),
        output.status
    ))
}

/// Runs a tool whose failure is tolerated when stderr matches `needle`.
///
/// Used for create-and-tolerate-exists and delete-and-tolerate-absent
/// operations, which must not depend on a racy pre-check.
pub(crate) fn run_tool_tolerating(
    tool: &str,
    args: &[&str],
    needle: &str,
) -> std::result::Result<bool, String> {
    match run_tool(tool, args) {
        Ok(()) => Ok(true),
        Err(e) if e.contains(needle) => {
            tracing::debug!(tool, ?args, tolerated = needle, "tolerated tool failure");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Returns whether a silent probe invocation exits successfully.
///
/// Used for `iptables -C` rule existence checks.
pub(crate) fn probe_tool(tool: &str, args: &[&str]) -> bool {
    Command::new(tool)
        .args(args)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Returns whether a network interface with this name exists on the host.
#[must_use]
pub fn interface_exists(name: &str) -> bool {
    Path::new("/sys/class/net").join(name).exists()
}
