//! NAT rules for published ports.
//!
//! One inbound DNAT rule per published port, plus a single shared
//! masquerade rule per container subnet for outbound traffic. Rules are
//! checked with `iptables -C` before insertion and deletion, so repeated
//! installs deduplicate and repeated removals converge.

use std::net::Ipv4Addr;

use super::{probe_tool, run_tool};
use crate::error::{CoreError, Result};

/// Builds the rule body shared by install, check, and remove for one
/// port mapping.
fn dnat_rule(host_port: u16, address: Ipv4Addr, container_port: u16) -> Vec<String> {
    vec![
        "PREROUTING".into(),
        "-p".into(),
        "tcp".into(),
        "--dport".into(),
        host_port.to_string(),
        "-j".into(),
        "DNAT".into(),
        "--to-destination".into(),
        format!("{address}:{container_port}"),
    ]
}

/// Builds the masquerade rule body for a container subnet.
fn masquerade_rule(subnet: Ipv4Addr, prefix_len: u8) -> Vec<String> {
    vec![
        "POSTROUTING".into(),
        "-s".into(),
        format!("{subnet}/{prefix_len}"),
        "-j".into(),
        "MASQUERADE".into(),
    ]
}

fn rule_exists(rule: &[String]) -> bool {
    let mut args = vec!["-t", "nat", "-C"];
    args.extend(rule.iter().map(String::as_str));
    probe_tool("iptables", &args)
}

fn rule_edit(action: &str, rule: &[String]) -> std::result::Result<(), String> {
    let mut args = vec!["-t", "nat", action];
    args.extend(rule.iter().map(String::as_str));
    run_tool("iptables", &args)
}

/// Installs one inbound DNAT rule redirecting `host_port` to the
/// container's address and port.
///
/// Installation is skipped if an identical rule already exists, so a rule
/// left over from an earlier lifetime of the same mapping is not
/// duplicated.
///
/// # Errors
///
/// Returns [`CoreError::PortMapping`] if the rule cannot be installed.
pub fn install_port_mapping(
    host_port: u16,
    address: Ipv4Addr,
    container_port: u16,
) -> Result<()> {
    let rule = dnat_rule(host_port, address, container_port);
    if rule_exists(&rule) {
        tracing::debug!(host_port, "DNAT rule already present");
        return Ok(());
    }
    rule_edit("-A", &rule).map_err(|message| CoreError::PortMapping { host_port, message })?;
    tracing::info!(host_port, %address, container_port, "DNAT rule installed");
    Ok(())
}

/// Removes the DNAT rule for one mapping. A rule that is already gone is
/// not an error.
///
/// # Errors
///
/// Returns [`CoreError::PortMapping`] if the deletion itself fails.
pub fn remove_port_mapping(
    host_port: u16,
    address: Ipv4Addr,
    container_port: u16,
) -> Result<()> {
    let rule = dnat_rule(host_port, address, container_port);
    if !rule_exists(&rule) {
        return Ok(());
    }
    rule_edit("-D", &rule).map_err(|message| CoreError::PortMapping { host_port, message })?;
    tracing::info!(host_port, "DNAT rule removed");
    Ok(())
}

/// Ensures exactly one masquerade rule exists for the container subnet.
///
/// The rule is shared host state owned by the bridge: it is installed on
/// first use and never removed by per-container teardown.
///
/// # Errors
///
/// Returns [`CoreError::NetworkSetup`] if the rule cannot be installed.
pub fn ensure_masquerade(subnet: Ipv4Addr, prefix_len: u8) -> Result<()> {
    let rule = masquerade_rule(subnet, prefix_len);
    if rule_exists(&rule) {
        return Ok(());
    }
    rule_edit("-A", &rule).map_err(|message| CoreError::NetworkSetup { message })?;
    tracing::info!(%subnet, prefix_len, "masquerade rule installed");
    Ok(())
}
