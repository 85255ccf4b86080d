//! Per-container veth pairs.

use std::net::Ipv4Addr;

use super::{run_tool, run_tool_tolerating};
use crate::error::{CoreError, Result};
use crate::namespace::enter::NetnsGuard;

/// The network objects wired up for one container.
///
/// Derived state: everything here is reconstructible from the container id
/// and the runtime configuration; only the address is persisted.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Bridge the host end is enslaved to.
    pub bridge: String,
    /// Host-side veth interface name.
    pub host_veth: String,
    /// Canonical interface name inside the container.
    pub container_iface: String,
    /// Address assigned inside the container.
    pub address: Ipv4Addr,
    /// Prefix length of the assigned address.
    pub prefix_len: u8,
    /// Default gateway configured inside the container.
    pub gateway: Ipv4Addr,
}

/// Creates and wires the veth pair described by `attachment` for the
/// container owning `pid`.
///
/// The pair is created with the transient `peer_tmp` name so the peer
/// never collides with a host interface of the canonical name; the peer
/// is renamed to the canonical interface only once it is inside the
/// container's namespace. A leftover host interface from a crashed
/// container of the same name is deleted and the creation retried once;
/// any other failure is fatal.
///
/// Every step after the namespace move runs inside the target namespace
/// behind a [`NetnsGuard`], so the caller's own namespace is restored on
/// all paths.
///
/// # Errors
///
/// Returns [`CoreError::NetworkSetup`] on any failing step; the caller is
/// responsible for killing the container process and calling
/// [`teardown`].
pub fn attach(pid: i32, attachment: &Attachment, peer_tmp: &str) -> Result<()> {
    let host_veth = attachment.host_veth.as_str();
    create_pair(host_veth, peer_tmp)?;

    run_tool("ip", &["link", "set", host_veth, "master", &attachment.bridge])
        .map_err(setup_err)?;
    run_tool("ip", &["link", "set", host_veth, "up"]).map_err(setup_err)?;
    run_tool("ip", &["link", "set", peer_tmp, "netns", &pid.to_string()]).map_err(setup_err)?;

    configure_container_iface(pid, peer_tmp, attachment)?;

    tracing::info!(
        host_veth,
        container_iface = %attachment.container_iface,
        address = %attachment.address,
        "container network attached"
    );
    Ok(())
}

/// Deletes the host-side interface; the kernel removes the peer with it.
///
/// Absence of the interface is not an error, so repeated teardown
/// converges.
///
/// # Errors
///
/// Returns [`CoreError::NetworkSetup`] for failures other than the
/// interface already being gone.
pub fn teardown(host_veth: &str) -> Result<()> {
    let removed = run_tool_tolerating("ip", &["link", "del", host_veth], "Cannot find device")
        .map_err(setup_err)?;
    if removed {
        tracing::info!(host_veth, "veth pair removed");
    }
    Ok(())
}

fn create_pair(host_veth: &str, peer_tmp: &str) -> Result<()> {
    let add = ["link", "add", host_veth, "type", "veth", "peer", "name", peer_tmp];
    let created = run_tool_tolerating("ip", &add, "File exists").map_err(setup_err)?;
    if created {
        return Ok(());
    }
    // Stale pair from a dead container: remove and retry once.
    tracing::warn!(host_veth, "stale veth found, recreating");
    run_tool("ip", &["link", "del", host_veth]).map_err(setup_err)?;
    run_tool("ip", &add).map_err(setup_err)
}

/// Renames, addresses, enables, and routes the peer inside the namespace.
fn configure_container_iface(pid: i32, peer_tmp: &str, attachment: &Attachment) -> Result<()> {
    let iface = attachment.container_iface.as_str();
    let _guard = NetnsGuard::enter(pid)?;

    run_tool("ip", &["link", "set", peer_tmp, "name", iface]).map_err(setup_err)?;
    let cidr = format!("{}/{}", attachment.address, attachment.prefix_len);
    run_tool("ip", &["addr", "add", &cidr, "dev", iface]).map_err(setup_err)?;
    run_tool("ip", &["link", "set", iface, "up"]).map_err(setup_err)?;
    run_tool("ip", &["link", "set", "lo", "up"]).map_err(setup_err)?;
    run_tool(
        "ip",
        &["route", "add", "default", "via", &attachment.gateway.to_string()],
    )
    .map_err(setup_err)?;
    Ok(())
}

fn setup_err(message: String) -> CoreError {
    CoreError::NetworkSetup { message }
}
