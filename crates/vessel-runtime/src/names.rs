//! Deterministic resource names derived from the container id.
//!
//! Short names (veth, hostname) are truncations of a SHA-256 hash of the
//! full id rather than of the id itself, so two ids sharing a prefix can
//! never collide on their derived names.

use std::fmt::Write as _;

use sha2::{Digest, Sha256};
use vessel_common::constants::{HOSTNAME_TOKEN_LEN, VETH_PREFIX, VETH_TOKEN_LEN};
use vessel_common::types::ContainerId;

/// Hex-encoded SHA-256 of the full container id.
fn id_token(id: &ContainerId) -> String {
    let digest = Sha256::digest(id.as_str().as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// Host-side veth interface name for a container.
#[must_use]
pub fn veth_host(id: &ContainerId) -> String {
    format!("{VETH_PREFIX}{}", &id_token(id)[..VETH_TOKEN_LEN])
}

/// Transient peer name used until the peer is renamed to the canonical
/// interface inside the container's namespace.
#[must_use]
pub fn veth_peer(id: &ContainerId) -> String {
    format!("vp{}", &id_token(id)[..VETH_TOKEN_LEN])
}

/// Hostname set inside the container's UTS namespace.
#[must_use]
pub fn hostname(id: &ContainerId) -> String {
    id_token(id)[..HOSTNAME_TOKEN_LEN].to_owned()
}

/// Name of the container's cgroup scope.
#[must_use]
pub fn cgroup_scope(id: &ContainerId) -> String {
    id.as_str().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_names_are_deterministic() {
        let id = ContainerId::new("11111111-2222-3333-4444-555555555555");
        assert_eq!(veth_host(&id), veth_host(&id));
        assert_eq!(hostname(&id), hostname(&id));
    }

    #[test]
    fn veth_name_fits_interface_name_limit() {
        let id = ContainerId::generate();
        // IFNAMSIZ is 16 including the NUL terminator.
        assert!(veth_host(&id).len() <= 15);
        assert!(veth_peer(&id).len() <= 15);
    }

    #[test]
    fn ids_sharing_a_prefix_get_distinct_names() {
        let a = ContainerId::new("abcdef00-0000-0000-0000-000000000001");
        let b = ContainerId::new("abcdef00-0000-0000-0000-000000000002");
        assert_ne!(veth_host(&a), veth_host(&b));
        assert_ne!(hostname(&a), hostname(&b));
    }

    #[test]
    fn host_and_peer_names_differ() {
        let id = ContainerId::generate();
        assert_ne!(veth_host(&id), veth_peer(&id));
    }
}
