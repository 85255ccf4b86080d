//! Container address allocation.
//!
//! Addresses are unique per live container: the allocator scans the
//! persisted records for addresses already in use and hands out the
//! lowest free host address in the bridge subnet. The gateway owns `.1`;
//! containers get `.2` through `.254`.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use crate::error::{Result, RuntimeError};

/// First host octet handed to containers.
const FIRST_HOST: u8 = 2;

/// Last host octet handed to containers.
const LAST_HOST: u8 = 254;

/// Picks the lowest free address in `subnet` not present in `in_use`.
///
/// Only /24 (or narrower) subnets are supported; the allocator varies the
/// final octet.
///
/// # Errors
///
/// Returns [`RuntimeError::AddressPoolExhausted`] when every host address
/// is taken.
pub fn allocate(
    subnet: Ipv4Addr,
    prefix_len: u8,
    in_use: &HashSet<Ipv4Addr>,
) -> Result<Ipv4Addr> {
    let base = subnet.octets();
    for host in FIRST_HOST..=LAST_HOST {
        let candidate = Ipv4Addr::new(base[0], base[1], base[2], host);
        if !in_use.contains(&candidate) {
            tracing::debug!(%candidate, "allocated container address");
            return Ok(candidate);
        }
    }
    Err(RuntimeError::AddressPoolExhausted { subnet, prefix_len })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBNET: Ipv4Addr = Ipv4Addr::new(10, 67, 0, 0);

    #[test]
    fn first_allocation_is_dot_two() {
        let used = HashSet::new();
        let addr = allocate(SUBNET, 24, &used).expect("free pool");
        assert_eq!(addr, Ipv4Addr::new(10, 67, 0, 2));
    }

    #[test]
    fn allocation_skips_used_addresses() {
        let used: HashSet<_> = [
            Ipv4Addr::new(10, 67, 0, 2),
            Ipv4Addr::new(10, 67, 0, 3),
        ]
        .into_iter()
        .collect();
        let addr = allocate(SUBNET, 24, &used).expect("free pool");
        assert_eq!(addr, Ipv4Addr::new(10, 67, 0, 4));
    }

    #[test]
    fn two_sequential_allocations_never_collide() {
        let mut used = HashSet::new();
        let first = allocate(SUBNET, 24, &used).expect("first");
        let _ = used.insert(first);
        let second = allocate(SUBNET, 24, &used).expect("second");
        assert_ne!(first, second);
    }

    #[test]
    fn exhausted_pool_is_an_error() {
        let used: HashSet<_> = (FIRST_HOST..=LAST_HOST)
            .map(|h| Ipv4Addr::new(10, 67, 0, h))
            .collect();
        assert!(matches!(
            allocate(SUBNET, 24, &used),
            Err(RuntimeError::AddressPoolExhausted { .. })
        ));
    }
}
