//! # vessel-core
//!
//! Linux isolation primitives for the Vessel runtime:
//!
//! - **cgroup**: one cgroups-v2 scope per container with CPU and memory
//!   ceilings.
//! - **namespace**: namespace creation at spawn time (`clone(2)`) and entry
//!   into a live container's namespaces (`setns(2)`).
//! - **filesystem**: bind mounts, proc mounts, and root switching for
//!   container-init.
//! - **network**: the bridge / veth / NAT wiring that gives each container a
//!   private L2/L3 path to the host.

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod cgroup;
pub mod error;
pub mod filesystem;
pub mod namespace;
pub mod network;

pub use error::{CoreError, Result};
