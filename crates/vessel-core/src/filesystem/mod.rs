//! Filesystem operations for container-init.
//!
//! Bind mounts for volumes, the in-container `/proc` mount, and the
//! chroot that pins the container to its unpacked image tree.

pub mod mount;
pub mod rootfs;
