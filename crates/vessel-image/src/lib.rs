//! # vessel-image
//!
//! OCI image acquisition and unpacking for the Vessel runtime.
//!
//! Registry transfer and layer extraction are delegated to `skopeo` and
//! `umoci`; this crate owns the on-disk store layout, image reference
//! parsing, and OCI layout validation.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod error;
pub mod store;
pub mod unpack;

pub use error::{ImageError, Result};
pub use store::ImageStore;
