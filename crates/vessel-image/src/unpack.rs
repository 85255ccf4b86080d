//! Materializing a root filesystem from a stored OCI layout.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{ImageError, Result};
use crate::store::ImageStore;

/// Unpacks `reference` into `bundle_dir`, returning the rootfs path.
///
/// The image must already be present in the store. Extraction is
/// delegated to `umoci unpack`, which produces `<bundle_dir>/rootfs`.
///
/// # Errors
///
/// Returns [`ImageError::Preparation`] if the image is absent or the
/// unpack fails, [`ImageError::InvalidLayout`] if the stored layout is
/// broken, or [`ImageError::MissingTool`] if `umoci` is not installed.
pub fn prepare_rootfs(store: &ImageStore, reference: &str, bundle_dir: &Path) -> Result<PathBuf> {
    let (image_dir, parsed) = store.lookup(reference)?;
    let umoci = which::which("umoci").map_err(|_| ImageError::MissingTool { tool: "umoci" })?;

    if let Some(parent) = bundle_dir.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ImageError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let image_arg = format!("{}:{}", image_dir.display(), parsed.tag);
    tracing::info!(image = reference, bundle = %bundle_dir.display(), "unpacking rootfs");
    let output = Command::new(umoci)
        .arg("unpack")
        .arg("--image")
        .arg(&image_arg)
        .arg(bundle_dir)
        .output()
        .map_err(|e| ImageError::Io {
            path: bundle_dir.to_path_buf(),
            source: e,
        })?;
    if !output.status.success() {
        return Err(ImageError::Preparation {
            image: reference.to_owned(),
            message: format!(
                "umoci unpack failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    let rootfs = bundle_dir.join("rootfs");
    if !rootfs.is_dir() {
        return Err(ImageError::Preparation {
            image: reference.to_owned(),
            message: format!("umoci produced no rootfs at {}", rootfs.display()),
        });
    }
    Ok(rootfs)
}
