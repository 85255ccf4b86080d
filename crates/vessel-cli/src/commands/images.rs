//! `vsl images` — List images in the local store.

use clap::Args;
use vessel_common::config::RuntimeConfig;
use vessel_image::ImageStore;

/// Arguments for the `images` command.
#[derive(Args, Debug)]
pub struct ImagesArgs {}

/// Executes the `images` command.
///
/// # Errors
///
/// Returns an error if the store directory cannot be read.
pub fn execute(_args: ImagesArgs) -> anyhow::Result<()> {
    let config = RuntimeConfig::default();
    let store = ImageStore::open(config.images_dir()).map_err(|e| anyhow::anyhow!("{e}"))?;
    let images = store.list().map_err(|e| anyhow::anyhow!("{e}"))?;

    if images.is_empty() {
        println!("No images found.");
        return Ok(());
    }
    for image in images {
        println!("{image}");
    }
    Ok(())
}
