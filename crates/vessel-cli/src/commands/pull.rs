//! `vsl pull` — Pull an image into the local store.

use clap::Args;
use vessel_common::config::RuntimeConfig;
use vessel_image::ImageStore;

/// Arguments for the `pull` command.
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Image reference, e.g. `alpine:3.19` or `registry.local/team/app`.
    pub image: String,
}

/// Executes the `pull` command.
///
/// # Errors
///
/// Returns an error if the transfer fails or the resulting layout is
/// invalid.
pub fn execute(args: PullArgs) -> anyhow::Result<()> {
    let config = RuntimeConfig::default();
    let store = ImageStore::open(config.images_dir()).map_err(|e| anyhow::anyhow!("{e}"))?;
    let dir = store.pull(&args.image).map_err(|e| anyhow::anyhow!("{e}"))?;
    println!("{} pulled to {}", args.image, dir.display());
    Ok(())
}
