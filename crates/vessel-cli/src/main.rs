//! # vsl — Vessel CLI
//!
//! Daemon-less minimal container runtime for Linux.
//! Single binary for pulling images and running, inspecting, and stopping
//! containers; also serves as the re-executed container-init process.

mod commands;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
