// src/lib.rs

pub mod cli;
pub mod config;
pub mod descriptor;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod watch;

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::cli::CliArgs;
use crate::config::WatchConfig;
use crate::descriptor::discover_descriptors;
use crate::engine::{DescriptorSupervisor, SupervisorDeps, SupervisorHandle};
use crate::errors::Result;
use crate::fs::RealFileSystem;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - packer lookup
/// - descriptor discovery under the search root
/// - one supervisor per descriptor
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config = WatchConfig::from_args(&args)?;
    let descriptors = discover_descriptors(&RealFileSystem, &args.search_root)?;

    info!(
        root = %args.search_root.display(),
        found = descriptors.len(),
        packer = %config.packer.display(),
        "discovered descriptors"
    );

    let handles = watch_descriptors(&descriptors, SupervisorDeps::from_config(&config));

    if handles.is_empty() {
        warn!("no descriptors to watch; exiting");
        return Ok(());
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("failed to listen for Ctrl+C: {e}");
    }

    info!("shutting down");
    for handle in handles {
        handle.stop().await;
    }

    Ok(())
}

/// Start one supervisor per descriptor.
///
/// Descriptors that fail to parse are reported and skipped; the others are
/// watched regardless.
pub fn watch_descriptors(descriptors: &[PathBuf], deps: SupervisorDeps) -> Vec<SupervisorHandle> {
    descriptors
        .iter()
        .filter_map(|path| match DescriptorSupervisor::start(path, deps.clone()) {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!(descriptor = %path.display(), error = %err, "not watching descriptor");
                None
            }
        })
        .collect()
}
