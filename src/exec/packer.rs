// src/exec/packer.rs

//! Runs the TexturePacker executable for one descriptor.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::WatchConfig;
use crate::exec::backend::{RebuildExecutor, RebuildFuture};
use crate::exec::notifier::{DesktopNotifier, Notification, Notifier};

/// Production executor: `<packer> <descriptor>` with inherited stdio.
pub struct PackerExecutor {
    packer: PathBuf,
    notifier: Option<Arc<dyn Notifier>>,
}

impl std::fmt::Debug for PackerExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackerExecutor")
            .field("packer", &self.packer)
            .field("notify", &self.notifier.is_some())
            .finish()
    }
}

impl PackerExecutor {
    pub fn new(packer: impl Into<PathBuf>) -> Self {
        Self {
            packer: packer.into(),
            notifier: None,
        }
    }

    /// Send a notification through `notifier` after every finished pack.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Executor configured from `config`, using desktop notifications when
    /// `config.notify` is set.
    pub fn from_config(config: &WatchConfig) -> Self {
        let executor = Self::new(&config.packer);
        if config.notify {
            executor.with_notifier(Arc::new(DesktopNotifier))
        } else {
            executor
        }
    }

    async fn run(&self, descriptor: &Path) -> crate::errors::Result<()> {
        // Separator between consecutive packer outputs.
        println!();

        info!(
            descriptor = %descriptor.display(),
            packer = %self.packer.display(),
            "starting packer"
        );

        // The packer reports its own failures on the inherited streams, so
        // its exit status is only logged.
        let status = Command::new(&self.packer)
            .arg(descriptor)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .with_context(|| {
                format!(
                    "running {} for {}",
                    self.packer.display(),
                    descriptor.display()
                )
            })?;

        debug!(
            descriptor = %descriptor.display(),
            exit_code = ?status.code(),
            success = status.success(),
            "packer exited"
        );

        // Delivery runs detached: completion must not wait on the notifier.
        if let Some(notifier) = &self.notifier {
            let notifier = Arc::clone(notifier);
            let notification = Notification::packed(descriptor);
            tokio::spawn(async move {
                notifier.notify(&notification).await;
            });
        }

        Ok(())
    }
}

impl RebuildExecutor for PackerExecutor {
    fn rebuild<'a>(&'a self, descriptor: &'a Path) -> RebuildFuture<'a> {
        Box::pin(self.run(descriptor))
    }
}
