// src/config/mod.rs

//! Runtime configuration.
//!
//! Everything the supervisors and the executor need is passed in through
//! [`WatchConfig`]; nothing is read from globals after startup.

pub mod packer;

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::CliArgs;
use crate::errors::Result;

pub use packer::{locate_packer, KNOWN_PACKER_PATHS, PACKER_ENV_VAR};

/// Default quiet period after the last change before a rebuild starts.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Packer executable invoked as `<packer> <descriptor>`.
    pub packer: PathBuf,
    /// Send a desktop notification after every rebuild.
    pub notify: bool,
    pub debounce: Duration,
}

impl WatchConfig {
    pub fn new(packer: impl Into<PathBuf>) -> Self {
        Self {
            packer: packer.into(),
            notify: false,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_notify(mut self, notify: bool) -> Self {
        self.notify = notify;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Build the config from CLI args, locating the packer executable.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let packer = locate_packer(args.packer.as_deref())?;
        Ok(Self::new(packer)
            .with_notify(args.notify)
            .with_debounce(Duration::from_millis(args.delay_ms)))
    }
}
