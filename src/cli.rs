// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `packwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "packwatch",
    version,
    about = "Watch TexturePacker .tps files and repack when their sources change.",
    long_about = None
)]
pub struct CliArgs {
    /// Directory searched recursively for `*.tps` descriptors.
    #[arg(value_name = "DIR", default_value = ".")]
    pub search_root: PathBuf,

    /// Show a desktop notification after each pack.
    #[arg(long)]
    pub notify: bool,

    /// Path to the TexturePacker executable, or a bare program name to look
    /// up on `PATH`.
    ///
    /// If omitted, `PACKWATCH_PACKER` and the usual install locations are
    /// tried in turn.
    #[arg(long, value_name = "PATH")]
    pub packer: Option<PathBuf>,

    /// Quiet period after the last change before packing, in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub delay_ms: u64,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PACKWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
