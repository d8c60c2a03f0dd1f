// src/logging.rs

//! Logging setup for `packwatch`.
//!
//! The filter is taken from the first of:
//! 1. `--log-level` on the command line
//! 2. `PACKWATCH_LOG`, which accepts full `EnvFilter` directives
//!    (`debug`, `packwatch=trace,notify=info`, ...)
//! 3. `info`
//!
//! The `notify` backend is capped at `warn` unless a directive mentions it.
//! Everything goes to stderr; stdout belongs to the packer.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "PACKWATCH_LOG";

const DEFAULT_DIRECTIVE: &str = "info";
const NOTIFY_DIRECTIVE: &str = "notify=warn";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))?;

    Ok(())
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    let directives = match (cli_level, env.map(str::trim)) {
        (Some(level), _) => level_directive(level).to_string(),
        (None, Some(value)) if !value.is_empty() => value.to_string(),
        _ => DEFAULT_DIRECTIVE.to_string(),
    };

    let directives = if directives.contains("notify") {
        directives
    } else {
        format!("{directives},{NOTIFY_DIRECTIVE}")
    };

    EnvFilter::try_new(&directives).unwrap_or_else(|err| {
        // No subscriber yet, so this one goes straight to stderr.
        eprintln!("ignoring {LOG_ENV_VAR}={directives:?}: {err}");
        EnvFilter::new(format!("{DEFAULT_DIRECTIVE},{NOTIFY_DIRECTIVE}"))
    })
}

fn level_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
