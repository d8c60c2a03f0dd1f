// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the `RebuildExecutor` trait the supervisors use;
//!   tests replace it with a fake implementation.
//! - [`packer`] runs the TexturePacker executable via
//!   `tokio::process::Command`.
//! - [`notifier`] sends the optional "packed" desktop notification.

pub mod backend;
pub mod notifier;
pub mod packer;

pub use backend::{RebuildExecutor, RebuildFuture};
pub use notifier::{DesktopNotifier, Notification, Notifier};
pub use packer::PackerExecutor;
