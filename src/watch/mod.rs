// src/watch/mod.rs

//! Filesystem watching.
//!
//! - [`adapter`] wraps a recursive `notify` watcher on one path and turns
//!   every notification into a payload-free "changed" callback.
//! - [`path_utils`] renders watched paths for log output.
//!
//! It does **not** know about descriptors or rebuilds; the supervisor wires
//! the callbacks into its own event channel.

pub mod adapter;
pub mod path_utils;

pub use adapter::{ChangeCallback, NotifyPathWatch, NotifyWatchBackend, PathWatch, WatchBackend};
