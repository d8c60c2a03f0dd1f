// src/exec/notifier.rs

//! Desktop notifications after a finished pack.
//!
//! Delivery is best effort: failures are logged at debug level and never
//! reach the supervisor.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

pub const NOTIFICATION_TITLE: &str = "TexturePacker";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub sound: bool,
}

impl Notification {
    /// "Packed <descriptor>" with sound.
    pub fn packed(descriptor: &Path) -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            message: format!("Packed {}", descriptor.display()),
            sound: true,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify<'a>(
        &'a self,
        notification: &'a Notification,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Shells out to `osascript` on macOS and `notify-send` elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    fn command(notification: &Notification) -> Command {
        if cfg!(target_os = "macos") {
            let mut script = format!(
                "display notification \"{}\" with title \"{}\"",
                applescript_escape(&notification.message),
                applescript_escape(&notification.title),
            );
            if notification.sound {
                script.push_str(" sound name \"default\"");
            }
            let mut c = Command::new("osascript");
            c.arg("-e").arg(script);
            c
        } else {
            let mut c = Command::new("notify-send");
            c.arg(&notification.title).arg(&notification.message);
            c
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify<'a>(
        &'a self,
        notification: &'a Notification,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let mut cmd = Self::command(notification);
            cmd.stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());

            match cmd.status().await {
                Ok(status) if status.success() => {}
                Ok(status) => debug!(code = ?status.code(), "notifier exited unsuccessfully"),
                Err(err) => debug!(error = %err, "failed to deliver desktop notification"),
            }
        })
    }
}

fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
