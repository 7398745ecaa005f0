//! Render-complete notification delivery.
//!
//! Delivery is best effort: [`deliver`] logs failures and never reports
//! them back to the pipeline.

use std::process::Command;

use thiserror::Error;
use tracing::{info, warn};

/// Failure to deliver a notification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    /// The user or OS denied notification permission
    #[error("notification permission denied: {0}")]
    PermissionDenied(String),

    /// No notification backend on this platform
    #[error("notifications unsupported: {0}")]
    Unsupported(String),

    #[error("notification failed: {0}")]
    Failed(String),
}

/// Notification sink
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

impl<T: Notifier + ?Sized> Notifier for std::sync::Arc<T> {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        (**self).notify(title, body)
    }
}

/// Send a notification, swallowing any failure
pub fn deliver(notifier: &dyn Notifier, title: &str, body: &str) {
    match notifier.notify(title, body) {
        Ok(()) => info!(title, "notification sent"),
        Err(e) => warn!(error = %e, "notification not delivered"),
    }
}

/// macOS notification center via `osascript -e 'display notification ...'`
#[derive(Debug, Default)]
pub struct OsascriptNotifier;

impl Notifier for OsascriptNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        if !cfg!(target_os = "macos") {
            return Err(NotifyError::Unsupported(
                "osascript requires macOS".to_string(),
            ));
        }

        let script = r#"
on run argv
  display notification (item 2 of argv) with title (item 1 of argv) sound name "Glass"
end run
"#;
        let output = Command::new("osascript")
            .arg("-e")
            .arg(script)
            .arg("--")
            .args([title, body])
            .output()
            .map_err(|e| NotifyError::Failed(format!("failed to spawn osascript: {}", e)))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.contains("-1743") || stderr.to_lowercase().contains("not authorized") {
            Err(NotifyError::PermissionDenied(stderr))
        } else {
            Err(NotifyError::Failed(stderr))
        }
    }
}

/// Writes notifications to the log only
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        info!(title, body, "render complete");
        Ok(())
    }
}
