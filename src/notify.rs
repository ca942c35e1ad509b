//! Desktop notifications for failed user actions

use crate::config::NotificationConfig;
use crate::error::{TmsuError, TmsuResult};

/// Title used for every failed-command notification
pub const FAILURE_TITLE: &str = "TMSU command failed";

/// Show desktop notifications
pub trait Notifications: Send + Sync {
    fn show(&self, title: &str, body: &str) -> TmsuResult<()>;
}

/// Notifications through the desktop notification service, using notify-rust
pub struct DesktopNotifications {
    timeout_ms: u32,
}

impl DesktopNotifications {
    pub fn new(timeout_ms: u32) -> Self {
        Self { timeout_ms }
    }
}

impl Notifications for DesktopNotifications {
    fn show(&self, title: &str, body: &str) -> TmsuResult<()> {
        notify_rust::Notification::new()
            .summary(title)
            .body(body)
            .appname("nautilus-tmsu")
            .timeout(notify_rust::Timeout::Milliseconds(self.timeout_ms))
            .show()
            .map_err(|e| TmsuError::Notification(e.to_string()))?;
        Ok(())
    }
}

/// Drops every notification; used when notifications are disabled
pub struct Silent;

impl Notifications for Silent {
    fn show(&self, title: &str, _body: &str) -> TmsuResult<()> {
        tracing::debug!("notification suppressed: {}", title);
        Ok(())
    }
}

/// Pick the implementation matching `config`
pub fn from_config(config: &NotificationConfig) -> Box<dyn Notifications> {
    if config.enabled {
        Box::new(DesktopNotifications::new(config.timeout_ms))
    } else {
        Box::new(Silent)
    }
}

/// Report a failed command. Notification errors are only logged.
pub fn report_failure(notifications: &dyn Notifications, error: &TmsuError) {
    tracing::warn!("{}: {}", FAILURE_TITLE, error);
    if let Err(e) = notifications.show(FAILURE_TITLE, &error.detail()) {
        tracing::warn!("could not show notification: {}", e);
    }
}
