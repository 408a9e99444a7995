use anyhow::{anyhow, Result};
use notify_rust::Notification;

use super::{NotificationBackend, Permission};

const APP_NAME: &str = "Deep Focus";

/// Desktop notifications through the platform notification daemon. There is
/// no consent prompt on the desktop, so the only way to say no is the
/// `notificationsEnabled` setting.
pub struct DesktopNotifier {
    enabled: bool,
}

impl DesktopNotifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl NotificationBackend for DesktopNotifier {
    fn permission(&self) -> Permission {
        if self.enabled {
            Permission::NotAsked
        } else {
            Permission::Denied
        }
    }

    fn request_permission(&self) -> Result<Permission> {
        Ok(if self.enabled {
            Permission::Granted
        } else {
            Permission::Denied
        })
    }

    fn show(&self, title: &str, body: &str) -> Result<()> {
        Notification::new()
            .summary(title)
            .body(body)
            .appname(APP_NAME)
            .icon("alarm-clock")
            .show()
            .map(|_| ())
            .map_err(|err| anyhow!("failed to show notification: {err}"))
    }
}
