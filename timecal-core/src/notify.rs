//! Desktop notifications through Notification Center.

use crate::osascript::{Osascript, quote};

#[derive(Debug, Clone, Default)]
pub struct Notifier {
    osascript: Osascript,
    disabled: bool,
}

impl Notifier {
    pub fn new(osascript: Osascript) -> Self {
        Notifier {
            osascript,
            disabled: false,
        }
    }

    /// A notifier that only logs.
    pub fn disabled() -> Self {
        Notifier {
            disabled: true,
            ..Default::default()
        }
    }

    /// Show a notification. Failures are logged and otherwise ignored.
    pub async fn notify(&self, title: &str, message: &str) {
        if self.disabled {
            tracing::debug!("notification suppressed: {title}: {message}");
            return;
        }

        if let Err(e) = self.osascript.run(&notification_script(title, message)).await {
            tracing::warn!("notification failed: {e}");
        }
    }
}

fn notification_script(title: &str, message: &str) -> String {
    format!(
        "display notification {} with title {}",
        quote(message),
        quote(title)
    )
}
