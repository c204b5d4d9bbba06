use anyhow::Result;

/// Surface that can show a message to the user outside the form itself
pub trait WidgetHost: Send {
    fn notify_user(&self, message: &str);
}

/// Desktop notifications when enabled, otherwise only logged
#[derive(Debug, Default)]
pub struct DesktopHost {
    pub notifications: bool,
}

impl DesktopHost {
    pub fn new(notifications: bool) -> Self {
        Self { notifications }
    }
}

impl WidgetHost for DesktopHost {
    fn notify_user(&self, message: &str) {
        tracing::info!("{}", message);
        if self.notifications {
            if let Err(e) = notify("Loan calculator", message) {
                tracing::warn!("Desktop notification failed: {}", e);
            }
        }
    }
}

fn notify(summary: &str, body: &str) -> Result<()> {
    notify_rust::Notification::new()
        .summary(summary)
        .body(body)
        .icon("accessories-calculator")
        .show()?;
    Ok(())
}
