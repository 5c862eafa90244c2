//! Terminal user interface, browser launching, and the no-op notification
//! backend used where desktop notifications are unavailable.

use std::io::Write;

use async_trait::async_trait;
use reminders_shared::domain::NOTIFICATION_TITLE;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::capability::{
    AppWindows, ClientWindow, NotificationCapability, NotificationEvent, NotificationSpec,
    Permission, PlatformError, UserInterface,
};

pub struct ConsoleUi;

impl UserInterface for ConsoleUi {
    fn alert(&self, message: &str) {
        eprintln!("error: {message}");
    }

    fn set_permission_banner(&self, visible: bool) {
        if visible {
            eprintln!(
                "Notifications are blocked. Enable them in your system settings to receive reminders."
            );
        }
    }

    fn acknowledge(&self, text: &str) {
        // bell, then the reminder itself
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "\x07{NOTIFICATION_TITLE}: {text}");
        let _ = out.flush();
    }

    fn set_install_visible(&self, visible: bool) {
        debug!(visible, "install affordance");
        if visible {
            println!("This app can be installed: run `reminders-client install`.");
        }
    }

    fn show_install_instructions(&self, text: &str) {
        println!("{text}");
    }
}

/// Used when the OS offers no notification service.
pub struct NoNotifications;

#[async_trait]
impl NotificationCapability for NoNotifications {
    fn is_supported(&self) -> bool {
        false
    }

    fn permission(&self) -> Permission {
        Permission::Denied
    }

    async fn request_permission(&self) -> Permission {
        Permission::Denied
    }

    async fn show(&self, _spec: &NotificationSpec) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported)
    }

    async fn close(&self, _tag: &str) {}

    async fn focus_app(&self) {}

    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<NotificationEvent>> {
        None
    }
}

/// Opens the app in the system browser. Browser tabs cannot be enumerated
/// from here, so `list` is always empty and clicks open a fresh window.
pub struct BrowserWindows;

impl BrowserWindows {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "macos")]
fn opener(url: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    cmd
}

#[cfg(target_os = "windows")]
fn opener(url: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", "", url]);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener(url: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    cmd
}

impl Default for BrowserWindows {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppWindows for BrowserWindows {
    async fn claim(&self) {
        debug!("no browser windows to claim");
    }

    async fn list(&self) -> Vec<ClientWindow> {
        Vec::new()
    }

    async fn focus(&self, id: &str) -> Result<(), PlatformError> {
        Err(PlatformError::Window(format!("cannot focus window {id}")))
    }

    async fn open(&self, url: &str) -> Result<(), PlatformError> {
        info!(url = %url, "opening app in browser");
        let status = opener(url)
            .status()
            .await
            .map_err(|e| PlatformError::Window(e.to_string()))?;
        if !status.success() {
            warn!(url = %url, ?status, "browser launcher exited with failure");
            return Err(PlatformError::Window(format!("launcher exited with {status}")));
        }
        Ok(())
    }
}
