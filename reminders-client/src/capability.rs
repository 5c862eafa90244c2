//! Platform capabilities the reminder flow depends on.
//!
//! Notifications, window focus, and user-facing prompts are injected so the
//! session, dispatcher, and relay can run against the desktop backend or the
//! in-memory mocks used by tests.

use async_trait::async_trait;
use reminders_shared::relay::NotificationClick;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Default,
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// Everything needed to put a notification on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSpec {
    pub title: String,
    pub body: String,
    pub tag: String,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub actions: Vec<NotificationAction>,
    pub require_interaction: bool,
}

impl NotificationSpec {
    pub fn new(title: &str, body: &str, tag: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            tag: tag.to_string(),
            icon: None,
            badge: None,
            actions: Vec::new(),
            require_interaction: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    Clicked(NotificationClick),
    Closed { tag: String },
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("notifications are not supported on this platform")]
    Unsupported,
    #[error("notification failed: {0}")]
    Notification(String),
    #[error("window operation failed: {0}")]
    Window(String),
}

#[async_trait]
pub trait NotificationCapability: Send + Sync {
    fn is_supported(&self) -> bool;
    fn permission(&self) -> Permission;
    /// Waits for the user's decision; there is no timeout.
    async fn request_permission(&self) -> Permission;
    /// Shows `spec`, replacing any visible notification with the same tag.
    async fn show(&self, spec: &NotificationSpec) -> Result<(), PlatformError>;
    async fn close(&self, tag: &str);
    async fn focus_app(&self);
    /// Click/close event stream. Yields `Some` only on the first call.
    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<NotificationEvent>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientWindow {
    pub id: String,
    pub url: String,
}

/// Open application instances, as seen by the background relay.
#[async_trait]
pub trait AppWindows: Send + Sync {
    async fn claim(&self);
    async fn list(&self) -> Vec<ClientWindow>;
    async fn focus(&self, id: &str) -> Result<(), PlatformError>;
    async fn open(&self, url: &str) -> Result<(), PlatformError>;
}

/// User-facing surfaces: inline alerts, the permission banner, the fallback
/// acknowledgment dialog and the install affordance.
pub trait UserInterface: Send + Sync {
    fn alert(&self, message: &str);
    fn set_permission_banner(&self, visible: bool);
    /// Blocking acknowledgment used when a notification cannot be shown.
    fn acknowledge(&self, text: &str);
    fn set_install_visible(&self, visible: bool);
    fn show_install_instructions(&self, text: &str);
}
